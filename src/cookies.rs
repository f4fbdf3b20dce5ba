//! Cookie files: single-writer sinks for the create phase and a line
//! reader for the validate phase.
//!
//! Creator tasks run concurrently but never touch a file handle. Each
//! cookie file is owned by one writer task fed over an mpsc channel, so
//! appends cannot interleave mid-record. Dropping the sink closes the
//! channel; awaiting the returned handle guarantees every accepted cookie
//! has been written.

use std::io;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const SINK_CHANNEL_CAPACITY: usize = 64;

/// Handle for appending cookie values to a file via its writer task.
#[derive(Clone)]
pub struct CookieSink {
    tx: mpsc::Sender<String>,
}

impl CookieSink {
    /// Truncate `path` and spawn its writer task.
    ///
    /// Each record is written as a newline followed by the cookie value,
    /// one value per line. Write failures are logged and the value is
    /// dropped; the run continues.
    pub async fn spawn(path: &Path) -> io::Result<(Self, JoinHandle<()>)> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await?;
        let (tx, mut rx) = mpsc::channel::<String>(SINK_CHANNEL_CAPACITY);
        let path = path.to_path_buf();
        let handle = tokio::spawn(async move {
            while let Some(value) = rx.recv().await {
                let record = format!("\n{value}");
                if let Err(e) = file.write_all(record.as_bytes()).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to append cookie value"
                    );
                }
            }
            if let Err(e) = file.flush().await {
                tracing::warn!(path = %path.display(), error = %e, "failed to flush cookie file");
            }
        });
        Ok((Self { tx }, handle))
    }

    /// Queue a cookie value for appending.
    pub async fn push(&self, cookie: String) {
        if self.tx.send(cookie).await.is_err() {
            tracing::warn!("cookie writer task exited, dropping cookie value");
        }
    }
}

/// Read cookie values back from a file: one per line, blank lines skipped.
pub async fn read_cookies(path: &Path) -> io::Result<Vec<String>> {
    let data = tokio::fs::read_to_string(path).await?;
    Ok(data
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
