//! Session-key lookup against the Redis session store.
//!
//! Strictly sequential: read the key list, decode each base64 line, derive
//! the store key by wrapping the decoded value in the configured
//! prefix/suffix, point-GET it, and write every match to the output file
//! in one shot. Bad lines (undecodable, absent, or erroring) are logged
//! and skipped; they never abort the remaining lines.

use std::path::PathBuf;

use base64::Engine;
use redis::AsyncCommands;
use thiserror::Error;

/// Default wrapper strings for the derived store key. These match the
/// Spring Session layout of the target service's store.
pub const DEFAULT_KEY_PREFIX: &str = "spring:session:sessions:";
pub const DEFAULT_KEY_SUFFIX: &str = " sessionAttr:DEVICE_TYPE";

/// File paths and key-derivation settings for a lookup run.
#[derive(Debug, Clone)]
pub struct LookupOptions {
    pub keys_file: PathBuf,
    pub out_file: PathBuf,
    pub key_prefix: String,
    pub key_suffix: String,
}

/// Fatal lookup errors. Per-line failures are logged and skipped instead.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to read keys file {0}: {1}")]
    ReadKeys(PathBuf, std::io::Error),
    #[error("failed to write output file {0}: {1}")]
    WriteOutput(PathBuf, std::io::Error),
}

/// Point-GET access to the session store.
///
/// The production implementation is [`RedisStore`]; tests substitute an
/// in-memory map.
#[allow(async_fn_in_trait)]
pub trait SessionStore {
    type Error: std::fmt::Display;

    /// Fetch a key's value. `Ok(None)` means the key is absent.
    async fn fetch(&mut self, key: &str) -> Result<Option<String>, Self::Error>;
}

/// Session store backed by a multiplexed Redis connection.
pub struct RedisStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisStore {
    /// Connect and ping once so a bad address or credential fails up front.
    pub async fn connect(
        host: &str,
        port: u16,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, redis::RedisError> {
        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(host.to_string(), port),
            redis: redis::RedisConnectionInfo {
                username,
                password,
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!(host, port, %pong, "connected to redis");
        Ok(Self { conn })
    }
}

impl SessionStore for RedisStore {
    type Error = redis::RedisError;

    async fn fetch(&mut self, key: &str) -> Result<Option<String>, Self::Error> {
        self.conn.get(key).await
    }
}

#[derive(Debug, Error)]
enum KeyDecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded bytes are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Decode one key-list entry: strip surrounding double quotes, then
/// base64-decode with the standard alphabet.
fn decode_key(encoded: &str) -> Result<String, KeyDecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    Ok(String::from_utf8(bytes)?)
}

/// Resolve every decodable line of `input` against the store and return
/// the formatted matches in input order.
pub async fn collect_matches<S: SessionStore>(
    store: &mut S,
    input: &str,
    prefix: &str,
    suffix: &str,
) -> Vec<String> {
    let mut matches = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let encoded = line.trim_matches('"');

        let decoded = match decode_key(encoded) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(line = line_no, key = encoded, error = %e, "skipping undecodable key");
                continue;
            }
        };

        let derived = format!("{prefix}{decoded}{suffix}");
        match store.fetch(&derived).await {
            Ok(Some(value)) => matches.push(format!("Key: {decoded}, Value: {value}")),
            Ok(None) => {
                tracing::warn!(line = line_no, key = %decoded, "key does not exist in the store");
            }
            Err(e) => {
                tracing::warn!(line = line_no, key = %derived, error = %e, "store lookup failed");
            }
        }
    }
    matches
}

/// Run a full lookup: keys file in, matches file out. Returns the number
/// of matches written. The output file is overwritten.
pub async fn run<S: SessionStore>(
    store: &mut S,
    opts: &LookupOptions,
) -> Result<usize, LookupError> {
    let input = tokio::fs::read_to_string(&opts.keys_file)
        .await
        .map_err(|e| LookupError::ReadKeys(opts.keys_file.clone(), e))?;

    let matches = collect_matches(store, &input, &opts.key_prefix, &opts.key_suffix).await;

    tokio::fs::write(&opts.out_file, matches.join("\n"))
        .await
        .map_err(|e| LookupError::WriteOutput(opts.out_file.clone(), e))?;

    Ok(matches.len())
}
