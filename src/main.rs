//! seshload - synthetic session load harness.
//!
//! ## Modes
//!
//! **`seshload sessions`**: issues synthetic login requests against a web
//! service, harvests session cookies into flat text files (one per device
//! category), and re-validates harvested cookies. Plain fan-out over HTTP
//! with a fixed throttle and a bounded worker pool -- not a scheduler.
//!
//! **`seshload lookup`**: resolves base64-encoded session identifiers
//! from a file against the backing Redis session store and writes every
//! match to an output file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser as ClapParser, Subcommand};
use seshload::{
    config::{ConfigError, ProtocolConfig},
    harness::{self, HarnessError, HarnessOptions},
    lookup::{self, LookupError, LookupOptions, RedisStore},
};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// seshload - synthetic session load harness.
///
/// Creates and validates login sessions in bulk, and resolves harvested
/// session identifiers against the backing session store.
#[derive(ClapParser, Debug)]
#[command(name = "seshload", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create and/or validate synthetic login sessions
    Sessions {
        /// Number of session-creation attempts
        #[arg(long, default_value_t = 10)]
        iterations: u32,

        /// Run the create phase (truncates the cookie files)
        #[arg(long)]
        create: bool,

        /// Skip the validate phase (it runs by default)
        #[arg(long)]
        no_validate: bool,

        /// Select mobile device profiles / validate the mobile cookie file
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        mobile: bool,

        /// Select desktop device profiles / validate the desktop cookie file
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        desktop: bool,

        /// Base URL of the target service, with protocol, no trailing slash
        #[arg(long, default_value = "http://localhost:8081")]
        host: String,

        /// Login email template; `{}` is filled with a random suffix
        #[arg(long, default_value = "qa.tester+{}@example.com")]
        email: String,

        /// XSRF token, sent as both cookie and header
        #[arg(long, env = "SESHLOAD_XSRF", default_value = "2345")]
        xsrf: String,

        /// Password for every login payload
        #[arg(long, env = "SESHLOAD_PASSWORD", default_value = "qwerty12")]
        password: String,

        /// Mobile cookie file path
        #[arg(long, default_value = "MobileCookies.txt")]
        mobile_file: PathBuf,

        /// Desktop cookie file path
        #[arg(long, default_value = "DesktopCookies.txt")]
        desktop_file: PathBuf,

        /// Delay in milliseconds before each task launch
        #[arg(long, default_value_t = 50)]
        throttle_ms: u64,

        /// Maximum number of requests in flight at once
        #[arg(long, default_value_t = 8)]
        concurrency: usize,

        /// Optional TOML file overriding wire-protocol constants
        #[arg(long)]
        protocol_config: Option<PathBuf>,
    },

    /// Resolve base64-encoded session ids against the Redis session store
    Lookup {
        /// Redis server host
        #[arg(long, default_value = "localhost")]
        redis_host: String,

        /// Redis server port
        #[arg(long, default_value_t = 6379)]
        redis_port: u16,

        /// Redis username (if required)
        #[arg(long)]
        redis_username: Option<String>,

        /// Redis password (if required)
        #[arg(long, env = "SESHLOAD_REDIS_PASSWORD")]
        redis_password: Option<String>,

        /// File containing base64-encoded keys, one per line
        #[arg(long, default_value = "keys.txt")]
        keys_file: PathBuf,

        /// Output file for matches (overwritten)
        #[arg(long, default_value = "output.txt")]
        out_file: PathBuf,

        /// String prepended to each decoded key
        #[arg(long, default_value = lookup::DEFAULT_KEY_PREFIX)]
        key_prefix: String,

        /// String appended to each decoded key
        #[arg(long, default_value = lookup::DEFAULT_KEY_SUFFIX)]
        key_suffix: String,
    },
}

#[derive(Error, Debug)]
pub enum SeshloadError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("harness error: {0}")]
    Harness(#[from] HarnessError),

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[tokio::main]
async fn main() -> Result<(), SeshloadError> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sessions {
            iterations,
            create,
            no_validate,
            mobile,
            desktop,
            host,
            email,
            xsrf,
            password,
            mobile_file,
            desktop_file,
            throttle_ms,
            concurrency,
            protocol_config,
        } => {
            let protocol = match protocol_config {
                Some(path) => ProtocolConfig::load(&path)?,
                None => ProtocolConfig::default(),
            };
            let opts = HarnessOptions {
                iterations,
                create,
                validate: !no_validate,
                mobile,
                desktop,
                host,
                email_template: email,
                xsrf,
                password,
                mobile_file,
                desktop_file,
                throttle: Duration::from_millis(throttle_ms),
                concurrency,
                protocol,
            };
            let summary = harness::run(opts).await?;
            println!("All sessions processed.");
            println!("desktop= {}  mobile= {}", summary.desktop, summary.mobile);
            Ok(())
        }

        Commands::Lookup {
            redis_host,
            redis_port,
            redis_username,
            redis_password,
            keys_file,
            out_file,
            key_prefix,
            key_suffix,
        } => {
            let mut store =
                RedisStore::connect(&redis_host, redis_port, redis_username, redis_password)
                    .await?;
            let opts = LookupOptions {
                keys_file,
                out_file,
                key_prefix,
                key_suffix,
            };
            let matched = lookup::run(&mut store, &opts).await?;
            println!(
                "{} matches written to {}",
                matched,
                opts.out_file.display()
            );
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seshload=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
