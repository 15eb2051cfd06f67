use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use core::{num::NonZeroUsize, time::Duration};
use staffstream_tonic_core::{staffstream::DEFAULT_RECORD_COUNT, types::DEFAULT_PORT};
use std::path::PathBuf;

/// Runtime configuration for the `staffstream-tonic-server` binary.
///
/// These settings control the dataset, the worker pool, stream buffering,
/// HTTP/2 keep-alive, shutdown and transport security. All values are parsed
/// from CLI arguments or environment variables (a `.env` file is honored),
/// with defaults suited to a local demo.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "staffstream-tonic-server",
    version,
    about = "A gRPC service that streams synthetic employee records"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = format!("[::]:{DEFAULT_PORT}"))]
    pub server_addr: String,

    /// Number of worker tasks, i.e. the number of streams served
    /// concurrently. Further calls wait in a FIFO queue.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 10)]
    pub num_workers: usize,

    /// Maximum number of calls waiting for a free worker. When the queue is
    /// full, new calls wait before their stream is opened.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 1024)]
    pub queue_capacity: usize,

    /// Number of employee records generated at startup. Zero is allowed and
    /// produces empty streams.
    ///
    /// Environment variable: `RECORD_COUNT`
    #[arg(long, env = "RECORD_COUNT", default_value_t = DEFAULT_RECORD_COUNT)]
    pub record_count: u32,

    /// Seed for record generation. When unset, records are drawn from the
    /// thread-local RNG and differ on every start.
    ///
    /// Environment variable: `RECORD_SEED`
    #[arg(long, env = "RECORD_SEED")]
    pub seed: Option<u64>,

    /// Emit a progress event every this many records of a stream.
    ///
    /// Environment variable: `PROGRESS_INTERVAL`
    #[arg(long, env = "PROGRESS_INTERVAL", default_value_t = 2_500)]
    pub progress_interval: usize,

    /// Capacity of the frame buffer between a worker and its gRPC stream.
    ///
    /// This bounds the memory held per call. A worker waits once the buffer
    /// is full, so a slow client back-pressures only its own worker.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 32)]
    pub stream_buffer_size: usize,

    /// Interval between HTTP/2 keep-alive pings, in milliseconds.
    ///
    /// Environment variable: `KEEPALIVE_TIME_MS`
    #[arg(long, env = "KEEPALIVE_TIME_MS", default_value_t = 30_000)]
    pub keepalive_time_ms: u64,

    /// How long to wait for a ping acknowledgement before the connection is
    /// considered dead, in milliseconds.
    ///
    /// Environment variable: `KEEPALIVE_TIMEOUT_MS`
    #[arg(long, env = "KEEPALIVE_TIMEOUT_MS", default_value_t = 5_000)]
    pub keepalive_timeout_ms: u64,

    /// Keep probing connections that have no active calls. When set, TCP
    /// keep-alive probes are sent every `KEEPALIVE_TIME_MS` on every
    /// accepted connection, busy or idle.
    ///
    /// Environment variable: `PERMIT_KEEPALIVE_WITHOUT_CALLS`
    #[arg(
        long,
        env = "PERMIT_KEEPALIVE_WITHOUT_CALLS",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub permit_keepalive_without_calls: bool,

    /// Seconds in-flight streams get to finish after a shutdown signal before
    /// they are cancelled.
    ///
    /// Environment variable: `SHUTDOWN_GRACE_SECS`
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// PEM-encoded server certificate.
    ///
    /// Environment variable: `TLS_CERT_PATH`
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert: Option<PathBuf>,

    /// PEM-encoded private key for `--tls-cert`.
    ///
    /// Environment variable: `TLS_KEY_PATH`
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key: Option<PathBuf>,

    /// Serve plaintext HTTP/2 instead of TLS.
    ///
    /// Environment variable: `INSECURE`
    #[arg(long, env = "INSECURE", default_value_t = false)]
    pub insecure: bool,
}

/// HTTP/2 keep-alive settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveConfig {
    pub time: Duration,
    pub timeout: Duration,
    pub permit_without_calls: bool,
}

impl KeepaliveConfig {
    /// TCP keep-alive interval for accepted connections, or `None` when idle
    /// connections should not be probed.
    pub fn tcp_keepalive(&self) -> Option<Duration> {
        self.permit_without_calls.then_some(self.time)
    }
}

/// Locations of the PEM material used to serve TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Validated server settings. Sizes that must be positive are carried as
/// [`NonZeroUsize`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub num_workers: NonZeroUsize,
    pub queue_capacity: NonZeroUsize,
    pub record_count: u32,
    pub seed: Option<u64>,
    pub progress_interval: NonZeroUsize,
    pub stream_buffer_size: NonZeroUsize,
    pub keepalive: KeepaliveConfig,
    pub shutdown_grace: Duration,
    /// `None` means plaintext, which is only reachable through `--insecure`.
    pub tls: Option<TlsPaths>,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let num_workers = non_zero(args.num_workers, "NUM_WORKERS")?;
        let queue_capacity = non_zero(args.queue_capacity, "QUEUE_CAPACITY")?;
        let progress_interval = non_zero(args.progress_interval, "PROGRESS_INTERVAL")?;
        let stream_buffer_size = non_zero(args.stream_buffer_size, "STREAM_BUFFER_SIZE")?;
        if args.keepalive_time_ms == 0 || args.keepalive_timeout_ms == 0 {
            bail!("KEEPALIVE_TIME_MS and KEEPALIVE_TIMEOUT_MS must be greater than 0");
        }

        let tls = match (args.insecure, args.tls_cert, args.tls_key) {
            (true, None, None) => None,
            (true, _, _) => {
                bail!("--insecure cannot be combined with TLS_CERT_PATH or TLS_KEY_PATH")
            }
            (false, Some(cert), Some(key)) => Some(TlsPaths { cert, key }),
            (false, _, _) => bail!(
                "TLS_CERT_PATH and TLS_KEY_PATH are both required; pass --insecure to serve \
                 plaintext"
            ),
        };

        Ok(Self {
            server_addr: args.server_addr,
            num_workers,
            queue_capacity,
            record_count: args.record_count,
            seed: args.seed,
            progress_interval,
            stream_buffer_size,
            keepalive: KeepaliveConfig {
                time: Duration::from_millis(args.keepalive_time_ms),
                timeout: Duration::from_millis(args.keepalive_timeout_ms),
                permit_without_calls: args.permit_keepalive_without_calls,
            },
            shutdown_grace: Duration::from_secs(args.shutdown_grace_secs),
            tls,
        })
    }
}

fn non_zero(value: usize, name: &str) -> anyhow::Result<NonZeroUsize> {
    NonZeroUsize::new(value).with_context(|| format!("{name} must be greater than 0"))
}
