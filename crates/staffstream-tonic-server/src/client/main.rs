use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use core::hash::{Hash, Hasher};
use futures::stream::{FuturesUnordered, StreamExt as FuturesStreamExt};
use staffstream_tonic_core::{
    proto::{LargeDataRequest, simple_data_service_client::SimpleDataServiceClient},
    staffstream::EmployeeRecord,
    types::DEFAULT_PORT,
};
use staffstream_tonic_server::server::telemetry::init_telemetry;
use std::{
    collections::hash_map::DefaultHasher,
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio_stream::StreamExt as TokioStreamExt;
use tonic::{
    codec::CompressionEncoding,
    transport::{Certificate, Channel, ClientTlsConfig, Endpoint},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Compression {
    None,
    Deflate,
    Gzip,
    Zstd,
}

impl From<Compression> for Option<CompressionEncoding> {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => None,
            Compression::Deflate => Some(CompressionEncoding::Deflate),
            Compression::Gzip => Some(CompressionEncoding::Gzip),
            Compression::Zstd => Some(CompressionEncoding::Zstd),
        }
    }
}

/// Streams the employee record set from a running `staffstream-tonic-server`
/// and checks every line on the way.
#[derive(Parser, Debug)]
#[command(name = "staffstream-client", version)]
struct ClientArgs {
    /// Server endpoint. Use `https://` together with `--ca-cert` for TLS.
    #[arg(long, env = "STAFFSTREAM_ENDPOINT", default_value_t = format!("http://127.0.0.1:{DEFAULT_PORT}"))]
    endpoint: String,

    /// Number of concurrent calls.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Drop each stream after this many records.
    #[arg(long)]
    cancel_after: Option<usize>,

    /// PEM-encoded CA certificate the server's certificate chains to.
    #[arg(long, env = "STAFFSTREAM_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Name to verify the server certificate against, if it differs from the
    /// endpoint host.
    #[arg(long)]
    domain: Option<String>,

    /// Compression to request for responses.
    #[arg(long, value_enum, default_value_t = Compression::None)]
    compression: Compression,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = ClientArgs::parse();
    let providers = init_telemetry()?;

    let channel = connect(&args).await?;
    let start = Instant::now();

    let mut tasks = FuturesUnordered::new();
    for stream_id in 0..args.concurrency.max(1) {
        let channel = channel.clone();
        let compression = args.compression;
        let cancel_after = args.cancel_after;
        tasks.push(tokio::spawn(async move {
            consume(stream_id, channel, compression, cancel_after).await
        }));
    }

    let mut reports = Vec::with_capacity(args.concurrency);
    while let Some(res) = FuturesStreamExt::next(&mut tasks).await {
        reports.push(res??);
    }
    let elapsed = start.elapsed();
    reports.sort_by_key(|r| r.stream_id);

    // === Final Summary Table ===
    println!("\n=== Stream Summary ===");
    println!(
        "{:<8} | {:>10} | {:>10} | {:>12} | {:>16}",
        "Stream", "Records", "Status", "Time (ms)", "Records/sec"
    );
    println!("{}", "-".repeat(68));
    for r in &reports {
        r.report();
    }

    let total: usize = reports.iter().map(|r| r.received).sum();
    println!("{}", "-".repeat(68));
    println!(
        "{:<8} | {:>10} | {:>10} | {:>12.2} | {:>16.2}",
        "all",
        total,
        "",
        elapsed.as_secs_f64() * 1000.0,
        total as f64 / elapsed.as_secs_f64()
    );

    let mut digests = reports
        .iter()
        .filter(|r| !r.cancelled)
        .map(|r| (r.received, r.digest));
    let consistent = match digests.next() {
        Some(first) => digests.all(|d| d == first),
        None => true,
    };

    providers.shutdown();
    if !consistent {
        bail!("completed streams returned different content");
    }
    Ok(())
}

async fn connect(args: &ClientArgs) -> anyhow::Result<Channel> {
    let mut endpoint = Endpoint::from_shared(args.endpoint.clone())
        .with_context(|| format!("invalid endpoint {}", args.endpoint))?;

    if let Some(path) = &args.ca_cert {
        let pem = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
        if let Some(domain) = &args.domain {
            tls = tls.domain_name(domain.clone());
        }
        endpoint = endpoint.tls_config(tls)?;
    } else if args.endpoint.starts_with("https://") {
        bail!("https endpoints need --ca-cert");
    }

    endpoint
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", args.endpoint))
}

#[derive(Debug)]
struct StreamReport {
    stream_id: usize,
    received: usize,
    cancelled: bool,
    digest: u64,
    duration: Duration,
}

impl StreamReport {
    fn throughput(&self) -> f64 {
        self.received as f64 / self.duration.as_secs_f64()
    }

    fn report(&self) {
        println!(
            "{:<8} | {:>10} | {:>10} | {:>12.2} | {:>16.2}",
            self.stream_id,
            self.received,
            if self.cancelled { "cancelled" } else { "complete" },
            self.duration.as_secs_f64() * 1000.0,
            self.throughput()
        );
    }
}

/// Reads one stream to the end, or until `cancel_after` records, checking
/// that every line parses and that ids run 1, 2, 3, ...
async fn consume(
    stream_id: usize,
    channel: Channel,
    compression: Compression,
    cancel_after: Option<usize>,
) -> anyhow::Result<StreamReport> {
    let start = Instant::now();
    let mut client = SimpleDataServiceClient::new(channel);
    if let Some(encoding) = compression.into() {
        client = client.accept_compressed(encoding);
    }

    let mut stream = client
        .stream_large_data(LargeDataRequest {})
        .await?
        .into_inner();

    let mut received = 0;
    let mut hasher = DefaultHasher::new();
    let mut cancelled = false;

    while let Some(frame) = TokioStreamExt::next(&mut stream).await {
        let frame = frame?;
        let record: EmployeeRecord = frame
            .line
            .parse()
            .with_context(|| format!("stream {stream_id}: unparseable line {:?}", frame.line))?;

        received += 1;
        if record.id() as usize != received {
            bail!(
                "stream {stream_id}: expected id {received}, got {}",
                record.id()
            );
        }
        frame.line.hash(&mut hasher);

        if cancel_after.is_some_and(|n| received >= n) {
            tracing::info!("Stream {stream_id} cancelling after {received} records");
            cancelled = true;
            break;
        }
    }

    Ok(StreamReport {
        stream_id,
        received,
        cancelled,
        digest: hasher.finish(),
        duration: start.elapsed(),
    })
}
