use clap::Parser;
use futures::Stream;
use staffstream_tonic_core::{
    proto::{FILE_DESCRIPTOR_SET, simple_data_service_server::SimpleDataServiceServer},
    staffstream::RecordSet,
    types::SERVICE_NAME,
};
use staffstream_tonic_server::server::{
    config::{CliArgs, ServerConfig},
    service::handler::ExportService,
    telemetry::{TelemetryProviders, init_telemetry},
    tls::TlsIdentity,
    web::cors_layer,
};
use std::{sync::Arc, time::Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::signal;
use tonic::transport::server::{Connected, TcpIncoming};
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let records = Arc::new(generate_records(&config));

    let tcp = TcpListener::bind(&config.server_addr).await?;
    let local_addr = tcp.local_addr()?;
    // `serve_with_incoming` ignores the builder's TCP settings, so they are
    // applied to the listener here.
    let incoming = TcpIncoming::from(tcp)
        .with_nodelay(Some(true))
        .with_keepalive(config.keepalive.tcp_keepalive());
    log_startup_info(&local_addr.to_string(), &config, records.len());
    run_server_with_incoming(providers, incoming, config, records).await
}

fn generate_records(config: &ServerConfig) -> RecordSet {
    let start = Instant::now();
    let records = match config.seed {
        Some(seed) => RecordSet::generate_seeded(config.record_count, seed),
        None => RecordSet::generate(config.record_count),
    };
    tracing::info!(
        "Initialized with {} employee records in {:.2}ms",
        records.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    records
}

async fn run_server_with_incoming<I, IO, IE>(
    providers: TelemetryProviders,
    incoming: I,
    config: ServerConfig,
    records: Arc<RecordSet>,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<SimpleDataServiceServer<ExportService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let mut builder = Server::builder();
    if let Some(paths) = &config.tls {
        let identity = TlsIdentity::from_files(paths)?;
        builder = builder.tls_config(identity.server_config())?;
    }

    let keepalive = config.keepalive;
    let service = ExportService::new(config, records);

    builder
        .http2_keepalive_interval(Some(keepalive.time))
        .http2_keepalive_timeout(Some(keepalive.timeout))
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer())
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service.clone())
        .add_service(reflection)
        .add_service(build_export_service(service.clone()))
        .serve_with_incoming_shutdown(
            incoming,
            shutdown_signal(service, health_reporter, providers),
        )
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(addr: &str, config: &ServerConfig, records: usize) {
    let transport = if config.tls.is_some() { "TLS" } else { "plaintext" };
    tracing::info!(
        "Serving {}/StreamLargeData on {} ({}): {} records, {} workers",
        SERVICE_NAME,
        addr,
        transport,
        records,
        config.num_workers
    );
    if cfg!(debug_assertions) {
        tracing::debug!("Full config: {:#?}", config);
    }
}

fn build_export_service(service: ExportService) -> SimpleDataServiceServer<ExportService> {
    SimpleDataServiceServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

async fn shutdown_signal(
    service: ExportService,
    health_reporter: HealthReporter,
    providers: TelemetryProviders,
) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Publish the status
    health_reporter
        .set_not_serving::<SimpleDataServiceServer<ExportService>>()
        .await;

    // 2. Refuse new calls, drain, then stop the workers
    if let Err(e) = service.shutdown().await {
        tracing::error!("Error during service shutdown: {:?}", e);
    }

    // 3. Flush exporters
    providers.shutdown();
}
