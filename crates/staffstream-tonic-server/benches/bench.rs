use clap::Parser;
use core::{fmt, hint::black_box};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::stream::FuturesUnordered;
use staffstream_tonic_core::{
    proto::{
        LargeDataRequest, simple_data_service_client::SimpleDataServiceClient,
        simple_data_service_server::SimpleDataServiceServer,
    },
    staffstream::{EmployeeRecord, RecordSet},
};
use staffstream_tonic_server::server::{
    config::{CliArgs, ServerConfig},
    service::handler::ExportService,
};
use std::{sync::Arc, time::Instant};
use tokio::{net::TcpListener, runtime::Builder};
use tokio_stream::{StreamExt, wrappers::TcpListenerStream};
use tonic::{
    codec::CompressionEncoding,
    transport::{Channel, Server},
};

#[derive(Clone, Copy, Debug)]
enum Compression {
    None,
    Deflate,
    Gzip,
    Zstd,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Deflate => write!(f, "deflate"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
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

#[derive(Clone, Copy, Debug)]
struct GrpcBenchParams {
    concurrency: usize,
    compression: Compression,
    parse: bool,
}

const NUM_WORKERS: &str = "32";

fn grpc_bench(c: &mut Criterion) {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();

    let (addr, records) = rt.block_on(async {
        let argv = [
            "staffstream-tonic-server",
            "--insecure",
            "--seed",
            "1",
            "--num-workers",
            NUM_WORKERS,
        ];
        let config = ServerConfig::try_from(CliArgs::try_parse_from(argv).unwrap()).unwrap();
        let records = Arc::new(RecordSet::generate_seeded(config.record_count, 1));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let service = SimpleDataServiceServer::new(ExportService::new(config, records.clone()))
            .send_compressed(CompressionEncoding::Zstd)
            .send_compressed(CompressionEncoding::Gzip)
            .send_compressed(CompressionEncoding::Deflate);

        tokio::spawn(async move {
            Server::builder()
                .http2_adaptive_window(Some(true))
                .add_service(service)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        (addr, records)
    });
    let uri = format!("http://{addr}");

    let concurrency_cases = [1, 4, 16, 64];
    let compression_cases = [
        Compression::None,
        Compression::Zstd,
        Compression::Gzip,
        Compression::Deflate,
    ];

    // Generate cartesian product of all param combinations
    let mut cases = Vec::new();
    for &concurrency in &concurrency_cases {
        for &compression in &compression_cases {
            for parse in [false, true] {
                cases.push(GrpcBenchParams {
                    concurrency,
                    compression,
                    parse,
                });
            }
        }
    }

    for params in &cases {
        let mut group = c.benchmark_group("grpc/stream_large_data");
        group.throughput(Throughput::Elements(
            (records.len() * params.concurrency) as u64,
        ));

        group.bench_function(
            format!(
                "conc/{}/comp/{}/parse/{}",
                params.concurrency, params.compression, params.parse,
            ),
            |b| {
                b.to_async(&rt).iter_custom(|iters| {
                    let uri = uri.clone();
                    async move {
                        let channel = Channel::from_shared(uri)
                            .unwrap()
                            .connect()
                            .await
                            .expect("Failed to connect to server");

                        let start = Instant::now();

                        for _ in 0..iters {
                            run_grpc_stream_bench(&channel, params).await;
                        }

                        start.elapsed()
                    }
                });
            },
        );

        group.finish();
    }
}

async fn run_grpc_stream_bench(channel: &Channel, params: &GrpcBenchParams) {
    let mut tasks = FuturesUnordered::new();

    for _ in 0..params.concurrency {
        let channel = channel.clone();
        let compression = params.compression;
        let parse = params.parse;

        tasks.push(tokio::spawn(async move {
            let mut client = SimpleDataServiceClient::new(channel);
            if let Some(encoding) = compression.into() {
                client = client.accept_compressed(encoding);
            }

            let mut stream = client
                .stream_large_data(LargeDataRequest {})
                .await
                .expect("stream call failed")
                .into_inner();

            while let Some(resp) = stream.next().await {
                let line = resp.expect("resp").line;
                if parse {
                    let record: EmployeeRecord = line.parse().expect("unparseable line");
                    black_box(record);
                } else {
                    black_box(line);
                }
            }
        }));
    }

    // Wait for all tasks to complete
    while let Some(res) = tasks.next().await {
        res.unwrap();
    }
}

criterion_group!(grpc_benches, grpc_bench);
criterion_main!(grpc_benches);
