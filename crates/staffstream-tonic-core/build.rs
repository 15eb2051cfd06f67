/// Builds the gRPC client and server code for the `staffstream.proto`
/// definition using `tonic-prost-build`.
///
/// This code generation step processes the Protocol Buffer definitions located
/// in the `proto` directory and emits Rust modules with gRPC bindings into the
/// crate's `OUT_DIR`. An encoded file descriptor set is written next to them so
/// the server can expose gRPC reflection.
///
/// # Files and Paths
///
/// - Proto file: `proto/staffstream.proto`
/// - Includes: `proto/`
/// - Descriptor: `$OUT_DIR/staffstream_descriptor.bin`
///
/// # Output
///
/// Generated code will be accessible in Rust via:
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("staffstream");
/// }
/// ```
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let descriptor_path = out_dir.join("staffstream_descriptor.bin");

    println!("cargo:rerun-if-changed=proto/staffstream.proto");

    tonic_prost_build::configure()
        .file_descriptor_set_path(&descriptor_path)
        .compile_protos(&["proto/staffstream.proto"], &["proto"])?;

    Ok(())
}
