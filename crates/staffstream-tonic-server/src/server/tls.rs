//! TLS configuration for the gRPC server.
//!
//! The server speaks TLS unless it is started with `--insecure`. The identity
//! is read from two PEM files, `TLS_CERT_PATH` and `TLS_KEY_PATH`, and handed
//! to tonic's rustls-backed transport.
//!
//! ```bash
//! TLS_CERT_PATH=/etc/ssl/server.crt \
//! TLS_KEY_PATH=/etc/ssl/server.key \
//! cargo run --bin staffstream-tonic-server
//! ```

use super::config::TlsPaths;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tonic::transport::{Identity, ServerTlsConfig};

/// TLS configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// A PEM file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A PEM file was read but holds no PEM block.
    #[error("{} does not contain PEM data", path.display())]
    InvalidFormat { path: PathBuf },
}

/// PEM-encoded server identity.
#[derive(Debug, Clone)]
pub struct TlsIdentity {
    cert: String,
    key: String,
}

impl TlsIdentity {
    /// Reads the certificate chain and private key named by `paths`.
    ///
    /// # Errors
    ///
    /// Fails if either file cannot be read or does not look like PEM.
    pub fn from_files(paths: &TlsPaths) -> Result<Self, TlsError> {
        Ok(Self {
            cert: read_pem(&paths.cert)?,
            key: read_pem(&paths.key)?,
        })
    }

    /// Builds the tonic [`ServerTlsConfig`] serving this identity.
    pub fn server_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new().identity(Identity::from_pem(&self.cert, &self.key))
    }
}

fn read_pem(path: &Path) -> Result<String, TlsError> {
    let pem = fs::read_to_string(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if !pem.contains("-----BEGIN ") {
        return Err(TlsError::InvalidFormat {
            path: path.to_path_buf(),
        });
    }
    Ok(pem)
}
