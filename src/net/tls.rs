//! TLS configuration and certificate loading.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load a rustls server config from PEM certificate and key files.
///
/// Both paths are checked up front so a misconfiguration names every missing file.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> io::Result<RustlsConfig> {
    let missing: Vec<String> = [("certificate", cert_path), ("private key", key_path)]
        .into_iter()
        .filter(|(_, path)| !path.is_file())
        .map(|(what, path)| format!("{} file not found: {}", what, path.display()))
        .collect();

    if !missing.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, missing.join("; ")));
    }

    let config = RustlsConfig::from_pem_file(cert_path, key_path).await?;
    tracing::info!(cert = %cert_path.display(), "TLS certificate loaded");
    Ok(config)
}
