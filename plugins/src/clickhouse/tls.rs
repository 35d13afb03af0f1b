use clicktest_core::api::{ClickHouseConfig, ClientError};
use reqwest::{Certificate, ClientBuilder, Identity};

/// Applies the rustls settings from `cfg` to `builder`. No-op for plain HTTP.
pub(crate) fn configure(mut builder: ClientBuilder, cfg: &ClickHouseConfig) -> Result<ClientBuilder, ClientError> {
    if !cfg.use_tls() {
        return Ok(builder);
    }
    builder = builder.use_rustls_tls();

    if let Some(ca_file) = cfg.tls_ca_file.as_deref().filter(|s| !s.is_empty()) {
        let pem = read_pem(ca_file)?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| ClientError::Tls(format!("invalid CA certificate {ca_file}: {e}")))?;
        builder = builder.add_root_certificate(cert);
    }

    match (cfg.tls_cert_file.as_deref(), cfg.tls_key_file.as_deref()) {
        (Some(cert_file), Some(key_file)) if !cert_file.is_empty() && !key_file.is_empty() => {
            let mut pem = read_pem(cert_file)?;
            pem.push(b'\n');
            pem.extend(read_pem(key_file)?);
            let identity = Identity::from_pem(&pem)
                .map_err(|e| ClientError::Tls(format!("invalid client identity {cert_file}: {e}")))?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        _ => {
            return Err(ClientError::Tls(
                "tls_cert_file and tls_key_file must be set together".to_string(),
            ))
        }
    }

    if cfg.skip_verify() {
        tracing::warn!(host = %cfg.host, "TLS certificate verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

fn read_pem(path: &str) -> Result<Vec<u8>, ClientError> {
    std::fs::read(path).map_err(|e| ClientError::Tls(format!("read {path}: {e}")))
}
