//! TLS configuration for `ssl://` brokers
//!
//! Client certificates are optional. Server verification uses the CA file when
//! one is given and an empty root store otherwise, which rejects every server
//! certificate. `insecure_skip_verify` turns verification off entirely; it is
//! meant for self-signed test brokers and is never enabled implicitly.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rumqttc::tokio_rustls::rustls;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use tracing::warn;

use crate::utils::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsOptions {
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub ca_cert: Option<PathBuf>,
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    /// Reads the certificate material and builds a rustls client config.
    /// Shared by every virtual client of a run.
    pub fn client_config(&self) -> Result<Arc<ClientConfig>, ConfigError> {
        let builder = if self.insecure_skip_verify {
            warn!("TLS server certificate verification is disabled");
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoCertVerifier))
        } else {
            let mut roots = RootCertStore::empty();
            if let Some(ca) = &self.ca_cert {
                for cert in read_certs(ca)? {
                    roots.add(cert).map_err(|e| tls_error(ca, e))?;
                }
            }
            ClientConfig::builder().with_root_certificates(roots)
        };

        let config = match (&self.client_cert, &self.client_key) {
            (Some(cert_path), Some(key_path)) => {
                let certs = read_certs(cert_path)?;
                let key = read_key(key_path)?;
                builder
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| tls_error(cert_path, e))?
            }
            _ => builder.with_no_client_auth(),
        };

        Ok(Arc::new(config))
    }
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ConfigError> {
    let file = File::open(path).map_err(|e| tls_error(path, e))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| tls_error(path, e))?;
    if certs.is_empty() {
        return Err(tls_error(path, "no certificates found"));
    }
    Ok(certs)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>, ConfigError> {
    let file = File::open(path).map_err(|e| tls_error(path, e))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| tls_error(path, e))?
        .ok_or_else(|| tls_error(path, "no private key found"))
}

fn tls_error(path: &Path, reason: impl ToString) -> ConfigError {
    ConfigError::Tls {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

// Dangerous: certificate verifier that accepts any certificate
#[derive(Debug)]
pub(crate) struct NoCertVerifier;

impl rustls::client::danger::ServerCertVerifier for NoCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
