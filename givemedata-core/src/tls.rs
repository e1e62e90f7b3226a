//! TLS setup shared by the drivers.
//!
//! A leaf whose certificate file sits next to the configuration requires
//! the server to present a certificate signed by it. Both drivers take
//! their OpenSSL objects from here.

use std::path::{Path, PathBuf};

use openssl::error::ErrorStack;
use openssl::ssl::{SslConnector, SslContext, SslContextBuilder, SslMethod, SslVerifyMode};
use thiserror::Error;
use tracing::debug;

/// Result type for TLS setup.
pub type TlsResult<T> = Result<T, TlsError>;

/// Errors raised while building a TLS context.
#[derive(Error, Debug)]
pub enum TlsError {
    /// The certificate file could not be read.
    #[error("cannot read certificate {}: {source}", path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// OpenSSL rejected the setup.
    #[error("TLS error: {0}")]
    Ssl(#[from] ErrorStack),
}

fn check_readable(cert: &Path) -> TlsResult<()> {
    std::fs::metadata(cert).map_err(|source| TlsError::Certificate {
        path: cert.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Build a context that requires the peer to present a certificate signed by
/// the one stored (PEM) at `cert`.
pub fn verification_context(cert: &Path) -> TlsResult<SslContext> {
    check_readable(cert)?;

    let mut builder = SslContextBuilder::new(SslMethod::tls())?;
    builder.set_ca_file(cert)?;
    builder.set_verify(SslVerifyMode::PEER);
    debug!(cert = %cert.display(), "TLS verification context built");

    Ok(builder.build())
}

/// Build a client connector that verifies the peer against `cert`.
pub fn verified_connector(cert: &Path) -> TlsResult<SslConnector> {
    check_readable(cert)?;

    let mut builder = SslConnector::builder(SslMethod::tls())?;
    builder.set_ca_file(cert)?;
    builder.set_verify(SslVerifyMode::PEER);
    debug!(cert = %cert.display(), "TLS connector built");

    Ok(builder.build())
}

/// Build a client connector that encrypts without verifying the peer.
///
/// This is what `sslmode=require` means when no certificate is configured.
pub fn encrypting_connector() -> TlsResult<SslConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    builder.set_verify(SslVerifyMode::NONE);
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::hash::MessageDigest;
    use openssl::pkey::PKey;
    use openssl::rsa::Rsa;
    use openssl::x509::{X509Builder, X509NameBuilder};

    fn write_self_signed(path: &Path) {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "cluster.test").unwrap();
        let name = name.build();

        let mut cert = X509Builder::new().unwrap();
        cert.set_version(2).unwrap();
        cert.set_subject_name(&name).unwrap();
        cert.set_issuer_name(&name).unwrap();
        cert.set_pubkey(&key).unwrap();
        cert.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        cert.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        cert.set_serial_number(&serial).unwrap();
        cert.sign(&key, MessageDigest::sha256()).unwrap();

        std::fs::write(path, cert.build().to_pem().unwrap()).unwrap();
    }

    #[test]
    fn test_valid_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.givemedata.cer");
        write_self_signed(&path);

        let context = verification_context(&path).unwrap();
        assert_eq!(context.verify_mode(), SslVerifyMode::PEER);

        let connector = verified_connector(&path).unwrap();
        assert_eq!(connector.context().verify_mode(), SslVerifyMode::PEER);
    }

    #[test]
    fn test_encrypting_connector_skips_verification() {
        let connector = encrypting_connector().unwrap();
        assert_eq!(connector.context().verify_mode(), SslVerifyMode::NONE);
    }

    #[test]
    fn test_missing_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.cer");

        let err = verification_context(&absent).unwrap_err();
        assert!(matches!(err, TlsError::Certificate { .. }));
        let err = verified_connector(&absent).unwrap_err();
        assert!(matches!(err, TlsError::Certificate { .. }));
    }

    #[test]
    fn test_malformed_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cer");
        std::fs::write(&path, "not a certificate").unwrap();

        let err = verification_context(&path).unwrap_err();
        assert!(matches!(err, TlsError::Ssl(_)));
        let err = verified_connector(&path).unwrap_err();
        assert!(matches!(err, TlsError::Ssl(_)));
    }
}
