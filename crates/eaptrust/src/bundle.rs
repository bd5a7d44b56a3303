//! PEM certificate bundles.
//!
//! A bundle lists the chain the way servers send it: server certificate
//! first, then each issuer. Position in the file becomes the depth.

use std::path::Path;

use eaptrust_core::{Result, ServerCertificate, TrustError};

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Read a PEM bundle from disk.
pub async fn load_pem_chain(path: &Path) -> Result<Vec<ServerCertificate>> {
    let source = path.display().to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| TrustError::io(source.clone(), e))?;
    parse_pem_chain(&bytes, &source)
}

/// Decode every `CERTIFICATE` block in `bytes`, leaf first.
///
/// Other blocks (keys, CRLs) are skipped. A bundle without any certificate
/// is an error.
pub fn parse_pem_chain(bytes: &[u8], source: &str) -> Result<Vec<ServerCertificate>> {
    let blocks = pem::parse_many(bytes).map_err(|e| TrustError::PemDecode {
        path: source.to_string(),
        reason: e.to_string(),
    })?;

    let certs = blocks
        .iter()
        .filter(|b| b.tag() == CERTIFICATE_TAG)
        .map(|b| ServerCertificate::from_der(b.contents()))
        .collect::<Result<Vec<_>>>()?;

    if certs.is_empty() {
        return Err(TrustError::PemDecode {
            path: source.to_string(),
            reason: "no CERTIFICATE blocks".into(),
        });
    }
    tracing::debug!(source, count = certs.len(), "loaded certificate bundle");
    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{
        BasicConstraints, CertificateParams, DnType, IsCa, KeyPair,
    };

    fn ca_and_server() -> (String, String) {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.distinguished_name.push(DnType::CommonName, "Bundle Root");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca = ca_params.self_signed(&ca_key).unwrap();

        let server_key = KeyPair::generate().unwrap();
        let mut server_params = CertificateParams::new(vec!["radius.example".to_string()]).unwrap();
        server_params.distinguished_name.push(DnType::CommonName, "radius.example");
        let server = server_params.signed_by(&server_key, &ca, &ca_key).unwrap();

        (ca.pem(), server.pem())
    }

    #[test]
    fn parses_leaf_first_bundle() {
        let (ca, server) = ca_and_server();
        let bundle = format!("{server}{ca}");
        let certs = parse_pem_chain(bundle.as_bytes(), "test").unwrap();

        assert_eq!(certs.len(), 2);
        assert!(certs[0].subject().contains("radius.example"));
        assert!(!certs[0].is_ca());
        assert!(certs[1].is_ca());
        assert_eq!(certs[0].issuer(), certs[1].subject());
    }

    #[test]
    fn skips_non_certificate_blocks() {
        let (ca, _) = ca_and_server();
        let key = KeyPair::generate().unwrap().serialize_pem();
        let bundle = format!("{key}{ca}");
        let certs = parse_pem_chain(bundle.as_bytes(), "test").unwrap();
        assert_eq!(certs.len(), 1);
    }

    #[test]
    fn rejects_bundle_without_certificates() {
        let err = parse_pem_chain(b"not pem at all", "junk.pem").unwrap_err();
        assert!(matches!(err, TrustError::PemDecode { .. }));
    }

    #[tokio::test]
    async fn loads_bundle_from_disk() {
        let (ca, server) = ca_and_server();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.pem");
        std::fs::write(&path, format!("{server}{ca}")).unwrap();

        let certs = load_pem_chain(&path).await.unwrap();
        assert_eq!(certs.len(), 2);
    }

    #[tokio::test]
    async fn missing_bundle_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pem_chain(&dir.path().join("absent.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrustError::Io { .. }));
    }
}
