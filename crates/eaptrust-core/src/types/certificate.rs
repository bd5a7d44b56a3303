//! Server certificates observed during the EAP-TLS handshake.

use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrustError};

/// SHA-256 fingerprint of a certificate (lowercase hex).
pub type CertFingerprint = String;

/// One certificate presented by the authentication server.
///
/// Subject and issuer are kept as the full distinguished name strings so
/// chain links can be compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCertificate {
    subject: String,
    issuer: String,
    #[serde(with = "hex_bytes")]
    signature: Vec<u8>,
    is_ca: bool,
    fingerprint: CertFingerprint,
    #[serde(with = "hex_bytes", default)]
    der: Vec<u8>,
}

impl ServerCertificate {
    /// Decode a DER-encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| {
            TrustError::CertParse {
                reason: e.to_string(),
            }
        })?;

        let is_ca = cert
            .basic_constraints()
            .ok()
            .flatten()
            .is_some_and(|bc| bc.value.ca);

        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            signature: cert.signature_value.data.to_vec(),
            is_ca,
            fingerprint: sha256_hex(der),
            der: der.to_vec(),
        })
    }

    /// Build a certificate from fields the handshake layer already decoded.
    ///
    /// The fingerprint covers the subject, issuer and signature since no DER
    /// encoding is available.
    #[must_use]
    pub fn from_parts(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        signature: impl Into<Vec<u8>>,
        is_ca: bool,
    ) -> Self {
        let subject = subject.into();
        let issuer = issuer.into();
        let signature = signature.into();

        let mut material = Vec::with_capacity(subject.len() + issuer.len() + signature.len() + 2);
        material.extend_from_slice(subject.as_bytes());
        material.push(b'|');
        material.extend_from_slice(issuer.as_bytes());
        material.push(b'|');
        material.extend_from_slice(&signature);

        Self {
            fingerprint: sha256_hex(&material),
            subject,
            issuer,
            signature,
            is_ca,
            der: Vec::new(),
        }
    }

    /// Subject distinguished name
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Raw signature bytes
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Whether the basic constraints mark this certificate as a CA
    #[must_use]
    pub const fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// Whether subject and issuer are the same name
    #[must_use]
    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }

    /// SHA-256 fingerprint (hex)
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// DER encoding, empty for certificates built with [`Self::from_parts`]
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest(&SHA256, data).as_ref())
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubjectInfo;
    use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};

    fn self_signed_der(cn: &str, ca: bool) -> Vec<u8> {
        let mut params = CertificateParams::new(vec![format!("{cn}.example.com")]).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        dn.push(DnType::OrganizationName, "Example Corp");
        params.distinguished_name = dn;
        if ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        }
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn decodes_self_signed_ca() {
        let der = self_signed_der("corp-root", true);
        let cert = ServerCertificate::from_der(&der).unwrap();

        assert!(cert.is_ca());
        assert!(cert.is_self_signed());
        assert!(!cert.signature().is_empty());
        assert_eq!(cert.fingerprint().len(), 64);
        assert_eq!(cert.der(), der.as_slice());

        let subject = SubjectInfo::parse(cert.subject()).unwrap();
        assert_eq!(subject.common_name, "corp-root");
        assert_eq!(subject.organization, "Example Corp");
    }

    #[test]
    fn decodes_end_entity_without_ca_flag() {
        let cert = ServerCertificate::from_der(&self_signed_der("radius", false)).unwrap();
        assert!(!cert.is_ca());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ServerCertificate::from_der(b"not a certificate"),
            Err(TrustError::CertParse { .. })
        ));
    }

    #[test]
    fn parts_fingerprint_depends_on_signature() {
        let a = ServerCertificate::from_parts("CN=a", "CN=ca", vec![1, 2, 3], false);
        let b = ServerCertificate::from_parts("CN=a", "CN=ca", vec![1, 2, 4], false);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(a.der().is_empty());
        assert!(!a.is_self_signed());
    }

    #[test]
    fn serde_keeps_signature_as_hex() {
        let cert = ServerCertificate::from_parts("CN=a", "CN=a", vec![0xde, 0xad], true);
        let json = serde_json::to_string(&cert).unwrap();
        assert!(json.contains("\"dead\""));
        let back: ServerCertificate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cert);
    }
}
