//! Depth-keyed server certificate chain.
//!
//! Certificates arrive from the handshake in any order, each tagged with its
//! depth (0 = server). The first certificate seen at a depth wins. The entry
//! with the highest depth is the provisional root.

use std::collections::BTreeMap;

use eaptrust_core::{ChainError, Result, ServerCertificate, SubjectInfo};

/// A certificate plus its parsed names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    /// Position in the chain, 0 = server
    pub depth: u32,
    /// The certificate as received
    pub cert: ServerCertificate,
    /// Parsed subject
    pub subject: SubjectInfo,
    /// Parsed issuer
    pub issuer: SubjectInfo,
}

impl ChainEntry {
    fn can_anchor(&self) -> bool {
        self.cert.is_ca() || self.cert.is_self_signed()
    }
}

/// Certificates collected for the pending connection.
#[derive(Debug, Clone, Default)]
pub struct CertChain {
    entries: BTreeMap<u32, ChainEntry>,
}

impl CertChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certificate at `depth`.
    ///
    /// Returns `Ok(true)` if stored, `Ok(false)` if the depth was already
    /// occupied (the earlier certificate is kept), and an error if the
    /// subject or issuer has no usable common name.
    pub fn insert(&mut self, depth: u32, cert: ServerCertificate) -> Result<bool> {
        let subject = SubjectInfo::parse(cert.subject())?;
        let issuer = SubjectInfo::parse(cert.issuer())?;

        if self.entries.contains_key(&depth) {
            return Ok(false);
        }
        self.entries.insert(
            depth,
            ChainEntry {
                depth,
                cert,
                subject,
                issuer,
            },
        );
        Ok(true)
    }

    /// Entry at a depth
    #[must_use]
    pub fn get(&self, depth: u32) -> Option<&ChainEntry> {
        self.entries.get(&depth)
    }

    /// The server certificate (depth 0)
    #[must_use]
    pub fn leaf(&self) -> Option<&ChainEntry> {
        self.get(0)
    }

    /// The provisional root: whatever sits at the highest depth seen so far
    #[must_use]
    pub fn root(&self) -> Option<&ChainEntry> {
        self.entries.values().next_back()
    }

    /// The provisional root, if it is a CA or self-signed
    #[must_use]
    pub fn trusted_root(&self) -> Option<&ChainEntry> {
        self.root().filter(|e| e.can_anchor())
    }

    /// Number of distinct depths stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending depth order
    pub fn iter(&self) -> impl Iterator<Item = &ChainEntry> {
        self.entries.values()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Check the chain from the root down to the server certificate.
    ///
    /// The root must be a CA or self-signed. Every other entry must be issued
    /// by the entry exactly one depth above it.
    pub fn validate(&self) -> std::result::Result<(), ChainError> {
        self.anchors().map(|_| ())
    }

    /// Validate and return `(root, leaf)`.
    ///
    /// For a single self-signed server certificate both are the same entry.
    pub fn anchors(&self) -> std::result::Result<(&ChainEntry, &ChainEntry), ChainError> {
        let root = self.root().ok_or(ChainError::Empty)?;
        let leaf = self.leaf().ok_or(ChainError::MissingLeaf)?;
        if !root.can_anchor() {
            return Err(ChainError::UntrustedRoot { depth: root.depth });
        }

        let mut parent = root;
        for depth in (0..root.depth).rev() {
            let child = self
                .get(depth)
                .ok_or(ChainError::MissingLink { depth })?;
            if child.cert.issuer() != parent.cert.subject() {
                return Err(ChainError::IssuerMismatch {
                    depth,
                    issuer: child.cert.issuer().to_string(),
                    parent_subject: parent.cert.subject().to_string(),
                });
            }
            parent = child;
        }

        Ok((root, leaf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(subject: &str, issuer: &str, ca: bool) -> ServerCertificate {
        ServerCertificate::from_parts(
            format!("O={subject} Organization,CN={subject}"),
            format!("O={issuer} Organization,CN={issuer}"),
            vec![0xde, 0xad, 0xbe, 0xef, 0x12, 0x34, 0x56, 0x78],
            ca,
        )
    }

    fn three_level(order: &[u32]) -> CertChain {
        let certs = [
            cert("server", "middle", false),
            cert("middle", "ca", false),
            cert("ca", "ca", true),
        ];
        let mut chain = CertChain::new();
        for &depth in order {
            assert!(chain.insert(depth, certs[depth as usize].clone()).unwrap());
        }
        chain
    }

    #[test]
    fn first_certificate_at_a_depth_wins() {
        let mut chain = CertChain::new();
        let first = cert("server", "ca", false);
        assert!(chain.insert(0, first.clone()).unwrap());
        assert!(!chain.insert(0, cert("impostor", "ca", false)).unwrap());

        assert_eq!(chain.len(), 1);
        assert_eq!(chain.leaf().unwrap().cert, first);
    }

    #[test]
    fn arrival_order_does_not_matter() {
        let reference = three_level(&[0, 1, 2]);
        for order in [[2, 1, 0], [1, 0, 2]] {
            let chain = three_level(&order);
            let (root, leaf) = chain.anchors().unwrap();
            let (ref_root, ref_leaf) = reference.anchors().unwrap();
            assert_eq!(root, ref_root);
            assert_eq!(leaf, ref_leaf);
        }
    }

    #[test]
    fn higher_depth_replaces_provisional_root() {
        let mut chain = CertChain::new();
        chain.insert(0, cert("server", "ca", false)).unwrap();
        assert_eq!(chain.root().unwrap().depth, 0);
        chain.insert(1, cert("ca", "ca", true)).unwrap();
        assert_eq!(chain.root().unwrap().depth, 1);
        assert_eq!(chain.trusted_root().unwrap().subject.common_name, "ca");
    }

    #[test]
    fn self_signed_leaf_anchors_itself() {
        let mut chain = CertChain::new();
        chain.insert(0, cert("self", "self", false)).unwrap();
        let (root, leaf) = chain.anchors().unwrap();
        assert_eq!(root, leaf);
    }

    #[test]
    fn headless_chain_is_untrusted() {
        let mut chain = CertChain::new();
        chain.insert(0, cert("server", "ca", false)).unwrap();
        assert!(chain.trusted_root().is_none());
        assert_eq!(chain.validate(), Err(ChainError::UntrustedRoot { depth: 0 }));
    }

    #[test]
    fn issuer_must_name_parent() {
        let mut chain = CertChain::new();
        chain.insert(1, cert("ca", "ca", true)).unwrap();
        chain.insert(0, cert("server", "intermediate", false)).unwrap();

        let err = chain.validate().unwrap_err();
        assert!(matches!(err, ChainError::IssuerMismatch { depth: 0, .. }));
        assert!(err.is_broken_link());
    }

    #[test]
    fn gaps_are_broken_links() {
        let mut chain = CertChain::new();
        chain.insert(2, cert("ca", "ca", true)).unwrap();
        chain.insert(0, cert("server", "ca", false)).unwrap();
        assert_eq!(chain.validate(), Err(ChainError::MissingLink { depth: 1 }));
    }

    #[test]
    fn root_without_leaf_is_incomplete() {
        let mut chain = CertChain::new();
        chain.insert(1, cert("ca", "ca", true)).unwrap();
        assert_eq!(chain.validate(), Err(ChainError::MissingLeaf));
        assert_eq!(CertChain::new().validate(), Err(ChainError::Empty));
    }

    #[test]
    fn unparsable_names_are_not_stored() {
        let mut chain = CertChain::new();
        let nameless = ServerCertificate::from_parts("O=No CN", "CN=ca", vec![1], false);
        assert!(chain.insert(0, nameless).is_err());
        assert!(chain.is_empty());
    }
}
