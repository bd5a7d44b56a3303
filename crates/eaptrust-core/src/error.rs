use thiserror::Error;

/// Result type alias for eaptrust operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors raised outside the trust protocol itself: decoding, I/O, config.
#[derive(Error, Debug)]
pub enum TrustError {
    /// DER bytes could not be decoded as an X.509 certificate
    #[error("certificate parse failed: {reason}")]
    CertParse {
        /// Decoder message
        reason: String,
    },

    /// PEM container could not be decoded
    #[error("PEM decode failed for {path}: {reason}")]
    PemDecode {
        /// Source file
        path: String,
        /// Decoder message
        reason: String,
    },

    /// A distinguished name had no usable common name
    #[error("invalid distinguished name: {0}")]
    InvalidName(String),

    /// File read or write failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration is invalid or could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrustError {
    /// Wrap an I/O error with the path that produced it.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reasons a collected server certificate chain cannot be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Nothing was received during the handshake
    #[error("no server certificates were received")]
    Empty,

    /// No certificate at depth 0
    #[error("server (leaf) certificate is missing")]
    MissingLeaf,

    /// The highest-depth certificate is neither a CA nor self-signed
    #[error("certificate at depth {depth} cannot act as a root")]
    UntrustedRoot {
        /// Depth of the presumed root
        depth: u32,
    },

    /// A depth between the leaf and the root was never delivered
    #[error("no certificate at depth {depth}")]
    MissingLink {
        /// The absent depth
        depth: u32,
    },

    /// A certificate's issuer does not name its parent
    #[error("issuer of depth {depth} ({issuer}) does not match parent subject ({parent_subject})")]
    IssuerMismatch {
        /// Depth of the child certificate
        depth: u32,
        /// Issuer named by the child
        issuer: String,
        /// Subject of the certificate one depth higher
        parent_subject: String,
    },
}

impl ChainError {
    /// Returns true if the chain is broken rather than merely incomplete.
    ///
    /// Broken chains get an informational prompt; incomplete ones do not.
    #[must_use]
    pub const fn is_broken_link(&self) -> bool {
        matches!(self, Self::MissingLink { .. } | Self::IssuerMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_link_classification() {
        assert!(!ChainError::Empty.is_broken_link());
        assert!(!ChainError::MissingLeaf.is_broken_link());
        assert!(!ChainError::UntrustedRoot { depth: 0 }.is_broken_link());
        assert!(ChainError::MissingLink { depth: 1 }.is_broken_link());
        assert!(ChainError::IssuerMismatch {
            depth: 0,
            issuer: "CN=a".into(),
            parent_subject: "CN=b".into(),
        }
        .is_broken_link());
    }
}
