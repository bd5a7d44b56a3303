//! Core types and traits for enterprise Wi-Fi trust-on-first-use.
//!
//! This crate provides the foundational pieces shared by the trust handler
//! and its hosts:
//!
//! - **Types**: network and enterprise configuration, server certificates,
//!   distinguished names, prompt requests and replies
//! - **Traits**: the collaborators the handler drives ([`NetworkStore`],
//!   [`NativeSession`], [`UserPrompt`]) and the [`TrustListener`] it reports to
//! - **Errors**: [`TrustError`] for decoding/I/O and [`ChainError`] for chain
//!   validation
//!
//! # Example
//!
//! ```rust,ignore
//! use eaptrust_core::{ServerCertificate, SubjectInfo};
//!
//! let cert = ServerCertificate::from_der(&der)?;
//! let subject = SubjectInfo::parse(cert.subject())?;
//! println!("server: {}", subject.common_name);
//! ```

mod error;
pub mod traits;
pub mod types;

pub use error::{ChainError, Result, TrustError};
pub use traits::{NativeSession, NetworkStore, TrustListener, UserPrompt};
pub use types::*;
