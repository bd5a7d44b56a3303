//! # eaptrust
//!
//! Trust-on-first-use for enterprise Wi-Fi networks that have no CA
//! certificate.
//!
//! When such a network is selected, [`TofuTrustHandler`] holds it back,
//! collects the server certificate chain from the EAP handshake, and asks
//! the user whether to trust the server. An approved chain is installed as
//! the network's CA so later connections are verified normally. Devices that
//! cannot install a chain fall back to a one-time "connect without CA"
//! approval.
//!
//! ## Example
//!
//! ```no_run
//! use eaptrust::{HandlerConfig, MemoryNetworkStore, QueuedPrompt, RecordingSession, TofuTrustHandler};
//! use eaptrust::{EapMethod, EnterpriseConfig, NetworkConfig, Phase2Method, TrustDecision};
//!
//! let mut ent = EnterpriseConfig::new(EapMethod::Peap, Phase2Method::Mschapv2);
//! ent.trust_on_first_use = true;
//! let mut network = NetworkConfig::enterprise(1, "\"corp\"", ent);
//!
//! let mut handler = TofuTrustHandler::new(
//!     HandlerConfig::default(),
//!     MemoryNetworkStore::new(),
//!     RecordingSession::default(),
//!     QueuedPrompt::default(),
//!     Vec::<TrustDecision>::new(),
//! );
//! handler.prepare_connection(&mut network);
//! // feed certificates with add_pending_certificate, then:
//! handler.start_user_approval_if_necessary(true);
//! ```

pub mod bundle;
pub mod chain;
pub mod config;
pub mod handler;
pub mod memory;
pub mod prompt;

pub use eaptrust_core::*;

pub use bundle::{load_pem_chain, parse_pem_chain};
pub use chain::{CertChain, ChainEntry};
pub use config::HandlerConfig;
pub use handler::{HandlerState, Preparation, TofuTrustHandler};
pub use memory::{
    MemoryNetworkStore, NativeCall, QueuedPrompt, RecordingSession, ShownPrompt, ShownRequest,
    StoredNetwork, TrustedCa,
};
