//! Types shared between the trust handler and its hosts.

mod certificate;
mod decision;
mod network;
mod prompt;
mod subject;

pub use certificate::*;
pub use decision::*;
pub use network::*;
pub use prompt::*;
pub use subject::*;
