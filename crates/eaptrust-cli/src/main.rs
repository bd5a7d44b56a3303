//! eaptrust - drive the trust-on-first-use handler from a terminal.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    eaptrust_cli::run().await
}
