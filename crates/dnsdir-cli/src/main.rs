//! dnsdir - public DNS resolver list generator

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dnsdir_cli::run().await
}
