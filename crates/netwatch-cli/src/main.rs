//! netwatch - network reachability observatory.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    netwatch_cli::run().await
}
