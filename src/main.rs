//! HackerHire Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hackerhire_backend::run().await
}
