use checkly_provider::{init_logging, serve, ChecklyProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Checkly provider");
    serve(ChecklyProvider::new()).await
}
