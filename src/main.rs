#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing; verbosity comes from RUST_LOG
    tracing_subscriber::fmt::init();

    if let Err(e) = calorie_tracker::app::run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
