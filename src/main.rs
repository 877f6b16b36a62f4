use dotenv::dotenv;
use tracing::{info, warn};

use kerf_backend::app::app::App;
use kerf_backend::util::logger::Logger;

#[tokio::main]
async fn main() {
    // File + console logging; the guards must stay alive for the whole run
    let _logger = Logger::new().expect("Failed to initialize logging");

    info!("🚀 Starting Kerf Backend Application");

    // Load environment variables from .env file
    match dotenv() {
        Ok(_) => info!("✅ Successfully loaded .env file"),
        Err(e) => warn!("⚠️ Failed to load .env file: {} (using system env vars)", e),
    }

    let app = App::new().await;
    app.start().await;
}
