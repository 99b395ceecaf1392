use chronocal::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting chronocal");

    // Load configuration
    let config = startup::load_config()?;

    // Run the calendar until quit or a termination signal
    startup::start_app(config).await
}
