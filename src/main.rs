use insights_waitlist::configuration::get_configuration;
use insights_waitlist::startup::Application;
use insights_waitlist::telemetry::get_subscriber;
use insights_waitlist::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main] // requires tokio features: macros, rt-multi-thread
async fn main() -> Result<(), anyhow::Error> {
    // `RUST_LOG` overrides the default level
    let subscriber = get_subscriber("insights-waitlist", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    let server = Application::build(cfg).await?;
    server.run_until_stopped().await?;

    Ok(())
}
