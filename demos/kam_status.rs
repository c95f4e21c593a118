//! Control-API status example
//!
//! Prints uptime, version, dispatcher groups and registration totals of a
//! running server, with JSON logs and optional OTLP export.
//!
//! Run with: KAMKIT_RPC_URL=http://127.0.0.1:5060/RPC cargo run --example kam_status

use kamkit::core::{codec, ObservabilityConfig};
use kamkit::client::{extract, ClientConfig};
use kamkit::ClientBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;

    let client = ClientBuilder::from_config(config)
        .with_observability(ObservabilityConfig::default().with_log_level("info"))
        .service_name("kam-status")
        .build()?;

    tracing::info!(url = %client.url(), "Querying control API");

    println!("uptime:  {}", client.uptime().await?);
    println!("version: {}", client.version().await?);

    let groups = client.dispatcher_list_by_group().await?;
    println!("dispatcher groups:\n{}", codec::to_pretty_text(&groups)?);

    // One ul.dump feeds several views.
    let dump = client.registrations().await?;
    let totals = extract::registrations_total(&dump)?;
    let aors = extract::registered_aors(&dump)?;
    println!("registrations:\n{}", codec::to_pretty_text(&totals)?);
    println!("registered AoRs: {}", serde_json::to_string(&aors)?);

    kamkit::core::shutdown_observability();
    Ok(())
}
