//! `hubpilot serve`: start the HTTP gateway.

use hubpilot_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;
    if let Some(p) = port {
        config.gateway.port = p;
    }

    println!(
        "Starting hubpilot gateway on {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("  POST /v1/chat   run one assistant turn");
    println!("  GET  /v1/tools  tool catalog");
    println!("  GET  /health    health check\n");

    hubpilot_gateway::start(config).await?;
    Ok(())
}
