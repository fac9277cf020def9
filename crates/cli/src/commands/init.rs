//! `hubpilot init`: first-time setup.

use hubpilot_config::AppConfig;

const SAMPLE_INVENTORY: &str = r#"{
  "demo-hub": [
    {
      "publisherId": "lakeside-gazette",
      "name": "Lakeside Gazette",
      "description": "Weekly community newspaper covering the lake district",
      "website": "https://lakeside-gazette.example",
      "channels": ["print", "website", "newsletter"],
      "geography": "Lake County",
      "audienceSize": 18000,
      "offerings": [
        { "channel": "print", "name": "Half-page color ad", "pricing": "$450 per issue" },
        { "channel": "newsletter", "name": "Sponsored slot", "pricing": "$200 per send" }
      ]
    },
    {
      "publisherId": "metro-radio",
      "name": "Metro 101.5 FM",
      "description": "Regional talk and music radio",
      "channels": ["radio", "podcast"],
      "geography": "Metro area",
      "audienceSize": 52000,
      "offerings": [
        { "channel": "radio", "name": "30s drive-time spot", "pricing": "$120 per spot" }
      ]
    }
  ]
}
"#;

pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let inventory_path = config_dir.join("inventory.json");

    println!("hubpilot setup");
    println!("==============\n");

    if !config_dir.exists() {
        tokio::fs::create_dir_all(&config_dir).await?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !inventory_path.exists() {
        tokio::fs::write(&inventory_path, SAMPLE_INVENTORY).await?;
        println!("✅ Wrote sample inventory for hub \"demo-hub\"");
    }

    if config_path.exists() && !force {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.\n");
        return Ok(());
    }

    let mut config = AppConfig::default();
    config.storage.inventory_file = Some(inventory_path);
    tokio::fs::write(&config_path, toml::to_string_pretty(&config)?).await?;
    println!("✅ Created config.toml at: {}", config_path.display());

    println!("\nNext steps:");
    println!("  1. Set ANTHROPIC_API_KEY (and optionally PERPLEXITY_API_KEY)");
    println!("  2. hubpilot doctor");
    println!("  3. hubpilot chat --tenant demo-hub -m \"What can I advertise on?\"");
    Ok(())
}
