//! `hubpilot doctor`: diagnose configuration and connectivity.

use hubpilot_config::AppConfig;
use hubpilot_core::Provider;

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 hubpilot doctor");
    println!("==================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file, using defaults (run `hubpilot init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ Model API key configured ({})", config.model.provider);
    } else {
        println!("  ❌ No model API key: set ANTHROPIC_API_KEY or model.api_key");
        issues += 1;
    }

    if config.search.api_key.is_some() {
        println!("  ✅ Web search configured");
    } else {
        println!("  ⚠️  No PERPLEXITY_API_KEY: web_search will report itself unavailable");
    }

    match hubpilot_agent::open_storage(&config) {
        Ok(_) => {
            println!("  ✅ Storage backend \"{}\" opened", config.storage.backend);
            if config.storage.backend == "file" {
                println!("     data:  {}", config.storage.resolved_data_dir().display());
                println!("     files: {}", config.storage.resolved_blob_dir().display());
            }
            match &config.storage.inventory_file {
                Some(path) => println!("  ✅ Inventory loaded from {}", path.display()),
                None => {
                    println!("  ⚠️  No storage.inventory_file: get_inventory will find nothing");
                }
            }
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    if !offline && config.has_api_key() {
        match hubpilot_providers::build_from_config(&config) {
            Ok(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Model API reachable"),
                Ok(false) => {
                    println!("  ❌ Model API answered but rejected the health check");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Model API unreachable: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
