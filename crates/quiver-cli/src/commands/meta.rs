use anyhow::{Context, Result};
use quiver_client::{Client, Config};

/// Check the connection and report what the service offers.
pub async fn show_meta(client: &Client, config: &Config) -> Result<()> {
    println!("Connecting to {}", config.service_url);

    let ready = client
        .is_ready()
        .await
        .with_context(|| format!("Could not reach {}", config.service_url))?;
    println!("Ready: {}", if ready { "yes" } else { "no" });

    let meta = client.meta().await.context("Failed to read server metadata")?;

    println!("\nServer:");
    println!("  version: {}", meta.version);
    println!("  hostname: {}", meta.hostname);
    if let Some(size) = meta.grpc_max_message_size {
        println!("  max message size: {size} bytes");
    }

    println!("\nModules:");
    if meta.modules.is_empty() {
        println!("  (none)");
    }
    for (name, info) in &meta.modules {
        println!("  [OK] {name}");
        if let Some(href) = &info.documentation_href {
            println!("       docs: {href}");
        }
    }

    if meta.has_module(&config.vectorizer_module) {
        println!("\n✓ Vectorizer module {} is enabled", config.vectorizer_module);
        println!("  model: {}", config.vectorizer_model);
        println!("  endpoint: {}", config.vectorizer_endpoint);
    } else {
        log::warn!(
            "Vectorizer module {} is not enabled on the service",
            config.vectorizer_module
        );
        println!(
            "\n✗ Vectorizer module {} is not enabled; similarity search will fail",
            config.vectorizer_module
        );
    }

    Ok(())
}
