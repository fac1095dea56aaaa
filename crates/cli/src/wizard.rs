//! Interactive setup wizard for stowage configuration

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use stowage_core::{get_config_path, save_config, validate_config, ConfigFile};

/// Run the interactive setup wizard
pub async fn run_init_wizard() -> Result<()> {
    println!("🚀 Welcome to stowage setup!\n");

    println!("This wizard will guide you through the configuration process.");
    println!("You will need:");
    println!("  1. Your project URL");
    println!("  2. An API key allowed to use the storage API");
    println!("  3. Optionally, a default bucket\n");

    let base_url = prompt_base_url()?;
    let api_key = prompt_api_key()?;
    let default_bucket = prompt_bucket_name()?;

    let mut config = ConfigFile::new(base_url, api_key);
    config.defaults.bucket = default_bucket;
    validate_config(&config)?;

    // Summary
    println!("\n📋 Configuration summary:");
    println!("  Base URL: {}", config.storage.base_url);
    println!("  Storage endpoint: {}", config.storage.endpoint);
    println!(
        "  Bucket: {}",
        config.defaults.bucket.as_deref().unwrap_or("(none)")
    );

    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(false)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Saving configuration...");

    save_config(&config)?;

    pb.inc(1);
    pb.finish_with_message("✅ Configuration saved!");

    println!("\n🎉 Setup complete!");
    println!("\nConfiguration saved to: {}", get_config_path()?.display());
    println!("\nYou can now use stowage:");
    println!("  $ stowage buckets list");
    println!("  $ stowage files upload file.txt path/to/file.txt");
    println!("  $ stowage config validate");

    Ok(())
}

/// Prompt for the project URL
fn prompt_base_url() -> Result<String> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Project URL")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Err("URL cannot be empty")
            } else if !input.starts_with("http://") && !input.starts_with("https://") {
                Err("URL must start with http:// or https://")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get project URL: {}", e))
}

/// Prompt for the API key
fn prompt_api_key() -> Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Err("API key cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get API key: {}", e))
}

/// Prompt for an optional default bucket
fn prompt_bucket_name() -> Result<Option<String>> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Default bucket (leave empty for none)")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Ok(())
            } else if input.len() > 63 {
                Err("Bucket name must be less than 64 characters")
            } else if input.contains('/') {
                Err("Bucket name cannot contain '/'")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get bucket name: {}", e))?;

    Ok(if name.is_empty() { None } else { Some(name) })
}
