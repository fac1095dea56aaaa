//! Command handlers for stowage CLI

use crate::wizard::run_init_wizard;
use crate::{BucketAction, ConfigAction, FileAction, GlobalArgs, UploadArgs, UrlAction};
use anyhow::{Context, Result};
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use stowage_core::{
    get_config_path, load_config, validate_config, BucketOptions, ConfigFile, FileHandle,
    FileSearchOptions, FileUploadOptions, SortOrder, StorageClient, MAX_EXPIRATION,
};
use tabled::{Table, Tabled};
use tracing::debug;

/// Handle init command
pub async fn handle_init() -> Result<()> {
    run_init_wizard().await
}

/// Resolve the configuration file and apply command-line overrides
fn resolve_config(global: &GlobalArgs) -> Result<ConfigFile> {
    let mut config = match load_config() {
        Ok(config) => config,
        Err(stowage_core::Error::ConfigNotFound(path)) => {
            let url = global.url.clone().ok_or_else(|| anyhow::anyhow!(
                "No configuration found at {}.\n\
                 Run 'stowage init' or pass --url and --api-key.",
                path.display()
            ))?;
            ConfigFile::new(url, String::new())
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(url) = &global.url {
        config.storage.base_url = url.clone();
    }
    if let Some(key) = &global.api_key {
        config.storage.api_key = key.clone();
    }
    if let Some(endpoint) = &global.endpoint {
        config.storage.endpoint = endpoint.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

fn connect(global: &GlobalArgs) -> Result<(StorageClient, ConfigFile)> {
    let config = resolve_config(global)?;
    debug!(
        base_url = %config.storage.base_url,
        endpoint = %config.storage.endpoint,
        "connecting to storage"
    );
    let client = StorageClient::new(config.client_config())?;
    Ok((client, config))
}

/// Bucket handle for `bucket`, falling back to the configured default
fn file_handle(
    client: &StorageClient,
    config: &ConfigFile,
    bucket: Option<&str>,
) -> Result<FileHandle> {
    let bucket = bucket
        .map(str::to_string)
        .or_else(|| config.defaults.bucket.clone())
        .ok_or_else(|| anyhow::anyhow!(
            "Bucket required (pass --bucket or set defaults.bucket in your configuration)"
        ))?;

    debug!(bucket = %bucket, "using bucket");
    Ok(client.from(bucket))
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Handle config commands
pub async fn handle_config(action: ConfigAction, global: &GlobalArgs) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = resolve_config(global)?;

            println!("Current configuration:");
            println!();
            println!("Storage:");
            println!("  Base URL: {}", config.storage.base_url);
            println!("  Endpoint: {}", config.storage.endpoint);
            println!("  API key: {}", mask_key(&config.storage.api_key));
            println!();
            println!("Defaults:");
            println!(
                "  Bucket: {}",
                config.defaults.bucket.as_deref().unwrap_or("(none)")
            );
            println!("  Signed URL expiration: {}s", config.defaults.expires_in);

            Ok(())
        }
        ConfigAction::Validate => {
            println!("Validating configuration...");

            let (client, _config) = connect(global)?;
            println!("  ✅ Valid configuration format");

            println!("  Testing storage connection...");
            let buckets = client.buckets().list_buckets().await?;

            println!("  ✅ Connection successful ({} buckets visible)", buckets.len());

            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", get_config_path()?.display());
            Ok(())
        }
    }
}

/// Show only the first 8 characters of a key
fn mask_key(key: &str) -> String {
    if key.chars().count() > 8 {
        format!("{}...", key.chars().take(8).collect::<String>())
    } else {
        "********".to_string()
    }
}

/// Handle buckets commands
pub async fn handle_buckets(action: BucketAction, global: &GlobalArgs) -> Result<()> {
    let (client, config) = connect(global)?;
    let admin = client.buckets();

    match action {
        BucketAction::List => {
            println!("Listing buckets...");
            println!();

            let buckets = admin.list_buckets().await?;

            if buckets.is_empty() {
                println!("  No buckets found");
            } else {
                #[derive(Tabled)]
                struct BucketRow {
                    id: String,
                    name: String,
                    public: String,
                    created: String,
                }

                let rows: Vec<BucketRow> = buckets.iter().map(|b| BucketRow {
                    id: b.id.clone(),
                    name: b.name.clone(),
                    public: if b.public { "yes" } else { "no" }.to_string(),
                    created: format_date(&b.created_at),
                }).collect();

                println!("{}", Table::new(rows));
            }

            if let Some(bucket) = &config.defaults.bucket {
                println!();
                println!("Default bucket: {}", bucket);
            }

            Ok(())
        }
        BucketAction::Get { id } => {
            let bucket = admin.get_bucket(&id).await?;

            println!("Bucket '{}':", bucket.id);
            println!("  Name: {}", bucket.name);
            println!("  Owner: {}", if bucket.owner.is_empty() { "-" } else { &bucket.owner });
            println!("  Public: {}", bucket.public);
            println!("  Created: {}", format_date(&bucket.created_at));
            println!("  Updated: {}", format_date(&bucket.updated_at));

            Ok(())
        }
        BucketAction::Create { id, name, public } => {
            println!("Creating bucket '{}'...", id);

            let mut options = BucketOptions::new(&id).public(public);
            if let Some(name) = name {
                options = options.name(name);
            }
            let bucket = admin.create_bucket(&options).await?;

            println!("  ✅ Bucket created: {}", bucket.name);

            Ok(())
        }
        BucketAction::Update { id, name, public } => {
            println!("Updating bucket '{}'...", id);

            let mut options = BucketOptions::new(&id).public(public);
            if let Some(name) = name {
                options = options.name(name);
            }
            let result = admin.update_bucket(&id, &options).await?;

            println!("  ✅ {}", result.message);

            Ok(())
        }
        BucketAction::Empty { id } => {
            println!("⚠️  Warning: deleting every object in bucket '{}'", id);

            let result = admin.empty_bucket(&id).await?;

            println!("  ✅ {}", result.message);

            Ok(())
        }
        BucketAction::Delete { id } => {
            if config.defaults.bucket.as_deref() == Some(id.as_str()) {
                return Err(anyhow::anyhow!(
                    "Cannot delete default bucket '{}'.\n\
                     Change the default bucket in your configuration first.",
                    id
                ));
            }

            println!("⚠️  Warning: you are about to delete bucket '{}'", id);
            println!("  This action is IRREVERSIBLE!");

            admin.delete_bucket(&id).await?;

            println!("  ✅ Bucket deleted: {}", id);

            Ok(())
        }
    }
}

/// Format ISO date string to readable format
fn format_date(iso_date: &str) -> String {
    if iso_date.is_empty() {
        return "-".to_string();
    }
    match chrono::DateTime::parse_from_rfc3339(iso_date) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => iso_date.to_string(),
    }
}

fn upload_options(args: &UploadArgs) -> FileUploadOptions {
    FileUploadOptions {
        cache_control: args.cache_control.clone(),
        content_type: args.content_type.clone(),
        upsert: Some(args.upsert),
    }
}

/// Handle files commands
pub async fn handle_files(action: FileAction, global: &GlobalArgs) -> Result<()> {
    let (client, config) = connect(global)?;

    match action {
        FileAction::Upload(args) | FileAction::Update(args) if !Path::new(&args.file).exists() => {
            Err(anyhow::anyhow!("File not found: {}", args.file))
        }
        FileAction::Upload(args) => {
            let handle = file_handle(&client, &config, args.bucket.as_deref())?;
            let path = Path::new(&args.file);
            let file_size = path.metadata()?.len();

            println!("Uploading {} -> {}/{}...", args.file, handle.bucket_id(), args.key);
            println!("  Size: {}", format_bytes(file_size));

            let pb = spinner("Uploading...".to_string())?;
            let response = handle
                .upload_file(&args.key, path, Some(upload_options(&args)))
                .await;
            pb.finish_and_clear();

            println!("  ✅ Upload complete: {}", response?.key);

            Ok(())
        }
        FileAction::Update(args) => {
            let handle = file_handle(&client, &config, args.bucket.as_deref())?;
            let path = Path::new(&args.file);

            let mut options = upload_options(&args);
            if options.content_type.is_none() {
                options.content_type = Some(mime_for(path));
            }

            println!("Replacing {}/{} with {}...", handle.bucket_id(), args.key, args.file);

            let file = tokio::fs::File::open(path).await?;
            let response = handle.update(&args.key, file, Some(options)).await?;

            println!("  ✅ Update complete: {}", response.key);

            Ok(())
        }
        FileAction::Download { key, dest, bucket } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;

            println!("Downloading {} -> {}...", key, dest);

            match handle.download_to_file(&key, Path::new(&dest)).await {
                Ok(written) => {
                    println!("  ✅ Download complete ({})", format_bytes(written));
                    Ok(())
                }
                Err(stowage_core::Error::NotFound(_)) => {
                    Err(anyhow::anyhow!("Object not found: {}/{}", handle.bucket_id(), key))
                }
                Err(e) => Err(e.into()),
            }
        }
        FileAction::Ls { prefix, bucket, limit, offset, sort, desc } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;
            let prefix = prefix.unwrap_or_default();

            println!("Listing {} (prefix: {:?})...", handle.bucket_id(), prefix);

            let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
            let options = FileSearchOptions::default()
                .limit(limit)
                .offset(offset)
                .sort_by(sort, order);
            let objects = handle.list(&prefix, options).await?;

            if objects.is_empty() {
                println!("  No files found");
            } else {
                #[derive(Tabled)]
                struct ObjectRow {
                    name: String,
                    size: String,
                    updated: String,
                }

                let rows: Vec<ObjectRow> = objects.iter().map(|o| ObjectRow {
                    name: if o.is_folder() { format!("{}/", o.name) } else { o.name.clone() },
                    size: o.size().map(format_bytes).unwrap_or_else(|| "-".to_string()),
                    updated: format_date(o.updated_at.as_deref().unwrap_or_default()),
                }).collect();

                println!();
                println!("{}", Table::new(rows));
            }

            Ok(())
        }
        FileAction::Rm { keys, bucket } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;

            if let [key] = keys.as_slice() {
                println!("Deleting {}...", key);
                handle.remove(key).await?;
                println!("  ✅ File deleted");
                return Ok(());
            }

            println!("Deleting {} objects...", keys.len());
            let response = handle.bulk_remove(&keys).await?;
            if response.is_empty() {
                println!("  ✅ Files deleted");
                Ok(())
            } else {
                Err(anyhow::anyhow!("Bulk delete rejected: {}", response.message))
            }
        }
        FileAction::Mv { from, to, bucket } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;

            println!("Moving {} -> {}...", from, to);
            let response = handle.move_object(&from, &to).await?;
            println!("  ✅ {}", response.message);

            Ok(())
        }
        FileAction::Cp { from, to, bucket } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;

            println!("Copying {} -> {}...", from, to);
            let response = handle.copy(&from, &to).await?;
            println!("  ✅ Copied to {}", response.key);

            Ok(())
        }
        FileAction::Info { key, bucket } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;

            let metadata = handle
                .get_file_metadata(&key)
                .await
                .with_context(|| format!("Failed to read metadata of {}", key))?;

            println!("Object '{}/{}':", handle.bucket_id(), key);
            println!("  Media type: {}", metadata.media_type);

            Ok(())
        }
    }
}

fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// Handle URLs commands
pub async fn handle_urls(action: UrlAction, global: &GlobalArgs) -> Result<()> {
    let (client, config) = connect(global)?;

    match action {
        UrlAction::Public { key, bucket } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;
            println!("{}", handle.get_public_url(&key));
            Ok(())
        }
        UrlAction::SignDownload { key, bucket, expires, output } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;
            let expires = signed_expiry(expires, &config)?;

            println!("Generating signed download URL for {} (expires: {}s)...", key, expires);
            let signed = handle.create_signed_url_for_download(&key, expires).await?;

            print_signed(&key, &signed.signed_url, None, expires, &output);
            Ok(())
        }
        UrlAction::SignUpload { key, bucket, expires, output } => {
            let handle = file_handle(&client, &config, bucket.as_deref())?;
            let expires = signed_expiry(expires, &config)?;

            println!("Generating signed upload URL for {} (expires: {}s)...", key, expires);
            let signed = handle.create_signed_url_for_upload(&key, expires).await?;

            print_signed(&key, &signed.url, Some(&signed.token), expires, &output);
            Ok(())
        }
    }
}

/// `--expires` override or the configured default, within the service's limit
fn signed_expiry(expires: Option<u64>, config: &ConfigFile) -> Result<u64> {
    let expires = expires.unwrap_or(config.defaults.expires_in);
    if expires == 0 || expires > MAX_EXPIRATION {
        return Err(anyhow::anyhow!(
            "Expiration must be between 1 and {} seconds (got {})",
            MAX_EXPIRATION,
            expires
        ));
    }
    Ok(expires)
}

fn expires_at(expires: u64) -> Option<chrono::DateTime<chrono::Utc>> {
    let delta = chrono::TimeDelta::try_seconds(i64::try_from(expires).ok()?)?;
    chrono::Utc::now().checked_add_signed(delta)
}

fn print_signed(key: &str, url: &str, token: Option<&str>, expires: u64, output: &str) {
    match output {
        "json" => {
            println!();
            println!("{}", serde_json::json!({
                "key": key,
                "url": url,
                "token": token,
                "expires_in": expires,
                "expires_at": expires_at(expires)
            }));
        }
        _ => {
            println!();
            println!("  ✅ URL generated:");
            println!("  {}", url);
            if let Some(token) = token {
                println!("  Token: {}", token);
            }
            println!();
            println!("  Expires in: {}s", expires);
        }
    }
}

/// Format bytes to human-readable size
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Handle shell completion generation
pub async fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    use std::io;

    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    generate(clap_shell, cmd, "stowage", &mut io::stdout());

    Ok(())
}
