use anyhow::Result;
use clap::{CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// stowage - command-line client for bucket and object storage
#[derive(Parser, Debug)]
#[command(name = "stowage")]
#[command(version)]
#[command(about = "Manage storage buckets and objects from your terminal", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

/// Connection overrides, applied on top of the configuration file
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Project base URL
    #[arg(long, global = true, env = "STOWAGE_URL")]
    pub url: Option<String>,

    /// API key sent as bearer token
    #[arg(long, global = true, env = "STOWAGE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Storage API path below the base URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Initial setup (interactive wizard)
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Bucket management
    Buckets {
        #[command(subcommand)]
        action: BucketAction,
    },

    /// Object management
    Files {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Public and signed URLs
    Urls {
        #[command(subcommand)]
        action: UrlAction,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Validate the configuration and test the connection
    Validate,
    /// Print the configuration file path
    Path,
}

#[derive(clap::Subcommand, Debug)]
pub enum BucketAction {
    /// List buckets
    List,
    /// Show one bucket
    Get { id: String },
    /// Create a bucket
    Create {
        id: String,
        /// Display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,
        /// Make objects readable without credentials
        #[arg(long)]
        public: bool,
    },
    /// Update a bucket's name or visibility
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// Delete every object in a bucket
    Empty { id: String },
    /// Delete a bucket (it must be empty)
    Delete { id: String },
}

#[derive(clap::Args, Debug, Clone)]
pub struct UploadArgs {
    /// Local file to upload
    pub file: String,
    /// Object key (destination)
    pub key: String,
    /// Target bucket (uses the default bucket when omitted)
    #[arg(short, long)]
    pub bucket: Option<String>,
    /// Content type (guessed from the file extension when omitted)
    #[arg(long)]
    pub content_type: Option<String>,
    /// Cache-Control max-age in seconds
    #[arg(long)]
    pub cache_control: Option<String>,
    /// Overwrite an existing object
    #[arg(long)]
    pub upsert: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum FileAction {
    /// Upload a file
    Upload(UploadArgs),
    /// Replace an existing object
    Update(UploadArgs),
    /// Download an object
    Download {
        /// Object key
        key: String,
        /// Local destination
        dest: String,
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// List objects
    Ls {
        /// Prefix to filter on
        prefix: Option<String>,
        #[arg(short, long)]
        bucket: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Column to sort on
        #[arg(long, default_value = "name")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Delete one or more objects
    Rm {
        #[arg(required = true)]
        keys: Vec<String>,
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Move an object
    Mv {
        from: String,
        to: String,
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Copy an object
    Cp {
        from: String,
        to: String,
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Show object metadata
    Info {
        key: String,
        #[arg(short, long)]
        bucket: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum UrlAction {
    /// Public URL of an object in a public bucket
    Public {
        key: String,
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Signed download URL
    SignDownload {
        key: String,
        #[arg(short, long)]
        bucket: Option<String>,
        /// Expiration in seconds (default from configuration)
        #[arg(short, long)]
        expires: Option<u64>,
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Signed upload URL
    SignUpload {
        key: String,
        #[arg(short, long)]
        bucket: Option<String>,
        #[arg(short, long)]
        expires: Option<u64>,
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

fn init_logging() {
    let configured = stowage_core::load_config()
        .ok()
        .and_then(|c| c.logging)
        .map(|l| l.level);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(configured.as_deref().unwrap_or("warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Init => handlers::handle_init().await,
        Commands::Config { action } => handlers::handle_config(action, &cli.global).await,
        Commands::Buckets { action } => handlers::handle_buckets(action, &cli.global).await,
        Commands::Files { action } => handlers::handle_files(action, &cli.global).await,
        Commands::Urls { action } => handlers::handle_urls(action, &cli.global).await,
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command()).await
        }
    }
}
