use clap::{ArgAction, Parser, Subcommand};
use commands::{catalog, clear, config, import, status, template, upload, validate};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "review-import")]
#[command(about = "Import product reviews from CSV exports into the store")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Use this config file instead of the one in the config directory
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a CSV file and open an import session for it
    #[command(long_about = "Copy a CSV file into the upload directory, check its structure and open an import session. Prints the upload id to pass to 'import' or 'run --upload-id'.")]
    Upload {
        /// CSV file to upload
        file: PathBuf,
    },

    /// Import a single chunk of an uploaded file
    #[command(long_about = "Import one chunk of rows starting at the given offset. Pass the 'processed' count of the previous chunk as the next offset; once no rows remain the upload is finalized and its session removed.")]
    Import {
        /// Upload id returned by 'upload'
        upload_id: String,

        /// Number of data rows already processed
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Upload (or resume) and import a whole file, chunk by chunk
    #[command(long_about = "Run a complete import with a progress bar. Ctrl-C stops after the current chunk and prints the offset to resume from.")]
    Run {
        /// CSV file to upload and import
        #[arg(required_unless_present = "upload_id")]
        file: Option<PathBuf>,

        /// Resume an existing upload instead of uploading a file
        #[arg(long, conflicts_with = "file")]
        upload_id: Option<String>,

        /// Offset to resume from (with --upload-id)
        #[arg(long, default_value_t = 0, requires = "upload_id")]
        offset: usize,

        /// Give up waiting for a single chunk after this many seconds
        #[arg(long, value_name = "SECONDS")]
        chunk_timeout: Option<u64>,
    },

    /// Show the state of an upload session
    Status {
        upload_id: String,
    },

    /// Check a CSV file's structure without uploading it
    Validate {
        file: PathBuf,
    },

    /// Print the supported columns and a sample CSV file
    Template {
        /// Write the sample CSV to this file instead of printing it
        #[arg(long, value_name = "FILE")]
        write: Option<PathBuf>,
    },

    /// Manage the local product catalog and inspect imported reviews
    Catalog {
        #[command(subcommand)]
        cmd: CatalogCommands,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },

    /// Remove expired upload sessions and stale upload files
    #[command(long_about = "Remove expired upload sessions and upload files older than the session lifetime. With --all, every session and upload file is removed, including imports still in progress.")]
    Clear {
        /// Also remove sessions and uploads that have not expired
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Add a product; with --parent it becomes a variant of that product
    Add {
        sku: String,

        name: String,

        /// SKU of the parent product
        #[arg(long, value_name = "SKU")]
        parent: Option<String>,
    },

    /// List products
    Products,

    /// List reviews, optionally for one product
    Reviews {
        /// Only reviews attached to this SKU (variants resolve to their parent)
        #[arg(long)]
        sku: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let workspace = commands::Workspace::load(cli.config.clone())?;

    logging::init_logging(cli.verbose, cli.quiet, &workspace.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Upload { file } => upload::run_upload(&workspace, &file, &output).await,
        Commands::Import { upload_id, offset } => import::run_import(&workspace, &upload_id, offset, &output).await,
        Commands::Run {
            file,
            upload_id,
            offset,
            chunk_timeout,
        } => {
            let start = match (file, upload_id) {
                (_, Some(upload_id)) => import::RunStart::Resume { upload_id, offset },
                (Some(file), None) => import::RunStart::Upload(file),
                (None, None) => return Err(color_eyre::eyre::eyre!("Either a file or --upload-id is required")),
            };
            import::run_full_import(&workspace, start, chunk_timeout, &output).await
        }
        Commands::Status { upload_id } => status::run_status(&workspace, &upload_id, &output).await,
        Commands::Validate { file } => validate::run_validate(&file, &output).await,
        Commands::Template { write } => template::run_template(write, &output).await,
        Commands::Catalog { cmd } => catalog::run_catalog(&workspace, cmd, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show);
            config::run_config(&workspace, cmd, &output).await
        }
        Commands::Clear { all } => clear::run_clear(&workspace, all, &output).await,
    }
}
