use clap::{Parser, Subcommand};
use image_store::cancel::CancelToken;
use image_store::imaging::Registry;
use image_store::{ImageId, Store, StoreError, config, fetch, output, sniff};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-store")]
#[command(about = "Store user-submitted images as original, feed and thumbnail")]
#[command(long_about = "\
Store user-submitted images as original, feed and thumbnail

Every added image produces three files under the base directory:

  <base>/
  ├── original/<id>.<ext>    # the submitted bytes, untouched
  ├── feed/<id>.webp         # at most 600px wide
  └── thumb/<id>.webp        # at most 100px wide

Stills become lossless WebP. Animated GIF and WebP sources become animated
WebP, with every frame recomposited before resizing.

Run 'image-store gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Base directory holding original/, feed/ and thumb/
    #[arg(long, default_value = "images", global = true)]
    base: PathBuf,

    /// Config file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an image from a file path or http(s) URL
    Add {
        source: String,
        /// Identifier to store under (random UUID when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Detect a file's image format without storing anything
    Check { file: PathBuf },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Add { source, id, json } => {
            let config = config::load_config(cli.config.as_deref())?;
            init_thread_pool(&config.processing);

            let id = match id {
                Some(id) => ImageId::new(id)?,
                None => ImageId::generate(),
            };
            let store = Store::open(&cli.base, Registry::standard(), config.renditions)?;
            let cancel = CancelToken::new();

            let outcome = if fetch::is_remote(&source) {
                let body = fetch::open(&source, &config.fetch, &cancel).map_err(StoreError::from)?;
                store.add_cancellable(&id, body, &cancel)?
            } else {
                let file = File::open(&source)
                    .map_err(|e| StoreError::SourceFetch(format!("{source}: {e}")))?;
                store.add_cancellable(&id, BufReader::new(file), &cancel)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                output::print_add_outcome(&outcome);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Check { file } => {
            let (format, _) = sniff::probe(File::open(&file)?)?;
            println!("{}", output::format_check(&file, format));
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than cores; the config can only lower the count.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
