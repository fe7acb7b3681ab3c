mod extract;
mod sink;
mod webdriver;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pdpx")]
#[command(about = "Extract every product variant from product detail pages into a catalog import file")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Visit every URL in a targets file and write the import CSV
    Run {
        /// YAML file listing `targets: [{ url, extra_tags }]`
        #[arg(long)]
        targets: PathBuf,
        /// Use this site configuration for every URL instead of matching by host
        #[arg(long)]
        site: Option<String>,
        /// Output directory (defaults to `PDPX_OUTPUT_DIR`)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the resolved site for each target without starting a browser
        #[arg(long)]
        dry_run: bool,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = pdpx_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Run {
            targets,
            site,
            output,
            dry_run,
            headed,
        }) => {
            extract::run_extract(
                &config,
                &extract::RunOptions {
                    targets_path: targets,
                    forced_site: site,
                    output_dir: output,
                    dry_run,
                    headed,
                },
            )
            .await?;
        }
        None => println!("pdpx: nothing to do, try `pdpx run --targets <file>`"),
    }

    Ok(())
}
