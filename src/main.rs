use clap::{Parser, Subcommand};
use rtl_collector::commands::check::check_command;
use rtl_collector::commands::collect::{collect_command, CollectOptions};
use rtl_collector::commands::init::init_command;
use rtl_collector::commands::inline::inline_command;
use rtl_collector::commands::status::status_command;
use rtl_collector::config::{Config, DEFAULT_CONFIG_FILE};
use rtl_collector::logging::init_file_logging;
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rtl-collector")]
#[command(about = "Collect standalone synthesizable SystemVerilog modules from git repositories", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default collector.toml and repos.txt in the current directory
    Init,

    /// Clone every listed repository and collect modules that synthesize
    Collect {
        /// Repository list (one owner/name or URL per line)
        #[arg(long)]
        repos: Option<PathBuf>,

        /// Output directory for collected modules
        #[arg(long)]
        output: Option<PathBuf>,

        /// Leave checkouts on disk after analysis
        #[arg(long)]
        keep_clones: bool,

        /// Skip repositories already recorded in the ledger
        #[arg(long)]
        resume: bool,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Run the synthesis check on files and print the top module
    Check {
        /// Files checked together
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write a copy of a file with its `include directives expanded
    Inline {
        file: PathBuf,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show what has been collected so far
    Status {
        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init_command(&env::current_dir()?),
        Commands::Collect {
            repos,
            output,
            keep_clones,
            resume,
            report,
        } => {
            let mut config = Config::load(&cli.config)?;
            if let Some(repos) = repos {
                config.repos_file = repos;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            config.keep_clones |= keep_clones;

            init_file_logging(&config.log_file)?;
            collect_command(config, CollectOptions { resume, report }).await
        }
        Commands::Check { files } => {
            let config = Config::load(&cli.config)?;
            check_command(&config, files).await
        }
        Commands::Inline { file, output } => {
            let config = Config::load(&cli.config)?;
            inline_command(&file, &output.unwrap_or(config.output_dir))
        }
        Commands::Status { output } => {
            let config = Config::load(&cli.config)?;
            status_command(&output.unwrap_or(config.output_dir))
        }
    }
}
