mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "wrapped-cli")]
#[command(about = "Extract analytics from a content-performance export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every extractor against an export and print the result as JSON
    Extract {
        /// Path to an .xlsx or .csv export
        path: PathBuf,
        /// Limit output to one section of the bundle
        #[arg(long, value_enum, default_value_t = Section::All)]
        section: Section,
        /// Print single-line JSON instead of pretty-printed output
        #[arg(long)]
        compact: bool,
    },
    /// List the sheet names found in an export
    Sheets {
        /// Path to an .xlsx or .csv export
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    All,
    Discovery,
    TopPosts,
    Demographics,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            path,
            section,
            compact,
        } => {
            let output = extract::run_extract(&path, section, compact)?;
            println!("{output}");
        }
        Commands::Sheets { path } => {
            for name in extract::run_sheets(&path)? {
                println!("{name}");
            }
        }
    }

    Ok(())
}
