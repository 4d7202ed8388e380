use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vireo_cli::{RenderRequest, parse_assignment, parse_data};

#[derive(Parser)]
#[command(name = "vireo", version, about = "Render reactive templates")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a template against JSON data and print the rendered HTML.
    Render {
        /// Path to an HTML template
        template: PathBuf,
        /// JSON file holding the instance data (an object)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Mount selector (#id, .class or tag); defaults to the first element
        #[arg(long)]
        el: Option<String>,
        /// Mutation applied after mounting, PATH=JSON; repeatable
        #[arg(long = "set", value_name = "PATH=JSON")]
        sets: Vec<String>,
    },
    /// Parse and compile a template, listing its placeholders.
    Check {
        /// Path to an HTML template
        template: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Render { template, data, el, sets } => {
            let markup = fs::read_to_string(&template)
                .with_context(|| format!("failed to read {}", template.display()))?;
            let data = match data {
                Some(path) => {
                    let json = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    parse_data(&json).with_context(|| format!("in {}", path.display()))?
                }
                None => Default::default(),
            };
            let sets = sets.iter().map(|s| parse_assignment(s)).collect::<Result<Vec<_>>>()?;
            let labels: Vec<String> = sets.iter().map(|a| a.path.clone()).collect();
            let snapshots = vireo_cli::render(RenderRequest { markup, data, el, sets })?;
            for (i, html) in snapshots.iter().enumerate() {
                if i > 0 {
                    println!("--- set {}", labels[i - 1]);
                }
                println!("{html}");
            }
        }
        Commands::Check { template } => {
            let markup = fs::read_to_string(&template)
                .with_context(|| format!("failed to read {}", template.display()))?;
            for expr in vireo_cli::check(&markup)? {
                println!("{expr}");
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
