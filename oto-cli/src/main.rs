use clap::{Parser, Subcommand};
use colored::Colorize;
use oto_core::{CliErrorDisplay, LoggingConfig, OtoConfig, OtoError};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::{handle_assemble_command, handle_check_command, handle_modules_command, AssembleArgs};
use config::SiteArgs;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "oto")]
#[command(version = VERSION)]
#[command(about = "OTO - assemble web pages from HTML fragment manifests")]
#[command(long_about = r#"
OTO builds a page by loading the HTML fragments listed in a module manifest
and mounting each one into its target element of a page template.

Critical modules load one at a time in ascending order, lazy modules load
concurrently afterwards. A module that fails to load is reported and skipped.

Use 'oto check' to validate a manifest, 'oto modules' to see the load order
and 'oto assemble' to produce the page.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Load every module and write the assembled page")]
    Assemble(AssembleArgs),

    #[command(about = "List modules in load order")]
    Modules {
        #[command(flatten)]
        site: SiteArgs,

        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },

    #[command(about = "Validate a module manifest")]
    Check {
        #[command(flatten)]
        site: SiteArgs,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Version { detailed } = &cli.command {
        print_version(*detailed);
        return ExitCode::SUCCESS;
    }

    let config = OtoConfig::load();
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_logging(cli.verbose, &logging);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            let e = OtoError::from(e);
            e.log();
            eprint!("{}", CliErrorDisplay::new(&e));
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli, config: OtoConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Assemble(args) => handle_assemble_command(args, &config).await,
        Commands::Modules { site, format } => handle_modules_command(site, &format, &config).await,
        Commands::Check { site } => handle_check_command(site, &config).await,
        Commands::Version { detailed } => {
            print_version(detailed);
            Ok(())
        }
    }
}

fn print_version(detailed: bool) {
    if detailed {
        println!("{}", "OTO Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("oto {}", VERSION);
    }
}
