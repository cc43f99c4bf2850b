use anyhow::{bail, Result};
use colored::Colorize;
use oto_core::OtoConfig;

use crate::config::{Site, SiteArgs};

pub async fn handle_check_command(args: SiteArgs, config: &OtoConfig) -> Result<()> {
    let site = Site::resolve(&args, config);
    let fetcher = site.fetcher();
    let manifest = site.load_manifest(fetcher.as_ref()).await?;

    println!(
        "{} {}",
        "Checking".cyan().bold(),
        site.manifest_path.yellow()
    );

    let problems = manifest.problems();
    if problems.is_empty() {
        println!(
            "{} {} modules, {} critical, {} lazy",
            "✓".green().bold(),
            manifest.len(),
            manifest.critical_modules().len(),
            manifest.lazy_modules().len()
        );
        return Ok(());
    }

    for problem in &problems {
        println!("  {} {}", "✗".red().bold(), problem);
    }

    bail!("Manifest has {} problem(s)", problems.len())
}
