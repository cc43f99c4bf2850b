use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use oto_core::{HtmlDocument, InitSummary, LoadPhase, ModuleLoader, OtoConfig};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{Site, SiteArgs};

#[derive(Args, Debug)]
pub struct AssembleArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    #[arg(short, long, help = "Page template, relative to the site root")]
    pub template: Option<String>,

    #[arg(short, long, help = "Write the assembled page here instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = "text",
        help = "Summary format (text, json)"
    )]
    pub format: String,

    #[arg(long, help = "Fail when any module could not be loaded or mounted")]
    pub strict: bool,
}

pub async fn handle_assemble_command(args: AssembleArgs, config: &OtoConfig) -> Result<()> {
    let site = Site::resolve(&args.site, config);
    let template_path = args
        .template
        .clone()
        .unwrap_or_else(|| config.loader.template_path.clone());
    let output = args.output.clone().or_else(|| {
        (!config.loader.output_path.is_empty()).then(|| PathBuf::from(&config.loader.output_path))
    });

    debug!(
        source = %site.source,
        manifest = %site.manifest_path,
        template = %template_path,
        output = ?output,
        "Resolved site"
    );

    let fetcher = site.fetcher();
    let manifest = site.load_manifest(fetcher.as_ref()).await?;

    let template = fetcher
        .get(&template_path)
        .await
        .with_context(|| format!("Failed to read template {}", template_path))?;
    if !template.is_success() {
        bail!(
            "Failed to read template {} from {}: {}",
            template_path,
            site.source,
            template.status
        );
    }

    let loader = ModuleLoader::new(manifest, fetcher, HtmlDocument::new(template.body));
    let verbose_phases = args.format == "text";
    loader.on_phase(move |event| {
        if verbose_phases {
            let label = match event.phase {
                LoadPhase::Critical => "Critical modules ready",
                LoadPhase::Complete => "All modules loaded",
            };
            eprintln!(
                "  {} {} ({} ok, {} failed)",
                "→".blue(),
                label,
                event.succeeded,
                event.failed
            );
        }
    });

    let summary = loader.initialize().await;
    let page = loader.into_document().into_string();
    info!(bytes = page.len(), errors = summary.errors.len(), "Page assembled");

    let summary_to_stdout = match &output {
        Some(path) => {
            tokio::fs::write(path, &page)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            true
        }
        None => {
            println!("{}", page);
            false
        }
    };

    let report = render_summary(&summary, &args.format, output.as_ref())?;
    if summary_to_stdout {
        println!("{}", report);
    } else {
        eprintln!("{}", report);
    }

    if !summary.success {
        bail!(
            "{}",
            summary
                .error
                .as_deref()
                .unwrap_or("Module initialization failed")
        );
    }

    if args.strict && !summary.errors.is_empty() {
        bail!("{} module error(s) recorded", summary.errors.len());
    }

    Ok(())
}

fn render_summary(
    summary: &InitSummary,
    format: &str,
    output: Option<&PathBuf>,
) -> Result<String> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(summary)?);
    }

    let mut lines = Vec::new();

    if summary.success {
        lines.push(format!(
            "{} {}",
            "✓".green().bold(),
            "Page assembled".green()
        ));
    } else {
        lines.push(format!(
            "{} {}",
            "✗".red().bold(),
            "Page assembly aborted".red()
        ));
    }

    lines.push(format!(
        "  {:<18} {}",
        "Critical loaded:".bold(),
        summary.critical_count
    ));
    lines.push(format!("  {:<18} {}", "Lazy loaded:".bold(), summary.lazy_count));

    if let Some(path) = output {
        lines.push(format!("  {:<18} {}", "Output:".bold(), path.display()));
    }

    if let Some(error) = &summary.error {
        lines.push(format!("  {:<18} {}", "Error:".bold(), error.red()));
    }

    if !summary.errors.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", "Module errors".yellow().bold()));
        for record in &summary.errors {
            lines.push(format!(
                "    {} {}: {}",
                "!".yellow(),
                record.module.bold(),
                record.error
            ));
        }
    }

    Ok(lines.join("\n"))
}
