use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use oto_core::{ModuleManifest, OtoConfig, Priority};

use crate::config::{Site, SiteArgs};

pub async fn handle_modules_command(args: SiteArgs, format: &str, config: &OtoConfig) -> Result<()> {
    let site = Site::resolve(&args, config);
    let fetcher = site.fetcher();
    let manifest = site.load_manifest(fetcher.as_ref()).await?;

    if format == "json" {
        let ordered: Vec<_> = manifest.load_order();
        println!("{}", serde_json::to_string_pretty(&ordered)?);
        return Ok(());
    }

    if manifest.is_empty() {
        println!("{}", "No modules configured.".yellow());
        return Ok(());
    }

    println!("{}", "Modules".cyan().bold());
    println!("Manifest: {} ({})", site.manifest_path.yellow(), site.source);
    println!("{}", "═".repeat(60).dimmed());
    println!();

    println!("{}", build_table(&manifest));
    println!();
    println!(
        "  Total: {} modules ({} critical, {} lazy)",
        manifest.len(),
        manifest.critical_modules().len(),
        manifest.lazy_modules().len()
    );

    Ok(())
}

fn build_table(manifest: &ModuleManifest) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(comfy_table::Color::Cyan),
            Cell::new("Name").fg(comfy_table::Color::Cyan),
            Cell::new("Priority").fg(comfy_table::Color::Cyan),
            Cell::new("Order").fg(comfy_table::Color::Cyan),
            Cell::new("Path").fg(comfy_table::Color::Cyan),
            Cell::new("Target").fg(comfy_table::Color::Cyan),
        ]);

    for (index, module) in manifest.load_order().into_iter().enumerate() {
        let priority = match module.priority {
            Priority::Critical => Cell::new("critical").fg(comfy_table::Color::Red),
            Priority::Lazy => Cell::new("lazy").fg(comfy_table::Color::DarkGrey),
        };
        let order = module
            .order
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&module.name),
            priority,
            Cell::new(order),
            Cell::new(&module.path),
            Cell::new(&module.target),
        ]);
    }

    table
}
