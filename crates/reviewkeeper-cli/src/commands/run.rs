use super::config::load_config;
use super::run_ui::RunUI;
use crate::output::{Output, OutputFormat};
use crate::RunArgs;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use review_harvest_config::{Config, PathManager};
use review_harvest_core::{
    Exporter, PersistenceCoordinator, ReviewPipeline, RunStatus, RunSummary, SqliteConnector,
};
use review_harvest_sources::{ChromiumRenderer, Extractor, FileRenderer, PageRenderer};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub async fn run_once(args: RunArgs, config_file: &Path, output: &Output) -> Result<()> {
    tracing::debug!("Run command started");

    let mut config = load_config(config_file, output)?;
    apply_overrides(&mut config, &args)?;

    let extractor = Extractor::new(&config.selectors, config.parser.max_reviews);
    let wait_selector = extractor.wait_selector().ok_or_else(|| {
        color_eyre::eyre::eyre!("selectors.containers has no valid CSS selector")
    })?;

    let pipeline = build_pipeline(&config, &args, extractor);
    let mut renderer = build_renderer(&config, &args, wait_selector);

    if output.is_human() {
        output.info(format!("Collecting reviews from {}", config.website.url));
    }
    let ui = RunUI::new(output.is_human() && !output.is_quiet());
    let result = pipeline.run(renderer.as_mut(), &config.website.url, &ui).await;
    ui.finish();

    match result {
        Ok(summary) => {
            print_summary(&summary, output);
            Ok(())
        }
        Err(e) => {
            if output.is_human() {
                output.error(format!("Run failed: {}", e));
            } else {
                output.json(&json!({
                    "url": config.website.url,
                    "status": "failed",
                    "timeout": e.is_timeout(),
                    "error": e.to_string(),
                }));
            }
            Err(color_eyre::eyre::eyre!("Review collection failed: {}", e))
        }
    }
}

fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if let Some(url) = &args.url {
        config.website.url = url.clone();
    }
    if let Some(max_reviews) = args.max_reviews {
        config.parser.max_reviews = max_reviews;
    }
    config.validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid run options: {}", e))
}

fn build_pipeline(config: &Config, args: &RunArgs, extractor: Extractor) -> ReviewPipeline {
    let mut pipeline = ReviewPipeline::new(extractor);

    if config.output.enabled && !args.no_export {
        let exporter = Exporter::new(config.output.directory.clone(), config.output.file_prefix.clone());
        tracing::debug!(directory = %exporter.directory().display(), "File export enabled");
        pipeline = pipeline.with_exporter(exporter);
    } else {
        tracing::info!("File export disabled");
    }

    if config.database.enabled && !args.no_db {
        let coordinator = PersistenceCoordinator::new(Arc::new(SqliteConnector::new(config.database.path.clone())));
        tracing::debug!(store = %coordinator.describe(), "Database persistence enabled");
        pipeline = pipeline.with_persistence(coordinator);
    } else {
        tracing::info!("Database persistence disabled");
    }

    pipeline
}

fn build_renderer(config: &Config, args: &RunArgs, wait_selector: String) -> Box<dyn PageRenderer> {
    match &args.html_file {
        Some(path) => Box::new(FileRenderer::new(path.clone())),
        None => Box::new(ChromiumRenderer::new(
            config.browser.clone(),
            wait_selector,
            &PathManager::default(),
        )),
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Completed => "completed",
        RunStatus::Degraded => "degraded",
        RunStatus::Empty => "empty",
    }
}

fn print_summary(summary: &RunSummary, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return;
            }
            println!("{}", summary_table(summary));
            match summary.status {
                RunStatus::Completed => output.success(format!("Collected {} reviews", summary.extracted)),
                RunStatus::Degraded => output.warn("Run finished with errors, see the log for details"),
                RunStatus::Empty => output.warn("No reviews found on the page"),
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => match serde_json::to_value(summary) {
            Ok(value) => output.json(&value),
            Err(e) => output.error(format!("Failed to serialize run summary: {}", e)),
        },
    }
}

fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Run Summary").fg(Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);

    let status_color = match summary.status {
        RunStatus::Completed => Color::Green,
        RunStatus::Degraded | RunStatus::Empty => Color::Yellow,
    };
    table.add_row(vec![Cell::new("Status"), Cell::new(status_label(summary.status)).fg(status_color)]);
    table.add_row(vec![Cell::new("URL"), Cell::new(&summary.url)]);
    table.add_row(vec![Cell::new("Fragments found"), Cell::new(summary.fragments_found)]);
    table.add_row(vec![Cell::new("Reviews produced"), Cell::new(summary.extracted)]);

    if !summary.defaulted.is_empty() {
        let defaulted: Vec<String> = summary
            .defaulted
            .iter()
            .map(|(field, count)| format!("{}: {}", field, count))
            .collect();
        table.add_row(vec![Cell::new("Defaulted fields"), Cell::new(defaulted.join(", "))]);
    }

    if let Some(export) = &summary.export {
        for file in &export.files {
            table.add_row(vec![Cell::new("Exported"), Cell::new(file.display())]);
        }
        for error in &export.errors {
            table.add_row(vec![Cell::new("Export error"), Cell::new(error).fg(Color::Red)]);
        }
    }

    if let Some(outcome) = &summary.persistence {
        table.add_row(vec![Cell::new("Inserted"), Cell::new(outcome.inserted)]);
        table.add_row(vec![Cell::new("Duplicates"), Cell::new(outcome.duplicate)]);
        let errored = Cell::new(outcome.errored);
        table.add_row(vec![
            Cell::new("Errored"),
            if outcome.errored > 0 { errored.fg(Color::Red) } else { errored },
        ]);
    }

    table.add_row(vec![Cell::new("Elapsed"), Cell::new(format!("{:.1}s", summary.elapsed_ms as f64 / 1000.0))]);

    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}
