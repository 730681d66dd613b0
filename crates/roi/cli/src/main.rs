// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! ROI CLI Tool
//!
//! Command-line interface over report JSON files: diff versions, capture and restore
//! snapshots, apply templates, and compute metrics, recommendations and export documents.
//! Results go to stdout as JSON; logs go to stderr.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use roi_core::{
    ApplyContext, DocumentFormat, MergeStrategy, MetricSelection, MetricsAggregator, RecommendationEngine, Report, ReportDocument, RestoreOptions, ServiceConfig, Template,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "roi")]
#[command(about = "Warehouse ROI report versioning and metrics")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two versions of a report ("current" selects the live sections)
    Diff {
        /// Report JSON file
        report: PathBuf,
        /// Version to compare from
        from: String,
        /// Version to compare to
        #[arg(default_value = "current")]
        to: String,
    },
    /// Capture the live sections as a new version
    Snapshot {
        /// Report JSON file
        report: PathBuf,
        /// Version name
        name: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
        /// Author recorded on the version
        #[arg(long, default_value = "cli")]
        author: String,
        /// Write the updated report here instead of overwriting the input
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Restore a stored version into the live sections
    Restore {
        /// Report JSON file
        report: PathBuf,
        /// Version id to restore
        version: String,
        /// Skip the automatic backup of the live sections
        #[arg(long)]
        no_backup: bool,
        /// Actor recorded on the backup (defaults to ROI_SYSTEM_ACTOR)
        #[arg(long)]
        author: Option<String>,
        /// Write the updated report here instead of overwriting the input
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Apply a template to a report
    ApplyTemplate {
        /// Report JSON file
        report: PathBuf,
        /// Template JSON file
        template: PathBuf,
        /// replace, append or merge
        #[arg(long, default_value = "merge")]
        strategy: String,
        /// Actor stamped on new and merged sections
        #[arg(long, default_value = "cli")]
        author: String,
        /// Write the updated report here instead of overwriting the input
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Compute metrics for one report
    Metrics {
        /// Report JSON file
        report: PathBuf,
        /// Comma-separated categories: roi, operational, financial, engagement or all
        #[arg(long, default_value = "all")]
        types: String,
    },
    /// Aggregate metrics across several reports
    Aggregate {
        /// Report JSON files
        #[arg(required = true)]
        reports: Vec<PathBuf>,
        /// Comma-separated categories: roi, operational, financial, engagement or all
        #[arg(long, default_value = "all")]
        types: String,
    },
    /// Generate recommendations for a report
    Recommend {
        /// Report JSON file
        report: PathBuf,
    },
    /// Build the export document consumed by PDF/DOCX renderers
    Export {
        /// Report JSON file
        report: PathBuf,
        /// pdf or docx
        #[arg(long, default_value = "pdf")]
        format: String,
        /// Recorded as the generator of the document
        #[arg(long, default_value = "cli")]
        author: String,
    },
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = ServiceConfig::from_env();

    if let Err(e) = run(cli.command, &config) {
        error!("Command failed: {:#}", e);
        process::exit(1);
    }
}

fn run(command: Commands, config: &ServiceConfig) -> anyhow::Result<()> {
    match command {
        Commands::Diff { report, from, to } => handle_diff(&report, &from, &to),
        Commands::Snapshot { report, name, description, author, output } => handle_snapshot(&report, &name, description, &author, output.as_deref(), config),
        Commands::Restore { report, version, no_backup, author, output } => {
            let author = author.unwrap_or_else(|| config.system_actor.clone());
            handle_restore(&report, &version, no_backup, &author, output.as_deref(), config)
        }
        Commands::ApplyTemplate { report, template, strategy, author, output } => handle_apply_template(&report, &template, &strategy, &author, output.as_deref()),
        Commands::Metrics { report, types } => handle_metrics(&report, &types),
        Commands::Aggregate { reports, types } => handle_aggregate(&reports, &types),
        Commands::Recommend { report } => handle_recommend(&report),
        Commands::Export { report, format, author } => handle_export(&report, &format, &author),
    }
}

fn handle_diff(path: &Path, from: &str, to: &str) -> anyhow::Result<()> {
    let report = read_report(path)?;
    let diff = report.compare_versions(from, to)?;
    info!("Compared {} -> {}: {} change(s)", from, to, diff.change_count());
    print_json(&diff)
}

fn handle_snapshot(path: &Path, name: &str, description: Option<String>, author: &str, output: Option<&Path>, config: &ServiceConfig) -> anyhow::Result<()> {
    let mut report = read_report(path)?;
    let summary = report.create_version(name, description, author, Utc::now(), &config.history())?.summary();
    write_report(output.unwrap_or(path), &report)?;
    info!("Captured version {} ({})", summary.name, summary.id);
    print_json(&summary)
}

fn handle_restore(path: &Path, version: &str, no_backup: bool, author: &str, output: Option<&Path>, config: &ServiceConfig) -> anyhow::Result<()> {
    let mut report = read_report(path)?;
    let options = RestoreOptions {
        auto_backup: config.auto_backup_on_restore && !no_backup,
        actor: author.to_string(),
    };
    let outcome = report.restore_version(version, &options, Utc::now(), &config.history())?;
    write_report(output.unwrap_or(path), &report)?;
    info!("Restored version {}", outcome.restored.name);
    print_json(&outcome)
}

fn handle_apply_template(path: &Path, template_path: &Path, strategy: &str, author: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let strategy = strategy.parse::<MergeStrategy>()?;
    let mut report = read_report(path)?;
    let template: Template = read_json(template_path)?;
    template.validate()?;

    report.apply_template(&template, strategy, &ApplyContext::new(author, Utc::now()))?;
    write_report(output.unwrap_or(path), &report)?;
    info!("Applied template {} with strategy {}", template.id, strategy);
    print_json(&report.sections())
}

fn handle_metrics(path: &Path, types: &str) -> anyhow::Result<()> {
    let report = read_report(path)?;
    let selection = MetricSelection::parse_csv(types)?;
    print_json(&report.metrics(&selection))
}

fn handle_aggregate(paths: &[PathBuf], types: &str) -> anyhow::Result<()> {
    let selection = MetricSelection::parse_csv(types)?;
    let reports = paths.iter().map(|path| read_report(path)).collect::<anyhow::Result<Vec<_>>>()?;
    info!("Aggregating {} report(s)", reports.len());
    print_json(&MetricsAggregator::aggregate_metrics(&reports, &selection))
}

fn handle_recommend(path: &Path) -> anyhow::Result<()> {
    let report = read_report(path)?;
    let recommendations = RecommendationEngine::with_default_rules().generate(&report.metrics(&MetricSelection::all()));
    print_json(&recommendations)
}

fn handle_export(path: &Path, format: &str, author: &str) -> anyhow::Result<()> {
    let format = format.parse::<DocumentFormat>()?;
    let report = read_report(path)?;
    let document = ReportDocument::build(&report, format, author, Utc::now(), &RecommendationEngine::with_default_rules());
    info!("Built {} document {}", format, document.file_name);
    print_json(&document)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_report(path: &Path) -> anyhow::Result<Report> {
    read_json(path)
}

fn write_report(path: &Path, report: &Report) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
