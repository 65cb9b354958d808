//! Run and check commands - reconcile a load order.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tracing::{debug, info};
use waterfix::config::ConfigFile;
use waterfix::index::{MemoryRecordIndex, PluginDirectory, RecordIndex};
use waterfix::load_order::LoadOrder;
use waterfix::patch::OUTPUT_AUTHOR;
use waterfix::reconcile::{ReconcileOutcome, Reconciler};
use waterfix::record::ModKey;
use waterfix::sources::BASE_MASTERS;

use crate::error::CliError;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Whether the output plugin is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Write,
    DryRun,
}

/// Arguments shared by `run` and `check`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory holding the plugin dumps (<name>.json)
    #[arg(long, value_name = "DIR")]
    pub data: PathBuf,

    /// Load order file in plugins.txt format
    #[arg(long, value_name = "FILE")]
    pub plugins: PathBuf,

    /// Output plugin name (default from config)
    #[arg(long, value_name = "NAME")]
    pub output: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Run the reconciliation and print the report.
pub fn run(args: &RunArgs, config: &ConfigFile, mode: RunMode) -> Result<(), CliError> {
    let output = ModKey::from(
        args.output
            .as_deref()
            .unwrap_or(&config.general.output_plugin),
    );

    if !args.data.is_dir() {
        return Err(CliError::DataDirectory(args.data.clone()));
    }
    let directory = PluginDirectory::new(&args.data);
    let previous_output = check_output_target(&directory, &output)?;

    let (index, outcome) = reconcile(&directory, &args.plugins, &output, config)?;

    // A previous output is always replaced, even by an empty layer, so its
    // stale overrides never outlive the truth they were made from.
    if mode == RunMode::Write && (previous_output || !outcome.layer.is_empty()) {
        let plugin = outcome.layer.to_plugin_file(index.load_order());
        let path = directory.write(&plugin)?;
        info!(path = %path.display(), records = outcome.layer.len(), "Wrote output plugin");
    }

    let rendered = match args.format {
        ReportFormat::Text => outcome.report.to_text(),
        ReportFormat::Json => outcome
            .report
            .to_json()
            .map_err(|e| CliError::Report(e.to_string()))?,
    };
    println!("{}", rendered);

    if mode == RunMode::DryRun && !outcome.layer.is_empty() {
        println!();
        println!("Dry run: {} was not written.", output);
    }

    Ok(())
}

/// Make sure writing `output` cannot clobber another plugin.
///
/// Returns whether a dump written by a previous run already exists.
fn check_output_target(directory: &PluginDirectory, output: &ModKey) -> Result<bool, CliError> {
    if !directory.contains(output) {
        return Ok(false);
    }
    let existing = directory.read(output)?;
    if existing.author.as_deref() == Some(OUTPUT_AUTHOR) {
        Ok(true)
    } else {
        Err(CliError::OutputConflict(output.to_string()))
    }
}

/// Dumps present in the data directory that the load order does not use.
fn unlisted_dumps(available: &[ModKey], load_order: &LoadOrder, output: &ModKey) -> Vec<ModKey> {
    available
        .iter()
        .filter(|p| *p != output && !load_order.contains(p))
        .cloned()
        .collect()
}

/// Build the index from disk and run the pass.
///
/// The output plugin is removed from the load order first so a rerun
/// rebuilds the complete layer rather than patching on top of itself.
fn reconcile(
    directory: &PluginDirectory,
    plugins_txt: &Path,
    output: &ModKey,
    config: &ConfigFile,
) -> Result<(MemoryRecordIndex, ReconcileOutcome), CliError> {
    let available = directory.available()?;

    let load_order =
        LoadOrder::read_plugins_txt(plugins_txt, &BASE_MASTERS, |p| available.contains(p))?
            .without(output);
    info!(
        plugins = load_order.len(),
        dumps = available.len(),
        data = %directory.root().display(),
        "Loaded load order"
    );

    let unlisted = unlisted_dumps(&available, &load_order, output);
    if !unlisted.is_empty() {
        let names: Vec<&str> = unlisted.iter().map(ModKey::as_str).collect();
        debug!(plugins = ?names, "Ignoring dumps not active in the load order");
    }

    let index = MemoryRecordIndex::load(directory, load_order);
    let policy = config.source_policy();
    let outcome = Reconciler::new(&index, &policy).run(output.clone())?;

    Ok((index, outcome))
}
