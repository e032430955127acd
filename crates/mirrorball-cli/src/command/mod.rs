use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mirrorball_corpus::CorpusStore;

use crate::config::PipelineConfig;

use self::{
    audit_lyrics::AuditLyricsArg,
    cleanup::CleanupArg,
    export::ExportArg,
    import::{ImportLabelsArg, ImportLyricsArg},
    stage::StageArg,
    summary::SummaryArg,
};

mod audit_lyrics;
mod cleanup;
mod export;
mod import;
mod stage;
mod summary;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Pipeline stage or maintenance task to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, clap::Args)]
struct CommonArgs {
    /// Pipeline configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database, overriding the configuration
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    /// Random seed for every seeded stage, overriding the configuration
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Extract text features from the lyrics corpus
    Extract(#[clap(flatten)] StageArg),
    /// Join lyrics, features and labels into the unified table
    BuildTable(#[clap(flatten)] StageArg),
    /// Predict missing energy and valence values
    Reconstruct(#[clap(flatten)] StageArg),
    /// Cluster, embed and explain the fully labeled table
    Analyze(#[clap(flatten)] StageArg),
    /// Run every stage in order
    Run(#[clap(flatten)] StageArg),
    /// Load lyrics from a JSON file
    ImportLyrics(#[clap(flatten)] ImportLyricsArg),
    /// Load ground-truth labels from a JSON file
    ImportLabels(#[clap(flatten)] ImportLabelsArg),
    /// Export the result table as JSON
    Export(#[clap(flatten)] ExportArg),
    /// Print stylometric and cluster highlights
    Summary(#[clap(flatten)] SummaryArg),
    /// List tracks whose lyrics should be fetched again
    AuditLyrics(#[clap(flatten)] AuditLyricsArg),
    /// Drop tables the pipeline does not use
    Cleanup(#[clap(flatten)] CleanupArg),
}

pub fn run() -> anyhow::Result<()> {
    let CommandArgs { common, mode } = CommandArgs::parse();
    let config = PipelineConfig::load(common.config.as_deref())?
        .with_overrides(common.database, common.seed);
    let mut store = CorpusStore::open(&config.database)
        .with_context(|| format!("Failed to open database: {}", config.database.display()))?;

    match mode {
        Mode::Extract(arg) => stage::run_extract(&mut store, &config, &arg)?,
        Mode::BuildTable(arg) => stage::run_build_table(&mut store, &config, &arg)?,
        Mode::Reconstruct(arg) => stage::run_reconstruct(&mut store, &config, &arg)?,
        Mode::Analyze(arg) => stage::run_analyze(&mut store, &config, &arg)?,
        Mode::Run(arg) => stage::run_all(&mut store, &config, &arg)?,
        Mode::ImportLyrics(arg) => import::run_lyrics(&mut store, &arg)?,
        Mode::ImportLabels(arg) => import::run_labels(&mut store, &arg)?,
        Mode::Export(arg) => export::run(&store, &arg)?,
        Mode::Summary(arg) => summary::run(&store, &arg)?,
        Mode::AuditLyrics(arg) => audit_lyrics::run(&store, &config, &arg)?,
        Mode::Cleanup(arg) => cleanup::run(&mut store, &config, &arg)?,
    }
    Ok(())
}
