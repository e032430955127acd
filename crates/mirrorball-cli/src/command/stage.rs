use std::path::PathBuf;

use anyhow::bail;
use mirrorball_corpus::CorpusStore;

use crate::{
    config::PipelineConfig,
    pipeline::{self, ReconstructReport},
    util::Output,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct StageArg {
    /// Write the stage report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run_extract(
    store: &mut CorpusStore,
    config: &PipelineConfig,
    arg: &StageArg,
) -> anyhow::Result<()> {
    let report = pipeline::extract(store, config)?;
    Output::save_json(&report, arg.output.clone())
}

pub(crate) fn run_build_table(
    store: &mut CorpusStore,
    config: &PipelineConfig,
    arg: &StageArg,
) -> anyhow::Result<()> {
    let report = pipeline::build_table(store, config)?;
    Output::save_json(&report, arg.output.clone())
}

pub(crate) fn run_reconstruct(
    store: &mut CorpusStore,
    config: &PipelineConfig,
    arg: &StageArg,
) -> anyhow::Result<()> {
    let report = pipeline::reconstruct(store, config)?;
    Output::save_json(&report, arg.output.clone())?;
    check_failures(&report)
}

pub(crate) fn run_analyze(
    store: &mut CorpusStore,
    config: &PipelineConfig,
    arg: &StageArg,
) -> anyhow::Result<()> {
    let report = pipeline::analyze(store, config)?;
    Output::save_json(&report, arg.output.clone())
}

pub(crate) fn run_all(
    store: &mut CorpusStore,
    config: &PipelineConfig,
    arg: &StageArg,
) -> anyhow::Result<()> {
    let report = pipeline::run(store, config)?;
    Output::save_json(&report, arg.output.clone())?;
    check_failures(&report.reconstruct)
}

fn check_failures(report: &ReconstructReport) -> anyhow::Result<()> {
    if report.failures.is_empty() {
        return Ok(());
    }
    let targets = report
        .failures
        .keys()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    bail!("reconstruction failed for: {targets}");
}
