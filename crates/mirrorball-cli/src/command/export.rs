use std::path::PathBuf;

use anyhow::Context;
use mirrorball_corpus::{CorpusStore, files::ResultExport};

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ExportArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(store: &CorpusStore, arg: &ExportArg) -> anyhow::Result<()> {
    let results = store.load_results().context("Failed to load result table")?;
    Output::save_json(&ResultExport::new(&results), arg.output.clone())
}
