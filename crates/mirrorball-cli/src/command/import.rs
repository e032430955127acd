use std::path::PathBuf;

use anyhow::Context;
use mirrorball_corpus::{CorpusStore, files};
use tracing::info;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ImportLyricsArg {
    /// JSON array of lyrics records
    input: PathBuf,
    /// Replace the stored corpus instead of appending to it
    #[arg(long)]
    replace: bool,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ImportLabelsArg {
    /// JSON array of ground-truth labels
    input: PathBuf,
}

pub(crate) fn run_lyrics(store: &mut CorpusStore, arg: &ImportLyricsArg) -> anyhow::Result<()> {
    let ImportLyricsArg { input, replace } = arg;
    let records = files::read_lyrics(input)
        .with_context(|| format!("Failed to read lyrics file: {}", input.display()))?;
    let written = if *replace {
        store.replace_lyrics(&records)?
    } else {
        store.append_lyrics(&records)?
    };
    info!(rows = written, replace, "imported lyrics");
    Ok(())
}

pub(crate) fn run_labels(store: &mut CorpusStore, arg: &ImportLabelsArg) -> anyhow::Result<()> {
    let labels = files::read_labels(&arg.input)
        .with_context(|| format!("Failed to read labels file: {}", arg.input.display()))?;
    let written = store.replace_labels(&labels)?;
    info!(rows = written, "imported labels");
    Ok(())
}
