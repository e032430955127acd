use std::path::PathBuf;

use anyhow::Context;
use mirrorball_corpus::{CorpusStore, refetch::RefetchReason};
use mirrorball_features::TrackKey;
use serde::Serialize;

use crate::{config::PipelineConfig, util::Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AuditLyricsArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RefetchEntry<'a> {
    #[serde(flatten)]
    key: &'a TrackKey,
    reason: RefetchReason,
}

pub(crate) fn run(
    store: &CorpusStore,
    config: &PipelineConfig,
    arg: &AuditLyricsArg,
) -> anyhow::Result<()> {
    let lyrics = store.load_lyrics().context("Failed to load lyrics corpus")?;
    let entries = config
        .refetch
        .audit(&lyrics)
        .into_iter()
        .map(|(key, reason)| RefetchEntry { key, reason })
        .collect::<Vec<_>>();
    eprintln!("{} of {} tracks need lyrics re-fetched", entries.len(), lyrics.len());
    Output::save_json(&entries, arg.output.clone())
}
