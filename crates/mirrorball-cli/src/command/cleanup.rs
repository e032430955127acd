use mirrorball_corpus::CorpusStore;

use crate::config::PipelineConfig;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CleanupArg {
    /// Additional tables to keep
    #[arg(long)]
    keep: Vec<String>,
}

pub(crate) fn run(
    store: &mut CorpusStore,
    config: &PipelineConfig,
    arg: &CleanupArg,
) -> anyhow::Result<()> {
    let keep = config
        .keep_tables
        .iter()
        .chain(&arg.keep)
        .map(String::as_str)
        .collect::<Vec<_>>();
    let dropped = store.cleanup(&keep)?;
    if dropped.is_empty() {
        eprintln!("No intermediate tables to drop.");
    } else {
        eprintln!("Dropped {} tables: {}", dropped.len(), dropped.join(", "));
    }
    eprintln!("Remaining tables: {}", store.table_names()?.join(", "));
    Ok(())
}
