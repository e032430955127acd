use anyhow::Context;
use mirrorball_analysis::summary::TableSummary;
use mirrorball_corpus::{CorpusStore, result::cluster_summary, schema::RESULTS_TABLE};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SummaryArg {
    /// Number of tracks in the reading-grade ranking
    #[arg(long, default_value_t = 5)]
    top: usize,
}

pub(crate) fn run(store: &CorpusStore, arg: &SummaryArg) -> anyhow::Result<()> {
    let table = store.load_unified().context("Failed to load unified table")?;
    let summary = TableSummary::new(&table, arg.top);

    println!("Tracks: {}", table.len());
    if let Some((key, shift)) = &summary.most_dramatic_bridge {
        println!("Most dramatic bridge: {key} (shift {shift:+.3})");
    }

    println!();
    println!("Highest reading grades:");
    for (rank, (key, grade)) in summary.top_reading_grades.iter().enumerate() {
        println!("  {:2}. {key}: {grade:.1}", rank + 1);
    }

    println!();
    println!("Reading grade by album:");
    for (album, stats) in &summary.reading_grade_by_album {
        println!(
            "  {album}: n={} mean={:.2} median={:.2} std={:.2} range=[{:.1}, {:.1}]",
            stats.count, stats.mean, stats.median, stats.std_dev, stats.min, stats.max
        );
    }

    if !store.has_table(RESULTS_TABLE)? {
        eprintln!("No cluster results yet; run `analyze` first.");
        return Ok(());
    }
    let results = store.load_results().context("Failed to load result table")?;
    let clusters = cluster_summary(&results);
    println!();
    println!("Clusters:");
    for (cluster, size) in &clusters.sizes {
        let drivers = clusters
            .top_drivers
            .get(cluster)
            .map(|counts| {
                let mut counts = counts.iter().collect::<Vec<_>>();
                counts.sort_by(|a, b| b.1.cmp(a.1));
                counts
                    .into_iter()
                    .map(|(driver, n)| format!("{driver} {n}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!("  #{cluster}: {size} tracks; top drivers: {drivers}");
    }
    Ok(())
}
