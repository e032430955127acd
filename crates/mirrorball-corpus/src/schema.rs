//! Table names and column layouts.
//!
//! Every table this crate writes is dropped and recreated on each write, so
//! the layouts here are the only schema there is.

use mirrorball_analysis::Target;
use mirrorball_features::{FeatureFamily, FeatureKind};

pub const LYRICS_TABLE: &str = "dim_lyrics";
pub const LABELS_TABLE: &str = "legacy_tracks";
pub const UNIFIED_TABLE: &str = "final_analytical_set";
pub const PREDICTIONS_TABLE: &str = "final_predictions";
pub const RESULTS_TABLE: &str = "mirrorball_ml_final";

/// Tables kept by [`CorpusStore::cleanup`](crate::store::CorpusStore::cleanup)
/// unless told otherwise.
pub const PIPELINE_TABLES: [&str; 9] = [
    LYRICS_TABLE,
    LABELS_TABLE,
    "dim_nlp_features",
    "dim_lexical_metrics",
    "dim_thematic_dna",
    "dim_bridge_metrics",
    UNIFIED_TABLE,
    PREDICTIONS_TABLE,
    RESULTS_TABLE,
];

pub(crate) const ATTRIBUTION_PREFIX: &str = "attribution_";
pub(crate) const PREDICTED_SUFFIX: &str = "_predicted";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Column {
    pub name: String,
    pub sql_type: &'static str,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: &'static str) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

fn key_columns() -> Vec<Column> {
    vec![Column::new("track_name", "TEXT NOT NULL"), Column::new("album_name", "TEXT")]
}

fn feature_type(kind: FeatureKind) -> &'static str {
    match kind {
        FeatureKind::WordCount | FeatureKind::BridgeWordCount | FeatureKind::HasBridge => "INTEGER",
        _ => "REAL",
    }
}

pub(crate) fn predicted_column(target: Target) -> String {
    format!("{}{PREDICTED_SUFFIX}", target.id())
}

pub(crate) fn attribution_column(kind: FeatureKind) -> String {
    format!("{ATTRIBUTION_PREFIX}{}", kind.id())
}

pub(crate) fn lyrics_columns() -> Vec<Column> {
    let mut columns = key_columns();
    columns.extend([
        Column::new("lyrics", "TEXT"),
        Column::new("is_new_era", "INTEGER NOT NULL"),
        Column::new("scraped_at", "TEXT"),
    ]);
    columns
}

pub(crate) fn label_columns() -> Vec<Column> {
    let mut columns = key_columns();
    columns.extend(Target::ALL.map(|t| Column::new(t.id(), "REAL")));
    columns
}

pub(crate) fn family_columns(family: FeatureFamily) -> Vec<Column> {
    let mut columns = key_columns();
    if family == FeatureFamily::Thematic {
        columns.push(Column::new("thematic_dna", "TEXT"));
    }
    columns.extend(
        family
            .numeric_features()
            .iter()
            .map(|&kind| Column::new(kind.id(), feature_type(kind))),
    );
    columns
}

pub(crate) fn unified_columns() -> Vec<Column> {
    let mut columns = key_columns();
    columns.push(Column::new("is_new_era", "INTEGER NOT NULL"));
    columns.extend(
        FeatureKind::ALL
            .iter()
            .map(|&kind| Column::new(kind.id(), feature_type(kind))),
    );
    columns.push(Column::new("thematic_dna", "TEXT"));
    columns.extend(Target::ALL.map(|t| Column::new(predicted_column(t), "INTEGER NOT NULL")));
    columns
}

pub(crate) fn prediction_columns() -> Vec<Column> {
    let mut columns = key_columns();
    columns.extend([
        Column::new("target", "TEXT NOT NULL"),
        Column::new("value", "REAL NOT NULL"),
    ]);
    columns
}

pub(crate) fn result_columns(features: &[FeatureKind]) -> Vec<Column> {
    let mut columns = key_columns();
    columns.extend([
        Column::new("is_new_era", "INTEGER NOT NULL"),
        Column::new("cluster_id", "INTEGER NOT NULL"),
        Column::new("x", "REAL NOT NULL"),
        Column::new("y", "REAL NOT NULL"),
        Column::new("top_driver", "TEXT NOT NULL"),
        Column::new("naive_top_driver", "TEXT NOT NULL"),
    ]);
    columns.extend(
        features
            .iter()
            .map(|&kind| Column::new(kind.id(), feature_type(kind))),
    );
    columns.extend(
        features
            .iter()
            .map(|&kind| Column::new(attribution_column(kind), "REAL")),
    );
    columns.push(Column::new("thematic_dna", "TEXT"));
    columns.extend(Target::ALL.map(|t| Column::new(predicted_column(t), "INTEGER NOT NULL")));
    columns
}

pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

pub(crate) fn create_sql(table: &str, columns: &[Column]) -> String {
    let body = columns
        .iter()
        .map(|c| format!("{} {}", quote(&c.name), c.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({body})", quote(table))
}

pub(crate) fn insert_sql(table: &str, columns: &[Column]) -> String {
    let names = columns
        .iter()
        .map(|c| quote(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({names}) VALUES ({placeholders})", quote(table))
}

pub(crate) fn select_sql(table: &str, columns: &[Column]) -> String {
    let names = columns
        .iter()
        .map(|c| quote(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {names} FROM {} ORDER BY rowid", quote(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_quotes_identifiers() {
        let columns = [Column::new("a", "TEXT"), Column::new("b\"c", "REAL")];
        assert_eq!(create_sql("t", &columns), r#"CREATE TABLE "t" ("a" TEXT, "b""c" REAL)"#);
        assert_eq!(
            insert_sql("t", &columns),
            r#"INSERT INTO "t" ("a", "b""c") VALUES (?1, ?2)"#
        );
    }

    #[test]
    fn test_unified_layout_has_every_feature() {
        let names = unified_columns()
            .into_iter()
            .map(|c| c.name)
            .collect::<Vec<_>>();
        for kind in FeatureKind::ALL {
            assert!(names.iter().any(|n| n == kind.id()));
        }
        assert!(names.iter().any(|n| n == "energy_predicted"));
        assert!(names.iter().any(|n| n == "valence_predicted"));
    }

    #[test]
    fn test_family_tables_are_pipeline_tables() {
        for family in FeatureFamily::ALL {
            assert!(PIPELINE_TABLES.contains(&family.table_name()));
        }
    }
}
