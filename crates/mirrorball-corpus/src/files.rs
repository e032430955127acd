//! JSON files for importing inputs and exporting results.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::Path,
};

use chrono::{DateTime, Utc};
use mirrorball_analysis::GroundTruthLabel;
use mirrorball_features::LyricsRecord;
use mirrorball_latent::ClusterSummary;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::CorpusError,
    result::{ResultRow, cluster_summary},
};

/// Reads a JSON array of lyrics records. `scraped_at` defaults to now.
pub fn read_lyrics(path: &Path) -> Result<Vec<LyricsRecord>, CorpusError> {
    read_json(path)
}

/// Reads a JSON array of ground-truth labels.
pub fn read_labels(path: &Path) -> Result<Vec<GroundTruthLabel>, CorpusError> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CorpusError> {
    let file = File::open(path).map_err(|source| CorpusError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CorpusError::Json {
        path: path.to_owned(),
        source,
    })
}

/// The exported result table.
#[derive(Debug, Clone, Serialize)]
pub struct ResultExport<'a> {
    pub exported_at: DateTime<Utc>,
    pub clusters: ClusterSummary,
    pub tracks: &'a [ResultRow],
}

impl<'a> ResultExport<'a> {
    #[must_use]
    pub fn new(tracks: &'a [ResultRow]) -> Self {
        Self {
            exported_at: Utc::now(),
            clusters: cluster_summary(tracks),
            tracks,
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CorpusError> {
    let io_error = |source| CorpusError::Io {
        path: path.to_owned(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| CorpusError::Json {
        path: path.to_owned(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mirrorball_features::{FeatureKind, TrackKey};

    use super::*;

    #[test]
    fn test_reads_lyrics_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lyrics.json");
        fs::write(
            &path,
            r#"[
                {"track_name": "willow", "album_name": "Evermore", "lyrics": "[Verse 1]\nI'm like the water"},
                {"track_name": "tis the damn season", "album_name": "Evermore", "lyrics": null,
                 "is_new_era": true, "scraped_at": "2024-03-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();
        let records = read_lyrics(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_new_era);
        assert!(records[1].is_new_era);
        assert_eq!(records[1].lyrics, None);
    }

    #[test]
    fn test_reads_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        fs::write(&path, r#"[{"track_name": "willow", "energy": 0.5}]"#).unwrap();
        let labels = read_labels(&path).unwrap();
        assert_eq!(labels[0].album_name, None);
        assert_eq!(labels[0].energy, Some(0.5));
        assert_eq!(labels[0].valence, None);
    }

    #[test]
    fn test_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(read_labels(&path), Err(CorpusError::Json { .. })));
        assert!(matches!(
            read_labels(&dir.path().join("absent.json")),
            Err(CorpusError::Io { .. })
        ));
    }

    #[test]
    fn test_writes_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        let tracks = [ResultRow {
            key: TrackKey::new("champagne problems", "Evermore"),
            is_new_era: false,
            cluster_id: 3,
            x: 0.5,
            y: 0.25,
            top_driver: FeatureKind::LexicalDiversity,
            naive_top_driver: FeatureKind::LexicalDiversity,
            features: [(FeatureKind::LexicalDiversity, 0.6)].into(),
            attributions: [(FeatureKind::LexicalDiversity, 0.9)].into(),
            thematic_dna: None,
            energy_predicted: false,
            valence_predicted: true,
        }];
        write_json(&path, &ResultExport::new(&tracks)).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["tracks"][0]["track_name"], "champagne problems");
        assert_eq!(json["tracks"][0]["top_driver"], "lexical_diversity");
        assert_eq!(json["clusters"]["sizes"]["3"], 1);
    }
}
