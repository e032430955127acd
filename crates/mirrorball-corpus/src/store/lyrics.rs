use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use mirrorball_analysis::{GroundTruthLabel, Target};
use mirrorball_features::{LyricsRecord, TrackKey};
use rusqlite::types::Value;
use tracing::warn;

use super::{CorpusStore, flag, real, text};
use crate::{
    error::CorpusError,
    schema::{self, LABELS_TABLE, LYRICS_TABLE},
};

impl CorpusStore {
    /// Adds lyrics rows; earlier rows for the same track are kept and
    /// superseded on load by the most recent `scraped_at`.
    pub fn append_lyrics(&mut self, records: &[LyricsRecord]) -> Result<usize, CorpusError> {
        self.append_table(LYRICS_TABLE, &schema::lyrics_columns(), records.iter().map(lyrics_row))
    }

    pub fn replace_lyrics(&mut self, records: &[LyricsRecord]) -> Result<usize, CorpusError> {
        self.replace_table(LYRICS_TABLE, &schema::lyrics_columns(), records.iter().map(lyrics_row))
    }

    /// Loads the lyrics corpus, one record per track.
    pub fn load_lyrics(&self) -> Result<Vec<LyricsRecord>, CorpusError> {
        self.require(LYRICS_TABLE)?;
        let mut stmt = self
            .conn
            .prepare(&schema::select_sql(LYRICS_TABLE, &schema::lyrics_columns()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<bool>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let records = rows
            .into_iter()
            .map(|(track_name, album_name, lyrics, is_new_era, scraped_at)| {
                let key = TrackKey::new(track_name, album_name.unwrap_or_default());
                let scraped_at = scraped_at
                    .as_deref()
                    .and_then(|raw| {
                        let parsed = parse_timestamp(raw);
                        if parsed.is_none() {
                            warn!(track = %key, raw, "unparseable scraped_at; treating as oldest");
                        }
                        parsed
                    })
                    .unwrap_or(DateTime::UNIX_EPOCH);
                LyricsRecord {
                    key,
                    lyrics,
                    is_new_era: is_new_era.unwrap_or(false),
                    scraped_at,
                }
            })
            .collect();
        Ok(keep_latest(records))
    }

    pub fn replace_labels(&mut self, labels: &[GroundTruthLabel]) -> Result<usize, CorpusError> {
        let rows = labels.iter().map(|label| {
            vec![
                text(label.track_name.as_str()),
                label.album_name.as_deref().map_or(Value::Null, text),
                real(label.get(Target::Energy)),
                real(label.get(Target::Valence)),
            ]
        });
        self.replace_table(LABELS_TABLE, &schema::label_columns(), rows)
    }

    pub fn load_labels(&self) -> Result<Vec<GroundTruthLabel>, CorpusError> {
        self.require(LABELS_TABLE)?;
        let mut stmt = self
            .conn
            .prepare(&schema::select_sql(LABELS_TABLE, &schema::label_columns()))?;
        let labels = stmt
            .query_map([], |row| {
                Ok(GroundTruthLabel {
                    track_name: row.get(0)?,
                    album_name: row.get(1)?,
                    energy: row.get(2)?,
                    valence: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(labels)
    }
}

fn lyrics_row(record: &LyricsRecord) -> Vec<Value> {
    vec![
        text(record.key.track_name.as_str()),
        text(record.key.album_name.as_str()),
        record.lyrics.as_deref().map_or(Value::Null, text),
        flag(record.is_new_era),
        text(record.scraped_at.to_rfc3339()),
    ]
}

/// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS[.fff]` (taken as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        })
}

/// Collapses duplicate keys to the most recently scraped record, keeping the
/// position of the first occurrence.
fn keep_latest(records: Vec<LyricsRecord>) -> Vec<LyricsRecord> {
    let mut position = HashMap::<TrackKey, usize>::new();
    let mut kept = Vec::<LyricsRecord>::with_capacity(records.len());
    for record in records {
        if let Some(&i) = position.get(&record.key) {
            warn!(track = %record.key, "duplicate lyrics rows; keeping the most recent");
            if record.scraped_at > kept[i].scraped_at {
                kept[i] = record;
            }
        } else {
            position.insert(record.key.clone(), kept.len());
            kept.push(record);
        }
    }
    kept
}
