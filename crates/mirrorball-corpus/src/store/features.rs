use std::collections::BTreeMap;

use mirrorball_analysis::{Target, TargetValue, UnifiedRow, UnifiedTable};
use mirrorball_features::{
    FamilyFeatures, FeatureFamily, FeatureKind, FeatureRecord, TrackKey, feature::ThematicFeatures,
};
use rusqlite::types::Value;
use tracing::warn;

use super::{CorpusStore, flag, real, text};
use crate::{
    error::CorpusError,
    schema::{self, UNIFIED_TABLE},
};

impl CorpusStore {
    /// Replaces the table of `family` with the records of that family.
    ///
    /// Records of other families are ignored.
    pub fn replace_features(
        &mut self,
        family: FeatureFamily,
        records: &[FeatureRecord],
    ) -> Result<usize, CorpusError> {
        let rows = records
            .iter()
            .filter(|r| r.family() == family)
            .map(|record| {
                let mut row = vec![
                    text(record.key.track_name.as_str()),
                    text(record.key.album_name.as_str()),
                ];
                if let Some(dna) = record.features.thematic_dna() {
                    row.push(text(dna));
                }
                row.extend(
                    record
                        .features
                        .numeric_values()
                        .into_iter()
                        .map(|(_, v)| Value::Real(v)),
                );
                row
            });
        self.replace_table(family.table_name(), &schema::family_columns(family), rows)
    }

    /// Loads the records of one family. A missing table yields no records.
    pub fn load_features(&self, family: FeatureFamily) -> Result<Vec<FeatureRecord>, CorpusError> {
        let table = family.table_name();
        if !self.has_table(table)? {
            warn!(table, "feature table not found");
            return Ok(vec![]);
        }
        let kinds = family.numeric_features();
        let mut stmt = self
            .conn
            .prepare(&schema::select_sql(table, &schema::family_columns(family)))?;
        let rows = stmt
            .query_map([], |row| {
                let key = TrackKey::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                );
                if family == FeatureFamily::Thematic {
                    let dna = row.get::<_, Option<String>>(2)?;
                    return Ok((key, dna, BTreeMap::new()));
                }
                let mut values = BTreeMap::new();
                for (i, &kind) in kinds.iter().enumerate() {
                    if let Some(v) = row.get::<_, Option<f64>>(2 + i)? {
                        values.insert(kind, v);
                    }
                }
                Ok((key, None, values))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let records = rows
            .into_iter()
            .filter_map(|(key, dna, values)| {
                let features = match family {
                    FeatureFamily::Thematic => {
                        dna.map(|thematic_dna| {
                            FamilyFeatures::Thematic(ThematicFeatures { thematic_dna })
                        })
                    }
                    _ => FamilyFeatures::from_numeric(family, &values),
                };
                if features.is_none() {
                    warn!(table, track = %key, "skipping row with missing values");
                }
                features.map(|features| FeatureRecord { key, features })
            })
            .collect();
        Ok(records)
    }

    pub fn replace_unified(&mut self, table: &UnifiedTable) -> Result<usize, CorpusError> {
        let rows = table.rows.iter().map(|row| {
            let mut values = vec![
                text(row.key.track_name.as_str()),
                text(row.key.album_name.as_str()),
                flag(row.is_new_era),
            ];
            values.extend(FeatureKind::ALL.map(|kind| real(row.value(kind))));
            values.push(row.thematic_dna.as_deref().map_or(Value::Null, text));
            values.extend(Target::ALL.map(|t| flag(row.target(t).is_predicted())));
            values
        });
        self.replace_table(UNIFIED_TABLE, &schema::unified_columns(), rows)
    }

    /// Loads the unified table, restoring target provenance from the
    /// `*_predicted` flags.
    pub fn load_unified(&self) -> Result<UnifiedTable, CorpusError> {
        self.require(UNIFIED_TABLE)?;
        let mut stmt = self
            .conn
            .prepare(&schema::select_sql(UNIFIED_TABLE, &schema::unified_columns()))?;
        let features_at = 3;
        let dna_at = features_at + FeatureKind::ALL.len();
        let rows = stmt
            .query_map([], |r| {
                let key = TrackKey::new(
                    r.get::<_, String>(0)?,
                    r.get::<_, Option<String>>(1)?.unwrap_or_default(),
                );
                let mut row = UnifiedRow::new(key, r.get(2)?);
                for (i, kind) in FeatureKind::ALL.into_iter().enumerate() {
                    if let Some(v) = r.get::<_, Option<f64>>(features_at + i)? {
                        row.features.insert(kind, v);
                    }
                }
                for (i, target) in Target::ALL.into_iter().enumerate() {
                    let predicted = r.get::<_, bool>(dna_at + 1 + i)?;
                    *row.target_mut(target) = match row.features.remove(&target.feature()) {
                        None => TargetValue::Absent,
                        Some(v) if predicted => TargetValue::Predicted(v),
                        Some(v) => TargetValue::Observed(v),
                    };
                }
                row.thematic_dna = r.get(dna_at)?;
                Ok(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UnifiedTable { rows })
    }
}

#[cfg(test)]
mod tests {
    use mirrorball_features::feature::{BridgeFeatures, NlpFeatures};

    use super::*;

    fn key(name: &str) -> TrackKey {
        TrackKey::new(name, "Midnights")
    }

    #[test]
    fn test_feature_families_survive_storage() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        let nlp = FeatureRecord {
            key: key("anti-hero"),
            features: FamilyFeatures::Nlp(NlpFeatures {
                sentiment_compound: -0.25,
                sentiment_pos: 0.1,
                sentiment_neg: 0.3,
                lexical_complexity: 0.55,
                word_count: 310,
            }),
        };
        let bridge = FeatureRecord {
            key: key("anti-hero"),
            features: FamilyFeatures::Bridge(BridgeFeatures {
                bridge_sentiment: 0.2,
                bridge_sentiment_shift: 0.45,
                bridge_chorus_contrast: -0.1,
                has_bridge: true,
                bridge_word_count: 42,
            }),
        };
        let thematic = FeatureRecord {
            key: key("karma"),
            features: FamilyFeatures::Thematic(ThematicFeatures {
                thematic_dna: "karma, cat, purr".to_owned(),
            }),
        };
        let all = [nlp.clone(), bridge.clone(), thematic.clone()];
        assert_eq!(store.replace_features(FeatureFamily::Nlp, &all).unwrap(), 1);
        store.replace_features(FeatureFamily::Bridge, &all).unwrap();
        store.replace_features(FeatureFamily::Thematic, &all).unwrap();

        assert_eq!(store.load_features(FeatureFamily::Nlp).unwrap(), [nlp]);
        assert_eq!(store.load_features(FeatureFamily::Bridge).unwrap(), [bridge]);
        assert_eq!(store.load_features(FeatureFamily::Thematic).unwrap(), [thematic]);
        assert!(store.load_features(FeatureFamily::Readability).unwrap().is_empty());
    }

    #[test]
    fn test_unified_table_keeps_provenance() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        let mut labeled = UnifiedRow::new(key("labyrinth"), false);
        labeled.features.insert(FeatureKind::ReadingGrade, 3.5);
        labeled.thematic_dna = Some("breathe, falling".to_owned());
        labeled.energy = TargetValue::Observed(0.3);
        labeled.valence = TargetValue::Predicted(0.2);
        let mut bare = UnifiedRow::new(key("sweet nothing"), true);
        bare.features.insert(FeatureKind::HasBridge, 0.0);
        let table = UnifiedTable {
            rows: vec![labeled, bare],
        };

        store.replace_unified(&table).unwrap();
        assert_eq!(store.load_unified().unwrap(), table);
    }
}
