use std::collections::BTreeMap;

use mirrorball_analysis::Target;
use mirrorball_features::{FeatureKind, TrackKey};
use mirrorball_training::reconstructor::Prediction;
use rusqlite::types::Value;
use tracing::warn;

use super::{CorpusStore, flag, real, text};
use crate::{
    error::CorpusError,
    result::ResultRow,
    schema::{self, ATTRIBUTION_PREFIX, PREDICTED_SUFFIX, PREDICTIONS_TABLE, RESULTS_TABLE},
};

impl CorpusStore {
    pub fn replace_predictions(
        &mut self,
        predictions: &[Prediction],
    ) -> Result<usize, CorpusError> {
        let rows = predictions.iter().map(|p| {
            vec![
                text(p.key.track_name.as_str()),
                text(p.key.album_name.as_str()),
                text(p.target.id()),
                Value::Real(p.value),
            ]
        });
        self.replace_table(PREDICTIONS_TABLE, &schema::prediction_columns(), rows)
    }

    pub fn load_predictions(&self) -> Result<Vec<Prediction>, CorpusError> {
        self.require(PREDICTIONS_TABLE)?;
        let mut stmt = self
            .conn
            .prepare(&schema::select_sql(PREDICTIONS_TABLE, &schema::prediction_columns()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    TrackKey::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    ),
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(key, target, value)| {
                let target = target.parse::<Target>().map_err(|_| CorpusError::InvalidValue {
                    table: PREDICTIONS_TABLE,
                    column: "target".to_owned(),
                    value: target.clone(),
                })?;
                Ok(Prediction { key, target, value })
            })
            .collect()
    }

    /// Replaces the result table. Feature and attribution columns follow
    /// the clustering features of the first row.
    pub fn replace_results(&mut self, results: &[ResultRow]) -> Result<usize, CorpusError> {
        let features = results
            .first()
            .map(|r| r.attributions.keys().copied().collect::<Vec<_>>())
            .unwrap_or_default();
        let rows = results.iter().map(|r| {
            let mut values = vec![
                text(r.key.track_name.as_str()),
                text(r.key.album_name.as_str()),
                flag(r.is_new_era),
                Value::Integer(i64::try_from(r.cluster_id).unwrap_or(i64::MAX)),
                Value::Real(r.x),
                Value::Real(r.y),
                text(r.top_driver.id()),
                text(r.naive_top_driver.id()),
            ];
            values.extend(features.iter().map(|k| real(r.features.get(k).copied())));
            values.extend(features.iter().map(|k| real(r.attributions.get(k).copied())));
            values.push(r.thematic_dna.as_deref().map_or(Value::Null, text));
            values.extend(Target::ALL.map(|t| flag(r.is_predicted(t))));
            values
        });
        self.replace_table(RESULTS_TABLE, &schema::result_columns(&features), rows)
    }

    /// Loads the result table, discovering feature columns by name.
    pub fn load_results(&self) -> Result<Vec<ResultRow>, CorpusError> {
        self.require(RESULTS_TABLE)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", schema::quote(RESULTS_TABLE)))?;
        let names = stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let raw = stmt
            .query_map([], |row| {
                (0..names.len())
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|values| parse_result(&names, values))
            .collect()
    }
}

fn invalid(column: &str, value: &Value) -> CorpusError {
    CorpusError::InvalidValue {
        table: RESULTS_TABLE,
        column: column.to_owned(),
        value: format!("{value:?}"),
    }
}

fn parse_result(names: &[String], values: Vec<Value>) -> Result<ResultRow, CorpusError> {
    let mut track_name = None;
    let mut album_name = String::new();
    let mut is_new_era = false;
    let mut cluster_id = None;
    let mut x = None;
    let mut y = None;
    let mut top_driver = None;
    let mut naive_top_driver = None;
    let mut features = BTreeMap::new();
    let mut attributions = BTreeMap::new();
    let mut thematic_dna = None;
    let mut predicted = BTreeMap::new();

    for (name, value) in names.iter().zip(values) {
        let as_real = || match value {
            Value::Real(v) => Some(v),
            #[expect(clippy::cast_precision_loss)]
            Value::Integer(v) => Some(v as f64),
            _ => None,
        };
        let as_text = || match &value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        };
        let as_flag = || matches!(value, Value::Integer(v) if v != 0);
        let as_driver = || as_text().and_then(|s| s.parse::<FeatureKind>().ok());
        match name.as_str() {
            "track_name" => track_name = as_text(),
            "album_name" => album_name = as_text().unwrap_or_default(),
            "is_new_era" => is_new_era = as_flag(),
            "cluster_id" => {
                let Value::Integer(id) = value else {
                    return Err(invalid(name, &value));
                };
                cluster_id = Some(usize::try_from(id).map_err(|_| invalid(name, &value))?);
            }
            "x" => x = as_real(),
            "y" => y = as_real(),
            "top_driver" => top_driver = Some(as_driver().ok_or_else(|| invalid(name, &value))?),
            "naive_top_driver" => {
                naive_top_driver = Some(as_driver().ok_or_else(|| invalid(name, &value))?);
            }
            "thematic_dna" => thematic_dna = as_text(),
            _ => {
                if let Some(id) = name.strip_prefix(ATTRIBUTION_PREFIX)
                    && let Ok(kind) = id.parse::<FeatureKind>()
                {
                    if let Some(v) = as_real() {
                        attributions.insert(kind, v);
                    }
                } else if let Some(id) = name.strip_suffix(PREDICTED_SUFFIX)
                    && let Ok(target) = id.parse::<Target>()
                {
                    predicted.insert(target, as_flag());
                } else if let Ok(kind) = name.parse::<FeatureKind>() {
                    if let Some(v) = as_real() {
                        features.insert(kind, v);
                    }
                } else {
                    warn!(column = %name, "ignoring unknown result column");
                }
            }
        }
    }

    let missing = |column: &str| invalid(column, &Value::Null);
    Ok(ResultRow {
        key: TrackKey::new(track_name.ok_or_else(|| missing("track_name"))?, album_name),
        is_new_era,
        cluster_id: cluster_id.ok_or_else(|| missing("cluster_id"))?,
        x: x.ok_or_else(|| missing("x"))?,
        y: y.ok_or_else(|| missing("y"))?,
        top_driver: top_driver.ok_or_else(|| missing("top_driver"))?,
        naive_top_driver: naive_top_driver.ok_or_else(|| missing("naive_top_driver"))?,
        features,
        attributions,
        thematic_dna,
        energy_predicted: predicted.get(&Target::Energy).copied().unwrap_or(false),
        valence_predicted: predicted.get(&Target::Valence).copied().unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, cluster_id: usize) -> ResultRow {
        ResultRow {
            key: TrackKey::new(name, "Lover"),
            is_new_era: false,
            cluster_id,
            x: 1.5,
            y: -2.0,
            top_driver: FeatureKind::ReadingGrade,
            naive_top_driver: FeatureKind::Energy,
            features: [(FeatureKind::Energy, 0.7), (FeatureKind::ReadingGrade, 4.0)].into(),
            attributions: [(FeatureKind::Energy, 0.4), (FeatureKind::ReadingGrade, 0.3)].into(),
            thematic_dna: Some("daylight, golden".to_owned()),
            energy_predicted: true,
            valence_predicted: false,
        }
    }

    #[test]
    fn test_results_survive_storage() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        let results = [result("daylight", 2), result("cruel summer", 0)];
        store.replace_results(&results).unwrap();
        assert_eq!(store.load_results().unwrap(), results);
    }

    #[test]
    fn test_predictions_survive_storage() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        let predictions = [Prediction {
            key: TrackKey::new("the archer", "Lover"),
            target: Target::Valence,
            value: 0.21,
        }];
        store.replace_predictions(&predictions).unwrap();
        assert_eq!(store.load_predictions().unwrap(), predictions);
    }

    #[test]
    fn test_rejects_unknown_driver() {
        let mut store = CorpusStore::open_in_memory().unwrap();
        store.replace_results(&[result("paper rings", 1)]).unwrap();
        store
            .conn
            .execute("UPDATE mirrorball_ml_final SET top_driver = 'tempo'", [])
            .unwrap();
        assert!(matches!(
            store.load_results(),
            Err(CorpusError::InvalidValue { column, .. }) if column == "top_driver"
        ));
    }
}
