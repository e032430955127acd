//! Left outer join of lyrics, feature families and ground-truth labels.

use std::collections::{BTreeMap, HashMap};

use mirrorball_features::{
    FamilyFeatures, FeatureFamily, FeatureRecord, LyricsRecord, TrackKey,
};
use serde::{Deserialize, Serialize};

use crate::{
    table::{UnifiedRow, UnifiedTable},
    target::{GroundTruthLabel, Target, TargetValue},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum BuildTableError {
    #[display("lyrics corpus is empty; nothing to build")]
    EmptyCorpus,
}

/// Row counts of a built table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub total: usize,
    pub with_family: BTreeMap<FeatureFamily, usize>,
    pub labeled: BTreeMap<Target, usize>,
}

/// Joins per-family feature records and labels onto the lyrics corpus.
///
/// Every lyrics track appears exactly once, in corpus order. Tracks without
/// a matching label keep absent targets.
///
/// # Examples
///
/// ```
/// use mirrorball_analysis::{builder::TableBuilder, target::GroundTruthLabel};
/// use mirrorball_features::{LyricsRecord, TrackKey};
///
/// let lyrics = [LyricsRecord {
///     key: TrackKey::new("Love Story (Taylor's Version)", "Fearless (Taylor's Version)"),
///     lyrics: Some("We were both young".into()),
///     is_new_era: true,
///     scraped_at: Default::default(),
/// }];
/// let labels = [GroundTruthLabel {
///     track_name: "love story".into(),
///     album_name: None,
///     energy: Some(0.74),
///     valence: Some(0.31),
/// }];
/// let builder = TableBuilder::new(vec!["(Taylor's Version)".into()]);
/// let (table, report) = builder.build(&lyrics, &[], &labels).unwrap();
/// assert_eq!(table.rows[0].energy.value(), Some(0.74));
/// assert_eq!(report.total, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    suffix_aliases: Vec<String>,
}

impl TableBuilder {
    /// `suffix_aliases` are stripped from track names before label matching.
    #[must_use]
    pub fn new(suffix_aliases: Vec<String>) -> Self {
        Self { suffix_aliases }
    }

    /// Track name used to look up labels.
    #[must_use]
    pub fn label_name(&self, track_name: &str) -> String {
        let mut name = track_name.trim().to_lowercase();
        for alias in &self.suffix_aliases {
            let alias = alias.trim().to_lowercase();
            if alias.is_empty() {
                continue;
            }
            if let Some(stripped) = name.strip_suffix(&alias) {
                name = stripped.trim_end().to_owned();
            }
        }
        name
    }

    pub fn build(
        &self,
        lyrics: &[LyricsRecord],
        features: &[FeatureRecord],
        labels: &[GroundTruthLabel],
    ) -> Result<(UnifiedTable, BuildReport), BuildTableError> {
        if lyrics.is_empty() {
            return Err(BuildTableError::EmptyCorpus);
        }

        let mut by_key = HashMap::<&TrackKey, Vec<&FamilyFeatures>>::new();
        for record in features {
            by_key.entry(&record.key).or_default().push(&record.features);
        }

        let mut labels_by_name = HashMap::<String, Vec<&GroundTruthLabel>>::new();
        for label in labels {
            labels_by_name
                .entry(label.track_name.trim().to_lowercase())
                .or_default()
                .push(label);
        }

        let mut report = BuildReport {
            total: lyrics.len(),
            ..BuildReport::default()
        };
        let mut rows = Vec::with_capacity(lyrics.len());
        for record in lyrics {
            let mut row = UnifiedRow::new(record.key.clone(), record.is_new_era);

            let families = by_key.get(&record.key).map_or(&[][..], Vec::as_slice);
            for family in families {
                *report.with_family.entry(family.family()).or_default() += 1;
                match family {
                    FamilyFeatures::Thematic(t) => row.thematic_dna = Some(t.thematic_dna.clone()),
                    numeric => row.features.extend(numeric.numeric_values()),
                }
            }

            let candidates = labels_by_name
                .get(&self.label_name(&record.key.track_name))
                .map_or(&[][..], Vec::as_slice);
            if let Some(label) = select_label(candidates, &record.key.album_name) {
                for target in Target::ALL {
                    *row.target_mut(target) = TargetValue::from(label.get(target));
                }
            }
            for target in Target::ALL {
                if !row.target(target).is_absent() {
                    *report.labeled.entry(target).or_default() += 1;
                }
            }
            rows.push(row);
        }

        tracing::info!(
            rows = report.total,
            labeled_energy = report.labeled.get(&Target::Energy).copied().unwrap_or(0),
            labeled_valence = report.labeled.get(&Target::Valence).copied().unwrap_or(0),
            "built unified table"
        );
        Ok((UnifiedTable { rows }, report))
    }
}

/// Picks the label for a track among name matches.
///
/// A label naming a different album never matches. A label with the same
/// album beats one without an album; otherwise the first one wins.
fn select_label<'a>(
    candidates: &[&'a GroundTruthLabel],
    album_name: &str,
) -> Option<&'a GroundTruthLabel> {
    let mut fallback = None;
    for &label in candidates {
        match &label.album_name {
            Some(album) if album == album_name => return Some(label),
            Some(_) => {}
            None => {
                fallback.get_or_insert(label);
            }
        }
    }
    fallback
}
