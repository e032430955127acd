//! Stylometric highlights of a unified table.

use std::collections::BTreeMap;

use mirrorball_features::{FeatureKind, TrackKey};
use mirrorball_stats::descriptive::DescriptiveStats;

use crate::table::UnifiedTable;

#[derive(Debug, Clone)]
pub struct TableSummary {
    /// Track whose bridge departs furthest from its verses, by absolute shift.
    pub most_dramatic_bridge: Option<(TrackKey, f64)>,
    /// Highest reading grades, descending.
    pub top_reading_grades: Vec<(TrackKey, f64)>,
    pub reading_grade_by_album: BTreeMap<String, DescriptiveStats>,
}

impl TableSummary {
    #[must_use]
    pub fn new(table: &UnifiedTable, top: usize) -> Self {
        let values = move |kind: FeatureKind| {
            table
                .rows
                .iter()
                .filter_map(move |row| row.features.get(&kind).map(|&v| (&row.key, v)))
        };

        let most_dramatic_bridge = values(FeatureKind::BridgeSentimentShift)
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
            .map(|(key, v)| (key.clone(), v));

        let mut grades = values(FeatureKind::ReadingGrade).collect::<Vec<_>>();
        grades.sort_by(|(_, a), (_, b)| b.total_cmp(a));
        let top_reading_grades = grades
            .iter()
            .take(top)
            .map(|&(key, v)| (key.clone(), v))
            .collect();

        let mut per_album = BTreeMap::<&str, Vec<f64>>::new();
        for (key, v) in grades {
            per_album.entry(&key.album_name).or_default().push(v);
        }
        let reading_grade_by_album = per_album
            .into_iter()
            .filter_map(|(album, values)| {
                Some((album.to_owned(), DescriptiveStats::new(values)?))
            })
            .collect();

        Self {
            most_dramatic_bridge,
            top_reading_grades,
            reading_grade_by_album,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::UnifiedRow;

    fn row(track: &str, album: &str, grade: f64, shift: Option<f64>) -> UnifiedRow {
        let mut row = UnifiedRow::new(TrackKey::new(track, album), false);
        row.features.insert(FeatureKind::ReadingGrade, grade);
        if let Some(shift) = shift {
            row.features.insert(FeatureKind::BridgeSentimentShift, shift);
        }
        row
    }

    #[test]
    fn test_summary() {
        let table = UnifiedTable {
            rows: vec![
                row("a", "Red", 2.0, Some(0.3)),
                row("b", "Red", 4.0, Some(-0.9)),
                row("c", "1989", 6.0, None),
            ],
        };
        let summary = TableSummary::new(&table, 2);
        let (key, shift) = summary.most_dramatic_bridge.unwrap();
        assert_eq!(key.track_name, "b");
        assert_eq!(shift, -0.9);
        let top = summary
            .top_reading_grades
            .iter()
            .map(|(k, _)| k.track_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(top, ["c", "b"]);
        assert_eq!(summary.reading_grade_by_album["Red"].mean, 3.0);
        assert_eq!(summary.reading_grade_by_album["1989"].count, 1);
    }

    #[test]
    fn test_album_spread() {
        let table = UnifiedTable {
            rows: vec![
                row("a", "Red", 2.0, None),
                row("b", "Red", 4.0, None),
                row("c", "Red", 9.0, None),
            ],
        };
        let red = &TableSummary::new(&table, 1).reading_grade_by_album["Red"];
        assert_eq!(red.median, 4.0);
        assert_eq!(red.min, 2.0);
        assert_eq!(red.max, 9.0);
        assert!((red.variance - 26.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table() {
        let summary = TableSummary::new(&UnifiedTable::default(), 5);
        assert!(summary.most_dramatic_bridge.is_none());
        assert!(summary.top_reading_grades.is_empty());
    }
}
