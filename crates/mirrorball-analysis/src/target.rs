//! Regression targets and their per-row provenance.

use std::{fmt, str::FromStr};

use mirrorball_features::{FeatureKind, UnknownFeatureError};
use serde::{Deserialize, Serialize};

/// Audio-derived metric that may be missing and reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Energy,
    Valence,
}

impl Target {
    pub const ALL: [Self; 2] = [Self::Energy, Self::Valence];

    #[must_use]
    pub const fn feature(self) -> FeatureKind {
        match self {
            Self::Energy => FeatureKind::Energy,
            Self::Valence => FeatureKind::Valence,
        }
    }

    #[must_use]
    pub const fn id(self) -> &'static str {
        self.feature().id()
    }

    #[must_use]
    pub fn from_feature(kind: FeatureKind) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.feature() == kind)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Target {
    type Err = UnknownFeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = s.parse::<FeatureKind>()?;
        Self::from_feature(kind).ok_or_else(|| UnknownFeatureError { id: s.to_owned() })
    }
}

/// Value of one target for one row, with its provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum TargetValue {
    #[default]
    Absent,
    Observed(f64),
    Predicted(f64),
}

impl TargetValue {
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Absent => None,
            Self::Observed(v) | Self::Predicted(v) => Some(v),
        }
    }

    #[must_use]
    pub const fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub const fn is_observed(self) -> bool {
        matches!(self, Self::Observed(_))
    }

    #[must_use]
    pub const fn is_predicted(self) -> bool {
        matches!(self, Self::Predicted(_))
    }
}

impl From<Option<f64>> for TargetValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Observed)
    }
}

/// Externally sourced target values for a track.
///
/// The album is optional; a label without one matches the track name on any
/// album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthLabel {
    pub track_name: String,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub valence: Option<f64>,
}

impl GroundTruthLabel {
    #[must_use]
    pub const fn get(&self, target: Target) -> Option<f64> {
        match target {
            Target::Energy => self.energy,
            Target::Valence => self.valence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!("energy".parse::<Target>().unwrap(), Target::Energy);
        assert!("reading_grade".parse::<Target>().is_err());
        assert!("tempo".parse::<Target>().is_err());
    }

    #[test]
    fn test_target_value_provenance() {
        assert_eq!(TargetValue::from(None), TargetValue::Absent);
        assert_eq!(TargetValue::from(Some(0.4)).value(), Some(0.4));
        assert!(TargetValue::Predicted(0.1).is_predicted());
        assert!(!TargetValue::Observed(0.1).is_predicted());
        assert_eq!(TargetValue::Absent.value(), None);
    }
}
