//! Diaper type enum as the single source of truth for diaper type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ValidationError;

/// What a diaper change contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiaperType {
    #[default]
    Wet,
    Dirty,
    Both,
}

impl DiaperType {
    /// String representation used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wet => "wet",
            Self::Dirty => "dirty",
            Self::Both => "both",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wet => "Wet",
            Self::Dirty => "Dirty",
            Self::Both => "Both",
        }
    }

    /// Whether this change counts toward the wet tally.
    ///
    /// `Both` counts as wet and as dirty.
    #[must_use]
    pub const fn is_wet(self) -> bool {
        matches!(self, Self::Wet | Self::Both)
    }

    /// Whether this change counts toward the dirty tally.
    #[must_use]
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Dirty | Self::Both)
    }
}

impl fmt::Display for DiaperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DiaperType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wet" => Ok(Self::Wet),
            "dirty" => Ok(Self::Dirty),
            "both" => Ok(Self::Both),
            _ => Err(ValidationError::InvalidDiaperType {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for DiaperType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DiaperType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        for variant in [DiaperType::Wet, DiaperType::Dirty, DiaperType::Both] {
            let s = variant.to_string();
            let parsed: DiaperType = s.parse().expect("should parse");
            assert_eq!(parsed, variant, "roundtrip failed for {variant:?}");
        }
    }

    #[test]
    fn both_counts_as_wet_and_dirty() {
        assert!(DiaperType::Both.is_wet());
        assert!(DiaperType::Both.is_dirty());
        assert!(DiaperType::Wet.is_wet());
        assert!(!DiaperType::Wet.is_dirty());
        assert!(!DiaperType::Dirty.is_wet());
        assert!(DiaperType::Dirty.is_dirty());
    }

    #[test]
    fn unknown_type_errors() {
        let err = "soggy".parse::<DiaperType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid diaper type: soggy (expected wet, dirty or both)"
        );
    }

    #[test]
    fn deserialize_rejects_unknown_type() {
        let result: Result<DiaperType, _> = serde_json::from_str("\"soggy\"");
        assert!(result.is_err());
    }

    #[test]
    fn default_is_wet() {
        assert_eq!(DiaperType::default(), DiaperType::Wet);
    }
}
