//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The ounce amount is not one of the selectable values.
    #[error("ounces must be between 0.5 and 10 in steps of 0.5, got {value}")]
    OuncesOutOfRange { value: f64 },

    /// Invalid diaper type value.
    #[error("invalid diaper type: {value} (expected wet, dirty or both)")]
    InvalidDiaperType { value: String },

    /// Hour or minute outside the clock.
    #[error("invalid time of day: {hour:02}:{minute:02}")]
    InvalidTimeOfDay { hour: u32, minute: u32 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated event identifier.
    ///
    /// Event IDs are assigned by the remote store when a record is created and
    /// are unique within one user's collection.
    EventId, "event ID"
);

define_string_id!(
    /// A validated user identifier (the identity provider's `localId`).
    UserId, "user ID"
);

/// An amount of milk in fluid ounces.
///
/// User input is restricted to the picker values (0.5 to 10 in steps of 0.5).
/// Values read back from the store are accepted leniently: negative amounts
/// become 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ounces(f64);

impl Ounces {
    /// Smallest selectable amount.
    pub const MIN: Self = Self(0.5);

    /// Largest selectable amount.
    pub const MAX: Self = Self(10.0);

    /// Step between selectable amounts.
    pub const STEP: f64 = 0.5;

    /// Creates an amount after checking it is one of the selectable values.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        let steps = value / Self::STEP;
        if value.is_nan()
            || !(Self::MIN.0..=Self::MAX.0).contains(&value)
            || (steps - steps.round()).abs() > f64::EPSILON
        {
            return Err(ValidationError::OuncesOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Creates an amount without range checks, flooring negatives and NaN at 0.
    #[must_use]
    pub const fn lenient(value: f64) -> Self {
        if value.is_nan() || value < 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// Returns the inner f64 value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// All selectable amounts, smallest first.
    pub fn choices() -> impl Iterator<Item = Self> {
        (1..=20_u8).map(|step| Self(f64::from(step) * Self::STEP))
    }
}

impl Default for Ounces {
    fn default() -> Self {
        Self(4.0)
    }
}

impl fmt::Display for Ounces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::display::format_ounces(self.0))
    }
}

impl TryFrom<f64> for Ounces {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ounces> for f64 {
    fn from(o: Ounces) -> Self {
        o.0
    }
}

impl Serialize for Ounces {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ounces {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Ok(Self::lenient(value))
    }
}
