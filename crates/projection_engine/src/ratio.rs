use serde::{Serialize, Serializer};

/// Result of a division that may have no meaningful value.
///
/// `Undefined` marks a zero (or non-finite) denominator. [`Ratio::value`] maps it
/// to 0 so arithmetic built on top keeps the worksheet convention, while
/// serialized output renders it as `null` and lets each view choose a marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    Undefined,
}

impl Ratio {
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Ratio::Undefined;
        }
        Ratio::from_f64(numerator / denominator)
    }

    fn from_f64(v: f64) -> Self {
        if v.is_finite() {
            Ratio::Value(v)
        } else {
            Ratio::Undefined
        }
    }

    /// The numeric value, 0 when undefined.
    pub fn value(self) -> f64 {
        match self {
            Ratio::Value(v) => v,
            Ratio::Undefined => 0.0,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Ratio::Undefined)
    }

    pub fn as_option(self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(v),
            Ratio::Undefined => None,
        }
    }

    pub fn map<F: FnOnce(f64) -> f64>(self, f: F) -> Self {
        match self {
            Ratio::Value(v) => Ratio::from_f64(f(v)),
            Ratio::Undefined => Ratio::Undefined,
        }
    }

    /// Chains a second division on a defined value.
    pub fn and_then<F: FnOnce(f64) -> Ratio>(self, f: F) -> Self {
        match self {
            Ratio::Value(v) => f(v),
            Ratio::Undefined => Ratio::Undefined,
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ratio::Value(v) => serializer.serialize_f64(*v),
            Ratio::Undefined => serializer.serialize_none(),
        }
    }
}
