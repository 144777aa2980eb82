//! Integer normalization for window bounds and depth limits

use std::fmt;

use crate::IterableError;

/// Loosely typed value expected to carry an integer
#[derive(Debug, Clone, PartialEq)]
pub enum IntLike {
    /// Already an integer
    Int(i64),
    /// Floating-point value; accepted only when integral
    Float(f64),
    /// Text; accepted when it parses as an integral number
    Text(String),
}

impl fmt::Display for IntLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntLike::Int(value) => write!(f, "{value}"),
            IntLike::Float(value) => write!(f, "{value}"),
            IntLike::Text(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<i64> for IntLike {
    fn from(value: i64) -> Self {
        IntLike::Int(value)
    }
}

impl From<i32> for IntLike {
    fn from(value: i32) -> Self {
        IntLike::Int(i64::from(value))
    }
}

impl From<u32> for IntLike {
    fn from(value: u32) -> Self {
        IntLike::Int(i64::from(value))
    }
}

impl From<usize> for IntLike {
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(value) => IntLike::Int(value),
            // Too large for i64; let the normalizer reject it.
            Err(_) => IntLike::Float(value as f64),
        }
    }
}

impl From<f64> for IntLike {
    fn from(value: f64) -> Self {
        IntLike::Float(value)
    }
}

impl From<&str> for IntLike {
    fn from(value: &str) -> Self {
        IntLike::Text(value.to_string())
    }
}

impl From<String> for IntLike {
    fn from(value: String) -> Self {
        IntLike::Text(value)
    }
}

/// Collaborator turning an [`IntLike`] into an integer
pub trait IntNormalizer {
    /// Normalize, failing with `InvalidArgument` on non-integer input
    fn normalize_int(&self, value: &IntLike) -> Result<i64, IterableError>;
}

/// Accepts integers, integral finite floats, and text spelling either
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictIntNormalizer;

impl StrictIntNormalizer {
    fn from_float(value: f64) -> Option<i64> {
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
        if value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value < i64::MAX as f64
        {
            Some(value as i64)
        } else {
            None
        }
    }
}

impl IntNormalizer for StrictIntNormalizer {
    fn normalize_int(&self, value: &IntLike) -> Result<i64, IterableError> {
        let normalized = match value {
            IntLike::Int(value) => Some(*value),
            IntLike::Float(value) => Self::from_float(*value),
            IntLike::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(Self::from_float))
            }
        };
        normalized.ok_or_else(|| {
            IterableError::invalid_argument(format!("{value} is not an integer value"))
        })
    }
}
