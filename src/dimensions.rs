//! Pixel dimensions.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `width x height` pair of pixel extents.
///
/// Used both for requested thumbnail sizes and for a document's declared
/// page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Create a new pair of dimensions.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check that both extents are positive.
    pub fn validate(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    /// Number of pixels covered, without overflow.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error returned when parsing a `WxH` string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected dimensions as WIDTHxHEIGHT, got {0:?}")]
pub struct ParseDimensionsError(String);

impl FromStr for Dimensions {
    type Err = ParseDimensionsError;

    /// Parse `"200x150"` (also accepts `X` and `*` as separator).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseDimensionsError(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(['x', 'X', '*'])
            .ok_or_else(err)?;
        let width = w.trim().parse().map_err(|_| err())?;
        let height = h.trim().parse().map_err(|_| err())?;
        Ok(Self::new(width, height))
    }
}
