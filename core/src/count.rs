//! Validated counter values.
//!
//! Every counter lives in `0..=999_999`. Increment/decrement clamp inside the
//! lane; anything that *sets* a value has to come through [`Count`], so
//! out-of-range input is rejected before it can reach lane state.

use std::fmt;
use std::str::FromStr;

pub const MIN_COUNT: u32 = 0;
pub const MAX_COUNT: u32 = 999_999;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CountError {
    #[error("{0} is outside the allowed range {MIN_COUNT}..={MAX_COUNT}")]
    OutOfRange(i64),
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
}

/// A counter value known to be within range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Count(u32);

impl Count {
    pub const ZERO: Count = Count(MIN_COUNT);
    pub const MAX: Count = Count(MAX_COUNT);

    pub fn new(value: u32) -> Result<Self, CountError> {
        if value > MAX_COUNT {
            return Err(CountError::OutOfRange(i64::from(value)));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Count {
    type Error = CountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= MAX_COUNT)
            .map(Count)
            .ok_or(CountError::OutOfRange(value))
    }
}

impl TryFrom<u32> for Count {
    type Error = CountError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Count::new(value)
    }
}

impl FromStr for Count {
    type Err = CountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| CountError::NotANumber(trimmed.to_string()))?;
        Count::try_from(value)
    }
}

impl From<Count> for u32 {
    fn from(count: Count) -> Self {
        count.0
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
