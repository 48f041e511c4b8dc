use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Money;

/// Number of basis points in 100%.
pub const BASIS_POINTS_PER_UNIT: u32 = 10_000;

//--------------------------------------   CommissionRate    ---------------------------------------------------------
/// The platform's commission, in basis points of a seller's item subtotal (1 bp = 0.01%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CommissionRate(u32);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommissionRateError {
    #[error("Commission rate of {0} bp exceeds 100%")]
    OutOfRange(u32),
    #[error("Could not parse commission rate: {0}")]
    ParseError(String),
}

impl CommissionRate {
    pub fn from_basis_points(bps: u32) -> Result<Self, CommissionRateError> {
        if bps > BASIS_POINTS_PER_UNIT {
            return Err(CommissionRateError::OutOfRange(bps));
        }
        Ok(Self(bps))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// The commission owed on `subtotal`, rounded half-up to the nearest minor unit.
    pub fn apply(&self, subtotal: Money) -> Money {
        let scaled = i128::from(subtotal.value()) * i128::from(self.0);
        let divisor = i128::from(BASIS_POINTS_PER_UNIT);
        let rounded = if scaled >= 0 {
            (scaled + divisor / 2) / divisor
        } else {
            (scaled - divisor / 2) / divisor
        };
        // |rounded| <= |subtotal| because the rate is capped at 100%, so this cannot overflow.
        Money::from(rounded as i64)
    }
}

impl TryFrom<u32> for CommissionRate {
    type Error = CommissionRateError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_basis_points(value)
    }
}

impl From<CommissionRate> for u32 {
    fn from(rate: CommissionRate) -> Self {
        rate.0
    }
}

/// Parses a percentage such as `"10"`, `"12.5"` or `"7.25%"`. At most two decimal places are accepted.
impl FromStr for CommissionRate {
    type Err = CommissionRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('%').trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || frac.len() > 2 || !all_digits(whole) || !all_digits(frac) {
            return Err(CommissionRateError::ParseError(s.to_string()));
        }
        let whole = whole.parse::<u32>().map_err(|e| CommissionRateError::ParseError(format!("{s}: {e}")))?;
        let frac = if frac.is_empty() {
            0
        } else {
            let digits = frac.parse::<u32>().map_err(|e| CommissionRateError::ParseError(format!("{s}: {e}")))?;
            if frac.len() == 1 {
                digits * 10
            } else {
                digits
            }
        };
        let bps = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| CommissionRateError::ParseError(s.to_string()))?;
        Self::from_basis_points(bps)
    }
}

impl Display for CommissionRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
