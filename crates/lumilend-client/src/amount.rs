use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{AMOUNT_DECIMALS, BPS_DENOMINATOR, STROOPS_PER_XLM};
use crate::error::{Error, Result};

/// An XLM amount held as a whole number of stroops (1 XLM = 10^7 stroops).
///
/// Conversions to and from decimal strings are exact; amounts never pass
/// through floating point. Display always renders all 7 fractional digits,
/// so `Amount::parse("600")` prints as `600.0000000`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_stroops(stroops: i128) -> Amount {
        Amount(stroops)
    }

    pub const fn stroops(self) -> i128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parses a non-negative decimal XLM string ("600", "12.5", ".0000001")
    /// into stroops. Rejects more than 7 fractional digits rather than
    /// rounding, since a sub-stroop amount cannot exist on the ledger.
    pub fn parse(input: &str) -> Result<Amount> {
        let s = input.trim();
        if s.is_empty() {
            return Err(Error::invalid_amount(input, "no digits"));
        }
        if s.starts_with('-') || s.starts_with('+') {
            return Err(Error::invalid_amount(input, "must be an unsigned decimal"));
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(Error::invalid_amount(input, "no digits"));
        }
        if frac.len() > AMOUNT_DECIMALS as usize {
            return Err(Error::invalid_amount(input, "more than 7 decimal places"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::invalid_amount(input, "not a decimal number"));
        }
        let whole_part: i128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| Error::invalid_amount(input, "amount is too large"))?
        };
        let frac_part: i128 = if frac.is_empty() {
            0
        } else {
            // at most 7 digits, cannot overflow
            frac.parse()
                .map_err(|_| Error::invalid_amount(input, "not a decimal number"))?
        };
        let frac_scaled = frac_part * 10_i128.pow(AMOUNT_DECIMALS - frac.len() as u32);
        whole_part
            .checked_mul(STROOPS_PER_XLM)
            .and_then(|v| v.checked_add(frac_scaled))
            .map(Amount)
            .ok_or_else(|| Error::invalid_amount(input, "amount is too large"))
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Flat interest at `rate_bps` basis points, rounded down. Mirrors the
    /// pool contract: interest = principal * rate_bps / 10_000.
    pub fn flat_interest(self, rate_bps: u32) -> Result<Amount> {
        self.0
            .checked_mul(rate_bps as i128)
            .map(|v| Amount(v / BPS_DENOMINATOR))
            .ok_or_else(|| {
                Error::invalid_amount(&self.to_string(), "interest computation overflowed")
            })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per_xlm = STROOPS_PER_XLM as u128;
        let magnitude = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}.{:07}", magnitude / per_xlm, magnitude % per_xlm)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({self})")
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Amount> {
        Amount::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> core::result::Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse(&raw).map_err(serde::de::Error::custom)
    }
}
