//! Fixed-layout high-precision decimal.
//!
//! A 96-bit integer magnitude scaled by a power of ten between 0 and 28.
//! On disk it occupies 16 bytes as four `i32` words `lo, mid, hi, flags`,
//! with the scale in bits 16..24 of `flags` and the sign in bit 31.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_MAGNITUDE: u128 = (1u128 << 96) - 1;
const SCALE_SHIFT: u32 = 16;
const SCALE_MASK: u32 = 0x00FF_0000;
const SIGN_MASK: u32 = 0x8000_0000;

/// A decimal number `mantissa / 10^scale`.
///
/// Equality is structural: `1.0` and `1.00` carry different scales and
/// compare unequal, which keeps save/load round trips exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    /// Largest supported scale.
    pub const MAX_SCALE: u8 = 28;

    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    /// Creates a decimal, rejecting magnitudes above 96 bits or scales above 28.
    pub fn new(mantissa: i128, scale: u8) -> Result<Self> {
        if scale > Self::MAX_SCALE {
            return Err(Error::DecimalOutOfRange(format!(
                "scale {scale} exceeds {}",
                Self::MAX_SCALE
            )));
        }
        if mantissa.unsigned_abs() > MAX_MAGNITUDE {
            return Err(Error::DecimalOutOfRange(format!(
                "mantissa {mantissa} exceeds 96 bits"
            )));
        }
        Ok(Self { mantissa, scale })
    }

    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        Self {
            mantissa: value as i128,
            scale: 0,
        }
    }

    #[must_use]
    pub const fn mantissa(&self) -> i128 {
        self.mantissa
    }

    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    /// Returns the four on-disk words `lo, mid, hi, flags`.
    #[must_use]
    pub fn to_bits(&self) -> [i32; 4] {
        let magnitude = self.mantissa.unsigned_abs();
        let mut flags = u32::from(self.scale) << SCALE_SHIFT;
        if self.mantissa < 0 {
            flags |= SIGN_MASK;
        }
        [
            magnitude as u32 as i32,
            (magnitude >> 32) as u32 as i32,
            (magnitude >> 64) as u32 as i32,
            flags as i32,
        ]
    }

    /// Rebuilds a decimal from its on-disk words.
    pub fn from_bits(bits: [i32; 4]) -> Result<Self> {
        let flags = bits[3] as u32;
        if flags & !(SCALE_MASK | SIGN_MASK) != 0 {
            return Err(Error::InvalidDecimal(format!(
                "reserved flag bits set: {flags:#010x}"
            )));
        }
        let scale = ((flags & SCALE_MASK) >> SCALE_SHIFT) as u8;
        let magnitude = u128::from(bits[0] as u32)
            | (u128::from(bits[1] as u32) << 32)
            | (u128::from(bits[2] as u32) << 64);
        if flags & SIGN_MASK != 0 && magnitude == 0 {
            return Err(Error::InvalidDecimal("negative zero".into()));
        }
        let mantissa = if flags & SIGN_MASK != 0 {
            -(magnitude as i128)
        } else {
            magnitude as i128
        };
        Self::new(mantissa, scale)
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = usize::from(self.scale);
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int}.{frac}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int, frac) = body.split_once('.').unwrap_or((body, ""));
        if int.is_empty() && frac.is_empty() {
            return Err(Error::InvalidDecimal(s.to_string()));
        }
        if !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidDecimal(s.to_string()));
        }
        let scale = u8::try_from(frac.len())
            .map_err(|_| Error::DecimalOutOfRange(format!("too many fraction digits in {s}")))?;
        let digits = format!("{int}{frac}");
        let magnitude: i128 = digits
            .parse()
            .map_err(|_| Error::DecimalOutOfRange(s.to_string()))?;
        Self::new(if negative { -magnitude } else { magnitude }, scale)
    }
}
