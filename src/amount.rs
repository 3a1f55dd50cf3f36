//! Amount - Arbitrary precision, non-negative, in the currency's smallest unit
//!
//! Satoshis, wei and drops all fit. Serialized as a decimal string so raw
//! snapshots never lose precision.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self { Self(BigUint::zero()) }

    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    /// `self - other`, or `None` when it would go negative.
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 >= other.0 { Some(Amount(&self.0 - &other.0)) } else { None }
    }

    /// `self - other`, clamped at zero.
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        self.checked_sub(other).unwrap_or_default()
    }

    /// Integer percentage of `self`, rounded down.
    pub fn percent(&self, percent: u32) -> Amount {
        Amount(&self.0 * BigUint::from(percent) / BigUint::from(100u32))
    }

    pub fn to_u64(&self) -> Option<u64> { self.0.to_u64() }

    pub fn as_biguint(&self) -> &BigUint { &self.0 }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self { Self(BigUint::from(value)) }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self { Self(value) }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("not a non-negative integer: '{}'", s));
        }
        BigUint::from_str(s).map(Amount).map_err(|e| format!("'{}': {}", s, e))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount { Amount(self.0 + rhs.0) }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;
    fn add(self, rhs: &'a Amount) -> Amount { Amount(&self.0 + &rhs.0) }
}

impl<'a> Mul<&'a Amount> for &'a Amount {
    type Output = Amount;
    fn mul(self, rhs: &'a Amount) -> Amount { Amount(&self.0 * &rhs.0) }
}

impl Mul<u64> for &Amount {
    type Output = Amount;
    fn mul(self, rhs: u64) -> Amount { Amount(&self.0 * BigUint::from(rhs)) }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

impl<'a> std::iter::Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, a| &acc + a)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}
