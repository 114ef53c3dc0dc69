use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The only currency the storefront sells in.
pub const INR_CURRENCY_CODE: &str = "INR";

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

//--------------------------------------       Rupees        ---------------------------------------------------------
/// A whole-rupee amount, as stored against order lines.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Rupees(i64);

op!(binary Rupees, Add, add);
op!(binary Rupees, Sub, sub);
op!(inplace Rupees, AddAssign, add_assign);

impl Rupees {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The price of `qty` units, or `None` if it does not fit.
    pub fn checked_mul(self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Self)
    }
}

impl From<i64> for Rupees {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Rupees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

//--------------------------------------        Paise        ---------------------------------------------------------
/// An amount in minor currency units. Payment gateways deal exclusively in paise.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);

impl Paise {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Rounds to the nearest whole rupee, half away from zero.
    pub fn to_rupees_rounded(self) -> Rupees {
        let whole = self.0 / 100;
        let rem = self.0 % 100;
        match rem {
            r if r >= 50 => Rupees(whole + 1),
            r if r <= -50 => Rupees(whole - 1),
            _ => Rupees(whole),
        }
    }
}

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Paise {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| MoneyConversionError(format!("{value} paise is too large")))
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}₹{}.{:02}", abs / 100, abs % 100)
    }
}
