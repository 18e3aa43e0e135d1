//! Common types, enums, error handling, data models.

use std::fmt;
use std::ops::{Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Common error type for the pathfinding engine.
#[derive(Debug, Error)]
pub enum PathfinderError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unknown destination account {0}")]
    UnknownDestination(AccountId),
    #[error("search level {0} out of range")]
    SearchLevelOutOfRange(u8),
    #[error("ledger snapshot no longer available")]
    SnapshotLost,
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PathfinderError>;

/// Identifier of a participant in the settlement network.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; 20]);

impl AccountId {
    pub fn new(bytes: [u8; 20]) -> Self {
        AccountId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = PathfinderError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = hex::decode(s)
            .map_err(|e| PathfinderError::InvalidRequest(format!("bad account id: {e}")))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| PathfinderError::InvalidRequest("account id must be 20 bytes".into()))?;
        Ok(AccountId(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Three-letter currency code. The all-zero value is the native currency,
/// reserved under the code `NAT`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency([u8; 3]);

const NATIVE_CODE: &str = "NAT";

impl Currency {
    pub fn native() -> Self {
        Currency([0; 3])
    }

    pub fn from_code(code: [u8; 3]) -> Self {
        Currency(code)
    }

    pub fn is_native(&self) -> bool {
        self.0 == [0; 3]
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "{NATIVE_CODE}")
        } else {
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        }
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({self})")
    }
}

impl FromStr for Currency {
    type Err = PathfinderError;

    fn from_str(s: &str) -> Result<Self> {
        if s == NATIVE_CODE {
            return Ok(Currency::native());
        }
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_alphanumeric()) {
            return Err(PathfinderError::InvalidRequest(format!(
                "bad currency code: {s}"
            )));
        }
        Ok(Currency([bytes[0], bytes[1], bytes[2]]))
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A (currency, issuer) pair. The native currency has no issuer and compares
/// equal only to itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    pub currency: Currency,
    pub issuer: Option<AccountId>,
}

impl Issue {
    pub fn native() -> Self {
        Issue {
            currency: Currency::native(),
            issuer: None,
        }
    }

    pub fn issued(currency: Currency, issuer: AccountId) -> Self {
        Issue {
            currency,
            issuer: Some(issuer),
        }
    }

    pub fn is_native(&self) -> bool {
        self.currency.is_native()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issuer {
            Some(issuer) => write!(f, "{}/{}", self.currency, issuer),
            None => write!(f, "{}", self.currency),
        }
    }
}

impl fmt::Debug for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Issue({self})")
    }
}

/// A signed decimal value tagged with an Issue. The engine compares, zeroes
/// and passes amounts through; settlement arithmetic happens in the oracle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    value: Decimal,
    issue: Issue,
}

impl Amount {
    pub fn new(value: Decimal, issue: Issue) -> Self {
        Amount { value, issue }
    }

    pub fn zero(issue: Issue) -> Self {
        Amount {
            value: Decimal::ZERO,
            issue,
        }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }
}

impl Sub<&Amount> for Amount {
    type Output = Amount;

    fn sub(mut self, rhs: &Amount) -> Amount {
        self -= rhs;
        self
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        debug_assert_eq!(self.issue.currency, rhs.issue.currency);
        self.value -= rhs.value;
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.issue)
    }
}
