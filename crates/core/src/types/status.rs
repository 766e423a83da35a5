//! Status enums for various entities.
//!
//! The backend spells every enum value in upper case (`"ADMIN"`, `"PAID"`).
//! Older clients persisted roles in lower case, so deserialization accepts
//! both spellings for [`Role`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role, deciding which console home a user lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access to restaurant management.
    #[serde(alias = "admin")]
    Admin,
    /// Front-of-house staff: orders and dining areas.
    #[serde(alias = "staff")]
    Staff,
    /// End customer.
    #[serde(alias = "user")]
    User,
}

impl Role {
    /// Wire spelling of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Staff => "STAFF",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "STAFF" => Ok(Self::Staff),
            "USER" => Ok(Self::User),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Order lifecycle state.
///
/// `Pending -> Paid -> Completed`, or `Pending -> Canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    #[default]
    Pending,
    Paid,
    Completed,
    Canceled,
}

impl OrderState {
    /// Whether the order may still be canceled by the customer.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
        };
        f.write_str(s)
    }
}

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Wechat,
    Alipay,
    Cash,
    Card,
    Meituan,
    Douyin,
    Jd,
    Other,
}

impl PaymentMethod {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wechat => "WECHAT",
            Self::Alipay => "ALIPAY",
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Meituan => "MEITUAN",
            Self::Douyin => "DOUYIN",
            Self::Jd => "JD",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WECHAT" => Ok(Self::Wechat),
            "ALIPAY" => Ok(Self::Alipay),
            "CASH" => Ok(Self::Cash),
            "CARD" => Ok(Self::Card),
            "MEITUAN" => Ok(Self::Meituan),
            "DOUYIN" => Ok(Self::Douyin),
            "JD" => Ok(Self::Jd),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Occupancy of a dining area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaState {
    #[default]
    Free,
    Occupied,
}

impl AreaState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Occupied => "OCCUPIED",
        }
    }
}

impl fmt::Display for AreaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of dining area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaType {
    Private,
    Table,
    Bar,
}

impl AreaType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Table => "TABLE",
            Self::Bar => "BAR",
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account standing on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    #[default]
    Active,
    Banned,
    Deleted,
}
