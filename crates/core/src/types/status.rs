//! Status and classification enums for sellers and subscriptions.
//!
//! All enums serialize as `snake_case` strings and, with the `postgres`
//! feature, map onto the matching enum types in the `maani` schema.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` from one variant/string table.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical string form used in JSON and the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Operational status of a seller account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "maani.seller_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SellerStatus {
    /// Visible in search and nearby queries.
    #[default]
    Active,
    /// Paused by the seller.
    Inactive,
    /// Blocked by the marketplace.
    Suspended,
}

string_enum!(SellerStatus, "seller status", {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
});

/// Document verification state of a seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "maani.verification_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

string_enum!(VerificationStatus, "verification status", {
    Pending => "pending",
    Verified => "verified",
    Rejected => "rejected",
});

/// Kind of business a seller registers as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "maani.business_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    Retail,
    Wholesale,
    Manufacturer,
    Service,
    Food,
    Other,
}

string_enum!(BusinessType, "business type", {
    Retail => "retail",
    Wholesale => "wholesale",
    Manufacturer => "manufacturer",
    Service => "service",
    Food => "food",
    Other => "other",
});

/// Which side of the marketplace a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "maani.subscription_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    Seller,
    Buyer,
}

string_enum!(SubscriptionKind, "subscription type", {
    Seller => "seller",
    Buyer => "buyer",
});

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "maani.subscription_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Free three-month trial.
    Trial,
    /// Paid and within the billing period.
    Active,
    /// Expired by the sweep.
    Inactive,
}

string_enum!(SubscriptionStatus, "subscription status", {
    Trial => "trial",
    Active => "active",
    Inactive => "inactive",
});

impl SubscriptionStatus {
    /// Whether this status grants access (before checking the end date).
    #[must_use]
    pub const fn grants_access(self) -> bool {
        matches!(self, Self::Trial | Self::Active)
    }
}

/// Outcome of a recorded subscription payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "maani.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Success,
    Failed,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Success => "success",
    Failed => "failed",
    Refunded => "refunded",
});
