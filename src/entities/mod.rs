// Entity Models - Member, ChurchEvent, FinanceRecord
//
// Each entity is a flat record:
// - Opaque string id, assigned by the local store or by the backend
// - A create payload (`New`) and a partial update (`Patch`)
// - Fixed seed rows for first use of a local store

pub mod event;
pub mod finance;
pub mod member;

pub use event::{ChurchEvent, ChurchEventPatch, EventStatus, EventType, NewChurchEvent};
pub use finance::{
    categories_for, FinanceRecord, FinanceRecordPatch, FinanceType, NewFinanceRecord,
    EXPENSE_CATEGORIES, INCOME_CATEGORIES, MAX_AMOUNT,
};
pub use member::{Gender, Member, MemberPatch, MemberStatus, NewMember};

use crate::validation::Validate;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Ordering the hosted backend applies to a full-table read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: &'static str,
    pub ascending: bool,
}

impl SortOrder {
    pub const fn asc(column: &'static str) -> Self {
        SortOrder {
            column,
            ascending: true,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        SortOrder {
            column,
            ascending: false,
        }
    }

    /// Query form, e.g. `created_at.desc`.
    pub fn to_query(&self) -> String {
        let dir = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, dir)
    }
}

/// Contract every persisted record type fulfils for both store backends.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type New: Validate + Serialize + Clone + Send + Sync + 'static;
    type Patch: Validate + Serialize + Clone + Send + Sync + 'static;

    /// Human readable name, used in logs and messages.
    const KIND: &'static str;
    /// Key of the collection in local key/value storage.
    const COLLECTION_KEY: &'static str;
    /// Table name on the hosted backend.
    const TABLE: &'static str;
    const ORDER: SortOrder;

    fn id(&self) -> &str;

    fn from_new(id: String, created_at: DateTime<Utc>, new: Self::New) -> Self;

    /// Overwrite only the fields present in `patch`.
    fn apply(&mut self, patch: &Self::Patch);

    fn seed() -> Vec<Self>;
}

/// Today's date in the `YYYY-MM-DD` form every date field uses.
pub(crate) fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Implements `Display`, wire label accessors and a forgiving `FromStr`
/// (wire label or English variant name, any case) for a label enum.
macro_rules! labeled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Label as stored and displayed.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $(
                    if wanted.eq_ignore_ascii_case($label)
                        || wanted.eq_ignore_ascii_case(stringify!($variant))
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("unknown {}: '{}'", stringify!($name), s))
            }
        }
    };
}

pub(crate) use labeled_enum;
