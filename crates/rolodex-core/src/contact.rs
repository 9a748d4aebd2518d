//! The contact entity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a [`Contact`], using UUID v7.
///
/// # Example
///
/// ```
/// use rolodex_core::ContactId;
///
/// let id = ContactId::new();
/// let parsed: ContactId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(Uuid);

impl ContactId {
    /// Creates a new unique contact ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `ContactId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the nil ID, used by contacts that were never stored.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` if this is the nil ID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::nil()
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for ContactId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A contact's personal information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Identifier, assigned by the store on creation.
    pub id: ContactId,
    /// First name.
    pub firstname: String,
    /// Last name.
    pub lastname: String,
    /// Date of birth.
    pub birthday: NaiveDate,
}

impl Contact {
    /// Creates an unsaved contact with a nil ID.
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>, birthday: NaiveDate) -> Self {
        Self {
            id: ContactId::nil(),
            firstname: firstname.into(),
            lastname: lastname.into(),
            birthday,
        }
    }
}

impl Default for Contact {
    fn default() -> Self {
        Self::new("", "", NaiveDate::default())
    }
}
