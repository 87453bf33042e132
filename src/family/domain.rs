//! Core family domain types.

use std::fmt::Display;

use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// Database identifier for a family.
pub type FamilyId = i64;

/// Database identifier for an invitation.
pub type InvitationId = i64;

/// Database identifier for a join request.
pub type JoinRequestId = i64;

/// How long an access code can be used after it is created.
pub const INVITATION_DURATION: Duration = Duration::days(7);

/// The number of characters in an access code.
pub const ACCESS_CODE_LENGTH: usize = 6;

/// A validated, non-empty family name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct FamilyName(String);

impl FamilyName {
    /// Create a family name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyField] if `name` is empty after trimming.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyField("family name"))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a family name without validation.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for FamilyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for FamilyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named group of users that share their transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    pub id: FamilyId,
    pub name: FamilyName,
    /// The adult that created the family, `None` if they deleted their account.
    pub created_by: Option<UserID>,
    pub created_at: OffsetDateTime,
}

/// A short random code that lets someone join a family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccessCode(String);

impl AccessCode {
    /// Generate a random uppercase alphanumeric code.
    pub fn generate() -> Self {
        let code = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(ACCESS_CODE_LENGTH)
            .map(|byte| char::from(byte).to_ascii_uppercase())
            .collect();

        Self(code)
    }

    /// Normalise a code typed in by a user.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyField] if `code` is empty after trimming.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if code.is_empty() {
            Err(Error::EmptyField("access code"))
        } else {
            Ok(Self(code.to_ascii_uppercase()))
        }
    }

    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl AsRef<str> for AccessCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for AccessCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invitation for `email` to join a family using `access_code`.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyInvitation {
    pub id: InvitationId,
    pub family_id: FamilyId,
    pub email: String,
    pub invited_by: Option<UserID>,
    pub access_code: AccessCode,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub accepted: bool,
}

impl FamilyInvitation {
    /// An invitation can be used once, before it expires.
    pub fn is_valid(&self, now: OffsetDateTime) -> bool {
        !self.accepted && now < self.expires_at
    }
}

/// A request from a user without a family to join one.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub id: JoinRequestId,
    pub user_id: UserID,
    pub family_id: FamilyId,
    pub message: String,
    pub created_at: OffsetDateTime,
    pub accepted: bool,
}
