//! Core user domain types.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, family::FamilyId};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The permission tier of a user.
///
/// Kids are created by an adult, can only see their own transactions and can
/// be blocked by an adult in their family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Adult,
    Kid,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Adult => "adult",
            Role::Kid => "kid",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adult" => Ok(Role::Adult),
            "kid" => Ok(Role::Kid),
            other => Err(format!("unknown role \"{other}\"")),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Adult => write!(f, "Adult"),
            Role::Kid => write!(f, "Kid"),
        }
    }
}

/// The unique name a user logs in with.
///
/// Logins are stored lowercased so that "Alice" and "alice" are the same user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Login(String);

impl Login {
    /// Create a login from user input.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyField] if `login` is empty after trimming, or
    /// [Error::InvalidLogin] if it contains whitespace.
    pub fn new(login: &str) -> Result<Self, Error> {
        let login = login.trim();

        if login.is_empty() {
            return Err(Error::EmptyField("login"));
        }

        if login.chars().any(char::is_whitespace) {
            return Err(Error::InvalidLogin(login.to_owned()));
        }

        Ok(Self(login.to_lowercase()))
    }

    /// Create a login without validation.
    ///
    /// The caller should ensure that the string is a lowercase, non-empty login.
    pub fn new_unchecked(login: &str) -> Self {
        Self(login.to_owned())
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A first name or surname.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    /// Create a name, `field` is used in the error message.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyField] if `name` is empty after trimming.
    pub fn new(name: &str, field: &'static str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyField(field))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PersonName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated email address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// # Errors
    ///
    /// This function will return an error if `raw_email` is not a valid email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let raw_email = raw_email.trim();

        if EmailAddress::is_valid(raw_email) {
            Ok(Self(raw_email.to_owned()))
        } else {
            Err(Error::InvalidEmail(raw_email.to_owned()))
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted email address.
    /// For emails coming from the user, this function should **not** be used, instead use the checked version.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    pub name: PersonName,
    pub surname: PersonName,
    pub email: Email,
    pub login: Login,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    pub role: Role,
    /// The family the user belongs to, if any.
    pub family_id: Option<FamilyId>,
    /// The adult that created this user, only set for kids.
    pub parent_id: Option<UserID>,
    /// Blocked users cannot log in.
    pub is_blocked: bool,
    pub date_joined: OffsetDateTime,
}

impl User {
    pub fn is_adult(&self) -> bool {
        self.role == Role::Adult
    }

    /// The user's name and surname.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// The details needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: PersonName,
    pub surname: PersonName,
    pub email: Email,
    pub login: Login,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub family_id: Option<FamilyId>,
    pub parent_id: Option<UserID>,
}
