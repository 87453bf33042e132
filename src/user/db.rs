//! Database operations for users.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::OffsetDateTime;

use crate::{
    Error, PasswordHash,
    error::is_unique_violation,
    family::FamilyId,
    user::{Email, Login, NewUser, PersonName, Role, User, UserID},
};

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// Create the user table.
///
/// Adults must have unique emails, kids may share their parent's email.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            surname TEXT NOT NULL,
            email TEXT NOT NULL,
            login TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('adult', 'kid')),
            family_id INTEGER REFERENCES family(id) ON DELETE SET NULL,
            parent_id INTEGER REFERENCES user(id) ON DELETE SET NULL,
            is_blocked INTEGER NOT NULL DEFAULT 0,
            date_joined TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_user_adult_email ON user(email) WHERE role = 'adult';
        CREATE INDEX IF NOT EXISTS idx_user_family ON user(family_id);
        CREATE INDEX IF NOT EXISTS idx_user_parent ON user(parent_id);",
    )?;

    Ok(())
}

const USER_COLUMNS: &str = "id, name, surname, email, login, password, role, family_id, \
    parent_id, is_blocked, date_joined";

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateLogin] if the login is taken,
/// - [Error::DuplicateEmail] if an adult already uses the email,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let date_joined = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO user (name, surname, email, login, password, role, family_id, parent_id, date_joined)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                new_user.name.as_ref(),
                new_user.surname.as_ref(),
                new_user.email.as_ref(),
                new_user.login.as_ref(),
                new_user.password_hash.as_ref(),
                new_user.role,
                new_user.family_id,
                new_user.parent_id.map(|id| id.as_i64()),
                date_joined,
            ),
            map_row,
        )
        .map_err(|error| map_unique_error(error, &new_user.login, &new_user.email))
}

fn map_unique_error(error: rusqlite::Error, login: &Login, email: &Email) -> Error {
    if is_unique_violation(&error, "user.login") {
        Error::DuplicateLogin(login.to_string())
    } else if is_unique_violation(&error, "user.email") {
        Error::DuplicateEmail(email.to_string())
    } else {
        error.into()
    }
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user with the (already normalised) `login`.
pub fn get_user_by_login(login: &Login, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE login = :login"
        ))?
        .query_row(&[(":login", login.as_ref())], map_row)
        .map_err(|error| error.into())
}

/// Get every member of a family, adults first then by name.
pub fn get_family_members(family_id: FamilyId, connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE family_id = :family_id
            ORDER BY role ASC, name ASC, id ASC"
        ))?
        .query_map(&[(":family_id", &family_id)], map_row)?
        .map(|maybe_user| maybe_user.map_err(|error| error.into()))
        .collect()
}

/// Get the kids created by `parent_id`.
pub fn get_kids_of(parent_id: UserID, connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE parent_id = :parent_id AND role = 'kid'
            ORDER BY name ASC, id ASC"
        ))?
        .query_map(&[(":parent_id", &parent_id.as_i64())], map_row)?
        .map(|maybe_user| maybe_user.map_err(|error| error.into()))
        .collect()
}

/// Move a user into `family_id`, or out of any family with `None`.
pub fn set_user_family(
    user_id: UserID,
    family_id: Option<FamilyId>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET family_id = ?1 WHERE id = ?2",
        (family_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingUser);
    }

    Ok(())
}

pub fn set_user_blocked(
    user_id: UserID,
    is_blocked: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET is_blocked = ?1 WHERE id = ?2",
        (is_blocked, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingUser);
    }

    Ok(())
}

/// Update the name, surname and email of a user.
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if another adult uses `email` and
/// [Error::UpdateMissingUser] if the user does not exist.
pub fn update_user_profile(
    user_id: UserID,
    name: &PersonName,
    surname: &PersonName,
    email: &Email,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE user SET name = ?1, surname = ?2, email = ?3 WHERE id = ?4",
            (
                name.as_ref(),
                surname.as_ref(),
                email.as_ref(),
                user_id.as_i64(),
            ),
        )
        .map_err(|error| {
            if is_unique_violation(&error, "user.email") {
                Error::DuplicateEmail(email.to_string())
            } else {
                error.into()
            }
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingUser);
    }

    Ok(())
}

pub fn update_user_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingUser);
    }

    Ok(())
}

/// Delete a user along with their transactions, categories and join requests.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingUser);
    }

    Ok(())
}

/// The IDs of the users whose transactions `user` may see.
///
/// Adults in a family see the whole family, everyone else only sees themselves.
pub fn visible_user_ids(user: &User, connection: &Connection) -> Result<Vec<UserID>, Error> {
    match (user.role, user.family_id) {
        (Role::Adult, Some(family_id)) => family_member_ids(family_id, connection),
        _ => Ok(vec![user.id]),
    }
}

/// The IDs of the users in the same family as `user`, or just `user` when
/// they do not belong to a family.
pub fn family_or_self_ids(user: &User, connection: &Connection) -> Result<Vec<UserID>, Error> {
    match user.family_id {
        Some(family_id) => family_member_ids(family_id, connection),
        None => Ok(vec![user.id]),
    }
}

fn family_member_ids(family_id: FamilyId, connection: &Connection) -> Result<Vec<UserID>, Error> {
    connection
        .prepare("SELECT id FROM user WHERE family_id = :family_id ORDER BY id")?
        .query_map(&[(":family_id", &family_id)], |row| {
            row.get(0).map(UserID::new)
        })?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_name: String = row.get(1)?;
    let raw_surname: String = row.get(2)?;
    let raw_email: String = row.get(3)?;
    let raw_login: String = row.get(4)?;
    let raw_password_hash: String = row.get(5)?;
    let parent_id: Option<i64> = row.get(8)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: PersonName::new_unchecked(&raw_name),
        surname: PersonName::new_unchecked(&raw_surname),
        email: Email::new_unchecked(&raw_email),
        login: Login::new_unchecked(&raw_login),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role: row.get(6)?,
        family_id: row.get(7)?,
        parent_id: parent_id.map(UserID::new),
        is_blocked: row.get(9)?,
        date_joined: row.get(10)?,
    })
}
