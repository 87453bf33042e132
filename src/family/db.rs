//! Database operations for families, invitations and join requests.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    error::is_unique_violation,
    family::{
        AccessCode, Family, FamilyId, FamilyInvitation, FamilyName, INVITATION_DURATION,
        InvitationId, JoinRequest, JoinRequestId,
    },
    user::UserID,
};

/// How many times to generate a new access code when the code is already used.
const MAX_ACCESS_CODE_ATTEMPTS: usize = 10;

/// Initialize the family, invitation and join request tables.
pub fn create_family_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS family (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_by INTEGER REFERENCES user(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS family_invitation (
            id INTEGER PRIMARY KEY,
            family_id INTEGER NOT NULL REFERENCES family(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            invited_by INTEGER REFERENCES user(id) ON DELETE SET NULL,
            access_code TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            accepted INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_invitation_family ON family_invitation(family_id);

        CREATE TABLE IF NOT EXISTS join_request (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            family_id INTEGER NOT NULL REFERENCES family(id) ON DELETE CASCADE,
            message TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            accepted INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, family_id)
        );

        CREATE INDEX IF NOT EXISTS idx_join_request_family ON join_request(family_id);",
    )?;

    Ok(())
}

/// Create a family and make `creator` its first member.
///
/// # Errors
///
/// Returns [Error::DuplicateFamilyName] if a family already uses `name`.
pub fn create_family(
    name: FamilyName,
    creator: UserID,
    connection: &Connection,
) -> Result<Family, Error> {
    let family = connection
        .prepare(
            "INSERT INTO family (name, created_by, created_at) VALUES (?1, ?2, ?3)
            RETURNING id, name, created_by, created_at",
        )?
        .query_row(
            (name.as_ref(), creator.as_i64(), OffsetDateTime::now_utc()),
            map_family_row,
        )
        .map_err(|error| {
            if is_unique_violation(&error, "family.name") {
                Error::DuplicateFamilyName(name.to_string())
            } else {
                error.into()
            }
        })?;

    connection.execute(
        "UPDATE user SET family_id = ?1 WHERE id = ?2",
        (family.id, creator.as_i64()),
    )?;

    Ok(family)
}

pub fn get_family(family_id: FamilyId, connection: &Connection) -> Result<Family, Error> {
    connection
        .prepare("SELECT id, name, created_by, created_at FROM family WHERE id = :id")?
        .query_row(&[(":id", &family_id)], map_family_row)
        .map_err(|error| error.into())
}

pub fn get_family_by_name(name: &FamilyName, connection: &Connection) -> Result<Family, Error> {
    connection
        .prepare("SELECT id, name, created_by, created_at FROM family WHERE name = :name")?
        .query_row(&[(":name", name.as_ref())], map_family_row)
        .map_err(|error| error.into())
}

fn map_family_row(row: &Row) -> Result<Family, rusqlite::Error> {
    let raw_name: String = row.get(1)?;
    let created_by: Option<i64> = row.get(2)?;

    Ok(Family {
        id: row.get(0)?,
        name: FamilyName::new_unchecked(&raw_name),
        created_by: created_by.map(UserID::new),
        created_at: row.get(3)?,
    })
}

const INVITATION_COLUMNS: &str =
    "id, family_id, email, invited_by, access_code, created_at, expires_at, accepted";

/// Create an invitation with a fresh access code that expires after
/// [INVITATION_DURATION].
pub fn create_invitation(
    family_id: FamilyId,
    email: &str,
    invited_by: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<FamilyInvitation, Error> {
    let mut statement = connection.prepare(&format!(
        "INSERT INTO family_invitation (family_id, email, invited_by, access_code, created_at, expires_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING {INVITATION_COLUMNS}"
    ))?;

    for _ in 0..MAX_ACCESS_CODE_ATTEMPTS {
        let access_code = AccessCode::generate();

        let result = statement.query_row(
            (
                family_id,
                email,
                invited_by.as_i64(),
                access_code.as_ref(),
                now,
                now + INVITATION_DURATION,
            ),
            map_invitation_row,
        );

        match result {
            Ok(invitation) => return Ok(invitation),
            Err(error) if is_unique_violation(&error, "family_invitation.access_code") => {
                tracing::debug!("access code {access_code} is already used, trying another");
            }
            Err(error) => return Err(error.into()),
        }
    }

    tracing::error!("could not generate a unique access code after {MAX_ACCESS_CODE_ATTEMPTS} attempts");
    Err(Error::InvalidAccessCode)
}

pub fn get_invitation_by_code(
    access_code: &AccessCode,
    connection: &Connection,
) -> Result<FamilyInvitation, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVITATION_COLUMNS} FROM family_invitation WHERE access_code = :code"
        ))?
        .query_row(&[(":code", access_code.as_ref())], map_invitation_row)
        .map_err(|error| error.into())
}

/// Get the invitations of a family, newest first.
pub fn get_family_invitations(
    family_id: FamilyId,
    connection: &Connection,
) -> Result<Vec<FamilyInvitation>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVITATION_COLUMNS} FROM family_invitation WHERE family_id = :family_id
            ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(&[(":family_id", &family_id)], map_invitation_row)?
        .map(|maybe_invitation| maybe_invitation.map_err(|error| error.into()))
        .collect()
}

pub fn mark_invitation_accepted(
    invitation_id: InvitationId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE family_invitation SET accepted = 1 WHERE id = ?1",
        [invitation_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidAccessCode);
    }

    Ok(())
}

fn map_invitation_row(row: &Row) -> Result<FamilyInvitation, rusqlite::Error> {
    let invited_by: Option<i64> = row.get(3)?;
    let raw_access_code: String = row.get(4)?;

    Ok(FamilyInvitation {
        id: row.get(0)?,
        family_id: row.get(1)?,
        email: row.get(2)?,
        invited_by: invited_by.map(UserID::new),
        access_code: AccessCode::new_unchecked(&raw_access_code),
        created_at: row.get(5)?,
        expires_at: row.get(6)?,
        accepted: row.get(7)?,
    })
}

const JOIN_REQUEST_COLUMNS: &str = "id, user_id, family_id, message, created_at, accepted";

/// Ask to join a family.
///
/// # Errors
///
/// Returns [Error::DuplicateJoinRequest] if the user already asked to join the family.
pub fn create_join_request(
    user_id: UserID,
    family_id: FamilyId,
    message: &str,
    connection: &Connection,
) -> Result<JoinRequest, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO join_request (user_id, family_id, message, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {JOIN_REQUEST_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                family_id,
                message,
                OffsetDateTime::now_utc(),
            ),
            map_join_request_row,
        )
        .map_err(|error| {
            if is_unique_violation(&error, "join_request.user_id") {
                Error::DuplicateJoinRequest
            } else {
                error.into()
            }
        })
}

pub fn get_join_request(
    request_id: JoinRequestId,
    connection: &Connection,
) -> Result<JoinRequest, Error> {
    connection
        .prepare(&format!(
            "SELECT {JOIN_REQUEST_COLUMNS} FROM join_request WHERE id = :id"
        ))?
        .query_row(&[(":id", &request_id)], map_join_request_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingJoinRequest,
            error => error.into(),
        })
}

/// Get the join requests of a family that have not been accepted, oldest first.
pub fn get_pending_join_requests(
    family_id: FamilyId,
    connection: &Connection,
) -> Result<Vec<JoinRequest>, Error> {
    connection
        .prepare(&format!(
            "SELECT {JOIN_REQUEST_COLUMNS} FROM join_request
            WHERE family_id = :family_id AND accepted = 0
            ORDER BY created_at ASC, id ASC"
        ))?
        .query_map(&[(":family_id", &family_id)], map_join_request_row)?
        .map(|maybe_request| maybe_request.map_err(|error| error.into()))
        .collect()
}

pub fn mark_join_request_accepted(
    request_id: JoinRequestId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE join_request SET accepted = 1 WHERE id = ?1",
        [request_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingJoinRequest);
    }

    Ok(())
}

pub fn delete_join_request(request_id: JoinRequestId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM join_request WHERE id = ?1", [request_id])?;

    if rows_affected == 0 {
        return Err(Error::MissingJoinRequest);
    }

    Ok(())
}

fn map_join_request_row(row: &Row) -> Result<JoinRequest, rusqlite::Error> {
    Ok(JoinRequest {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        family_id: row.get(2)?,
        message: row.get(3)?,
        created_at: row.get(4)?,
        accepted: row.get(5)?,
    })
}
