//! Database operations for categories.

use rusqlite::{
    Connection, Row, ToSql, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryId, CategoryKind, CategoryName},
    error::is_unique_violation,
    user::{User, UserID, family_or_self_ids, require_adult},
};

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, kind, name)
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

const CATEGORY_COLUMNS: &str = "id, name, kind, user_id, created_at";

/// Create a category owned by `owner` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if `owner` already has a category
/// of the same kind called `name`.
pub fn create_category(
    name: CategoryName,
    kind: CategoryKind,
    owner: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO category (name, kind, user_id, created_at) VALUES (?1, ?2, ?3, ?4)
            RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (name.as_ref(), kind, owner.as_i64(), OffsetDateTime::now_utc()),
            map_row,
        )
        .map_err(|error| map_unique_error(error, &name))
}

fn map_unique_error(error: rusqlite::Error, name: &CategoryName) -> Error {
    if is_unique_violation(&error, "category.name") {
        Error::DuplicateCategoryName(name.to_string())
    } else {
        error.into()
    }
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id;"
        ))?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the categories owned by any of `owners`, optionally only those of `kind`.
///
/// Expense categories come before income categories, each sorted by name.
pub fn get_categories_owned_by(
    owners: &[UserID],
    kind: Option<CategoryKind>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    if owners.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = std::iter::repeat_n("?", owners.len())
        .collect::<Vec<_>>()
        .join(", ");
    let kind_clause = if kind.is_some() { "AND kind = ?" } else { "" };
    let query = format!(
        "SELECT {CATEGORY_COLUMNS} FROM category
        WHERE user_id IN ({placeholders}) {kind_clause}
        ORDER BY kind ASC, name ASC, id ASC;"
    );

    let owner_ids: Vec<i64> = owners.iter().map(UserID::as_i64).collect();
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(owner_ids.len() + 1);
    for owner_id in &owner_ids {
        params.push(owner_id);
    }
    if let Some(kind) = &kind {
        params.push(kind);
    }

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// The categories `user` can use: their own and those of their family.
pub fn get_visible_categories(
    user: &User,
    kind: Option<CategoryKind>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let owners = family_or_self_ids(user, connection)?;

    get_categories_owned_by(&owners, kind, connection)
}

/// Get a category that `user` is allowed to change.
///
/// # Errors
///
/// Returns [Error::AdultOnly] for kids, [Error::NotFound] if the category does
/// not exist and [Error::Forbidden] if it belongs to someone outside of the
/// user's family.
pub fn get_managed_category(
    category_id: CategoryId,
    user: &User,
    connection: &Connection,
) -> Result<Category, Error> {
    require_adult(user)?;

    let category = get_category(category_id, connection)?;
    let owners = family_or_self_ids(user, connection)?;

    if owners.contains(&category.user_id) {
        Ok(category)
    } else {
        Err(Error::Forbidden)
    }
}

/// Update a category's name. Returns an error if category doesn't exist.
pub fn update_category(
    category_id: CategoryId,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1 WHERE id = ?2",
            (new_name.as_ref(), category_id),
        )
        .map_err(|error| map_unique_error(error, &new_name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category by ID. Returns an error if the category doesn't exist.
///
/// Transactions in the category are kept and lose their category.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        kind: row.get(2)?,
        user_id: UserID::new(row.get(3)?),
        created_at: row.get(4)?,
    })
}
