//! Builders for test databases and the records tests need.

use rusqlite::Connection;
use time::{Date, macros::date};

use crate::{
    PasswordHash, ValidatedPassword,
    category::{Category, CategoryKind, CategoryName, create_category},
    family::{Family, FamilyName, create_family},
    initialize_db,
    transaction::{Transaction, TransactionKind, create_transaction},
    user::{Email, Login, NewUser, PersonName, Role, User, create_user, get_user_by_id},
};

/// The password of every user created with these helpers.
pub(crate) const TEST_PASSWORD: &str = "Turkeys go gobble gobble 42!";

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize_db(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn test_password_hash() -> PasswordHash {
    PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
        .expect("Could not hash test password")
}

/// An adult with the email "{login}@example.com".
pub(crate) fn new_test_user(login: &str) -> NewUser {
    NewUser {
        name: PersonName::new_unchecked(login),
        surname: PersonName::new_unchecked("Tester"),
        email: Email::new_unchecked(&format!("{login}@example.com")),
        login: Login::new_unchecked(login),
        password_hash: test_password_hash(),
        role: Role::Adult,
        family_id: None,
        parent_id: None,
    }
}

pub(crate) fn create_test_user(login: &str, connection: &Connection) -> User {
    create_user(new_test_user(login), connection).expect("Could not create test user")
}

/// A kid of `parent` in the parent's family, sharing the parent's email.
pub(crate) fn create_test_kid(login: &str, parent: &User, connection: &Connection) -> User {
    let mut kid = new_test_user(login);
    kid.email = parent.email.clone();
    kid.role = Role::Kid;
    kid.family_id = parent.family_id;
    kid.parent_id = Some(parent.id);

    create_user(kid, connection).expect("Could not create test kid")
}

/// Create a family for `creator` and return the family and the updated creator.
pub(crate) fn create_test_family(
    name: &str,
    creator: &User,
    connection: &Connection,
) -> (Family, User) {
    let family = create_family(FamilyName::new_unchecked(name), creator.id, connection)
        .expect("Could not create test family");
    let creator = get_user_by_id(creator.id, connection).expect("Could not get family creator");

    (family, creator)
}

pub(crate) fn create_test_category(
    name: &str,
    kind: CategoryKind,
    owner: &User,
    connection: &Connection,
) -> Category {
    create_category(CategoryName::new_unchecked(name), kind, owner.id, connection)
        .expect("Could not create test category")
}

pub(crate) fn create_test_transaction(
    owner: &User,
    kind: TransactionKind,
    amount: f64,
    date: Date,
    connection: &Connection,
) -> Transaction {
    create_transaction(
        Transaction::build(kind, amount, date, "test transaction"),
        owner.id,
        connection,
    )
    .expect("Could not create test transaction")
}

/// A date safely in the past for transactions.
pub(crate) fn past_date() -> Date {
    date!(2025 - 01 - 15)
}
