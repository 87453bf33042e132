use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use family_budget::{
    CategoryKind, CategoryName, Email, FamilyName, Login, NewUser, PasswordHash, PersonName, Role,
    Transaction, TransactionKind, ValidatedPassword, create_category, create_family,
    create_transaction, create_user, initialize_db,
};

/// The password of every demo user.
const DEMO_PASSWORD: &str = "Demo budget 2025!";

/// A utility for creating a demo database for the family budget server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test users...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;

    let anna = create_user(
        NewUser {
            name: PersonName::new("Anna", "name")?,
            surname: PersonName::new("Kowalska", "surname")?,
            email: Email::new("anna@example.com")?,
            login: Login::new("anna")?,
            password_hash: password_hash.clone(),
            role: Role::Adult,
            family_id: None,
            parent_id: None,
        },
        &conn,
    )?;

    let family = create_family(FamilyName::new("Kowalscy")?, anna.id, &conn)?;

    let tomek = create_user(
        NewUser {
            name: PersonName::new("Tomek", "name")?,
            surname: PersonName::new("Kowalski", "surname")?,
            email: anna.email.clone(),
            login: Login::new("tomek")?,
            password_hash,
            role: Role::Kid,
            family_id: Some(family.id),
            parent_id: Some(anna.id),
        },
        &conn,
    )?;

    println!("Creating categories and transactions...");

    let salary = create_category(
        CategoryName::new("Salary")?,
        CategoryKind::Income,
        anna.id,
        &conn,
    )?;
    let groceries = create_category(
        CategoryName::new("Groceries")?,
        CategoryKind::Expense,
        anna.id,
        &conn,
    )?;
    let pocket_money = create_category(
        CategoryName::new("Pocket money")?,
        CategoryKind::Income,
        anna.id,
        &conn,
    )?;

    let today = OffsetDateTime::now_utc().date();
    let last_month = today - Duration::days(31);

    for (owner, kind, amount, date, description, category) in [
        (&anna, TransactionKind::Income, 6500.0, last_month, "Monthly salary", &salary),
        (&anna, TransactionKind::Income, 6500.0, today, "Monthly salary", &salary),
        (&anna, TransactionKind::Expense, 212.45, last_month, "Weekly shop", &groceries),
        (&anna, TransactionKind::Expense, 187.3, today, "Weekly shop", &groceries),
        (&tomek, TransactionKind::Income, 50.0, today, "Pocket money", &pocket_money),
    ] {
        create_transaction(
            Transaction::build(kind, amount, date, description).category_id(Some(category.id)),
            owner.id,
            &conn,
        )?;
    }

    println!("Success! Log in as \"anna\" or \"tomek\" with the password \"{DEMO_PASSWORD}\".");

    Ok(())
}
