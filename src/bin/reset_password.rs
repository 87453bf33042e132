use std::{io, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use family_budget::{
    Login, PasswordHash, ValidatedPassword, get_user_by_login, update_user_password,
};

/// Set a new password for a family member who forgot theirs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The login of the user whose password should be reset.
    #[arg(long)]
    login: String,
}

fn main() {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        exit_with_error(format!("No database found at {db_path:?}"));
    }

    let conn = Connection::open(db_path).unwrap_or_else(|error| exit_with_error(error));
    let login = Login::new(&args.login).unwrap_or_else(|error| exit_with_error(error));
    let user = get_user_by_login(&login, &conn)
        .unwrap_or_else(|error| exit_with_error(format!("Could not find \"{login}\": {error}")));

    println!("Resetting the password of {} ({})", user.full_name(), user.login);

    let Some(password_hash) = prompt_new_password() else {
        println!("No password entered, nothing was changed.");
        return;
    };

    match update_user_password(user.id, &password_hash, &conn) {
        Ok(()) => println!("Password updated. {} can log in with it now.", user.name),
        Err(error) => exit_with_error(error),
    }
}

/// Ask for a new password until a strong one is entered twice.
///
/// Returns `None` if stdin is closed or cannot be read.
fn prompt_new_password() -> Option<PasswordHash> {
    loop {
        let password = read_password("New password: ")?;

        let validated = match ValidatedPassword::new(&password) {
            Ok(validated) => validated,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        if read_password("Repeat the new password: ")? != password {
            print_error("The passwords do not match, try again.");
            continue;
        }

        match PasswordHash::new(validated, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(format!("Could not hash the password: {error}")),
        }
    }
}

fn read_password(prompt: &str) -> Option<String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read the password: {error}"));
            None
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string());
}

fn exit_with_error(error: impl ToString) -> ! {
    print_error(error);
    exit(1);
}
