use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime, macros::datetime};

use expense_tracker::{
    Expense, NewAccount, PasswordHash, ValidatedPassword, count_expenses, create_expense,
    initialize_db, register_account,
};

/// A utility for creating a test database for the REST API server of expense_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The secret used to issue the test user's API key.
    #[arg(long, default_value = "test")]
    secret: String,
}

const TEST_USERNAME: &str = "test";
const TEST_PASSWORD: &str = "test";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let new_user = NewAccount {
        username: TEST_USERNAME.to_owned(),
        email: "test@example.com".to_owned(),
        first_name: "Test".to_owned(),
        last_name: "User".to_owned(),
        password: ValidatedPassword::new_unchecked(TEST_PASSWORD),
    }
    .into_new_user(PasswordHash::DEFAULT_COST)?;
    let (user, api_key) = register_account(new_user, &args.secret, &conn)?;

    println!("Creating test expenses...");

    let first_day = datetime!(2014 - 06 - 29 12:00 UTC);
    let samples = [
        ("Flights", Decimal::new(74_700, 2)),
        ("Lunch", Decimal::new(1_000, 2)),
        ("Coffee", Decimal::new(450, 2)),
        ("Groceries", Decimal::new(8_235, 2)),
        ("Bus fare", Decimal::new(500, 2)),
    ];

    for day in 0..28 {
        let (description, amount) = samples[day % samples.len()];
        let date: OffsetDateTime = first_day + Duration::days(day as i64 * 2);

        create_expense(user.id, Expense::build(amount, date, description), &conn)?;
    }

    println!(
        "Success! Created {} expenses for user '{}' (password '{TEST_PASSWORD}').",
        count_expenses(&conn)?,
        user.username
    );
    println!("Authorization: ApiKey {}:{}", user.username, api_key.key);

    Ok(())
}
