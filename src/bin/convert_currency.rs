use std::process::exit;

use clap::Parser;

use family_budget::{CurrencyClient, CurrencyCode, DEFAULT_CURRENCY_API_URL, DEFAULT_FROM_CURRENCY};

/// Convert an amount between currencies at the latest exchange rate.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The amount of money to convert, must be greater than zero.
    #[arg(long)]
    amount: Option<f64>,

    /// The three letter code of the currency to convert from.
    #[arg(long, default_value = DEFAULT_FROM_CURRENCY)]
    from: String,

    /// The three letter code of the currency to convert to.
    #[arg(long)]
    to: Option<String>,

    /// Print the supported currencies and exit.
    #[arg(long)]
    list: bool,

    /// The base URL of the Frankfurter exchange rate API.
    #[arg(long, default_value = DEFAULT_CURRENCY_API_URL)]
    currency_api_url: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let client = CurrencyClient::new(&args.currency_api_url);

    if args.list {
        match client.currencies().await {
            Ok(currencies) => {
                println!("Supported currencies:");
                for (code, name) in currencies {
                    println!("{code}: {name}");
                }
            }
            Err(error) => exit_with_error(error),
        }

        return;
    }

    let (Some(amount), Some(to)) = (args.amount, args.to) else {
        exit_with_error("both --amount and --to are required unless --list is given");
    };

    let from = CurrencyCode::new(&args.from).unwrap_or_else(|error| exit_with_error(error));
    let to = CurrencyCode::new(&to).unwrap_or_else(|error| exit_with_error(error));

    match client.convert(amount, &from, &to).await {
        Ok(converted) => println!("{amount:.2} {from} = {converted:.2} {to}"),
        Err(error) => exit_with_error(error),
    }
}

fn exit_with_error(error: impl ToString) -> ! {
    eprintln!("\x1b[31;1mError: {}\x1b[0m", error.to_string());
    exit(1);
}
