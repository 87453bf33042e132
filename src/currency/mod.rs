//! Converting between currencies with the Frankfurter exchange rate API.

mod client;
mod page;

pub use client::{CurrencyClient, CurrencyCode, DEFAULT_CURRENCY_API_URL};
pub use page::{DEFAULT_FROM_CURRENCY, convert_currency_endpoint, get_currency_page};
