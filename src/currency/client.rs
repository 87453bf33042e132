//! A client for the Frankfurter exchange rate API.

use std::{collections::BTreeMap, fmt::Display};

use serde::Deserialize;

use crate::Error;

/// The public Frankfurter API.
pub const DEFAULT_CURRENCY_API_URL: &str = "https://api.frankfurter.app";

/// A three letter currency code such as "PLN", always uppercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, ignoring surrounding whitespace and case.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCurrencyCode] if `raw` is not exactly three ASCII letters.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let code = raw.trim();

        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(Error::InvalidCurrencyCode(code.to_owned()))
        }
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: BTreeMap<String, f64>,
}

/// HTTP client for the exchange rate API.
#[derive(Debug, Clone)]
pub struct CurrencyClient {
    client: reqwest::Client,
    api_url: String,
}

impl CurrencyClient {
    /// Create a client for the API at `api_url`, e.g. [DEFAULT_CURRENCY_API_URL].
    pub fn new(api_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Convert `amount` of `from` into `to` at the latest rate.
    ///
    /// Converting a currency into itself returns `amount` without calling the API.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `amount` is not a positive number, or
    /// [Error::CurrencyApi] if the request fails or the response has no rate for `to`.
    pub async fn convert(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<f64, Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        if from == to {
            return Ok(amount);
        }

        let amount_param = amount.to_string();
        let response = self
            .client
            .get(format!("{}/latest", self.api_url))
            .query(&[
                ("amount", amount_param.as_str()),
                ("from", from.as_ref()),
                ("to", to.as_ref()),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let latest: LatestRates = parse_response(response).await?;

        latest.rates.get(to.as_ref()).copied().ok_or_else(|| {
            Error::CurrencyApi(format!("the response did not include a rate for {to}"))
        })
    }

    /// The currencies the API supports, as a map of codes to names.
    ///
    /// # Errors
    ///
    /// Returns [Error::CurrencyApi] if the request fails.
    pub async fn currencies(&self) -> Result<BTreeMap<String, String>, Error> {
        let response = self
            .client
            .get(format!("{}/currencies", self.api_url))
            .send()
            .await
            .map_err(request_error)?;

        parse_response(response).await
    }
}

fn request_error(error: reqwest::Error) -> Error {
    tracing::error!("request to the exchange rate API failed: {error}");
    Error::CurrencyApi(error.to_string())
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, Error> {
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_owned());
        tracing::error!("the exchange rate API responded with {status}: {body}");

        return Err(Error::CurrencyApi(format!("{status} {body}")));
    }

    response.json::<T>().await.map_err(request_error)
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn latest(Query(params): Query<HashMap<String, String>>) -> Response {
        let amount: f64 = params
            .get("amount")
            .and_then(|amount| amount.parse().ok())
            .unwrap_or(1.0);
        let from = params.get("from").map(String::as_str).unwrap_or("EUR");
        let to = params.get("to").map(String::as_str).unwrap_or("");

        match (from, to) {
            ("PLN", "EUR") => Json(json!({
                "amount": amount,
                "base": "PLN",
                "date": "2025-01-15",
                "rates": { "EUR": amount / 4.0 }
            }))
            .into_response(),
            ("PLN", "USD") => Json(json!({
                "amount": amount,
                "base": "PLN",
                "date": "2025-01-15",
                "rates": {}
            }))
            .into_response(),
            _ => (StatusCode::NOT_FOUND, r#"{"message":"not found"}"#).into_response(),
        }
    }

    async fn currencies() -> Json<serde_json::Value> {
        Json(json!({ "EUR": "Euro", "PLN": "Polish Złoty" }))
    }

    /// Start a fake exchange rate API where 1 EUR costs 4 PLN and return its URL.
    ///
    /// PLN to USD answers without a rate, every other pair answers 404.
    pub(crate) async fn start_fake_currency_api() -> String {
        let app = Router::new()
            .route("/latest", get(latest))
            .route("/currencies", get(currencies));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind fake currency API");
        let address = listener
            .local_addr()
            .expect("Could not get fake currency API address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake currency API stopped");
        });

        format!("http://{address}")
    }
}
