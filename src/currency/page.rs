//! The currency converter page.

use std::collections::BTreeMap;

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    AppState, Error,
    currency::{CurrencyClient, CurrencyCode},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        field_error,
    },
    navigation::NavBar,
};

/// The currency a conversion starts from unless the user picks another.
pub const DEFAULT_FROM_CURRENCY: &str = "PLN";

/// The state needed for the currency converter.
#[derive(Debug, Clone)]
pub struct CurrencyState {
    pub currency_client: CurrencyClient,
}

impl FromRef<AppState> for CurrencyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            currency_client: state.currency_client.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrencyForm {
    pub amount: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Default)]
struct CurrencyErrors {
    amount: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

struct Conversion {
    amount: f64,
    from: CurrencyCode,
    converted: f64,
    to: CurrencyCode,
}

fn currency_input(name: &str, label: &str, value: &str, error: Option<&str>) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type="text"
                name=(name)
                id=(name)
                value=(value)
                list="currency-codes"
                minlength="3"
                maxlength="3"
                autocomplete="off"
                required
                class=(FORM_TEXT_INPUT_STYLE);

            (field_error(name, error))
        }
    }
}

fn currency_form(
    form: &CurrencyForm,
    errors: &CurrencyErrors,
    conversion: Option<&Conversion>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::CURRENCY_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    type="number"
                    name="amount"
                    id="amount"
                    value=(form.amount)
                    step="0.01"
                    min="0.01"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error("amount", errors.amount.as_deref()))
            }

            (currency_input("from", "From", &form.from, errors.from.as_deref()))
            (currency_input("to", "To", &form.to, errors.to.as_deref()))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Convert" }

            @if let Some(conversion) = conversion {
                p id="currency-result" class="text-lg font-semibold text-center"
                {
                    (format!("{:.2} {}", conversion.amount, conversion.from))
                    " = "
                    (format!("{:.2} {}", conversion.converted, conversion.to))
                }
            }
        }
    }
}

fn currency_page(form: &CurrencyForm, currencies: &BTreeMap<String, String>) -> Markup {
    let nav_bar = NavBar::new(endpoints::CURRENCY_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Currency Converter" }

            (currency_form(form, &CurrencyErrors::default(), None))

            datalist id="currency-codes"
            {
                @for (code, name) in currencies {
                    option value=(code) { (name) }
                }
            }

            p class="mt-4 text-sm text-gray-500 dark:text-gray-400"
            {
                "Exchange rates are provided by the European Central Bank via Frankfurter."
            }
        }
    };

    base("Currency Converter", &content)
}

/// Render the currency converter page.
///
/// The list of supported currencies is only a suggestion, so the page still
/// renders when the exchange rate API cannot be reached.
pub async fn get_currency_page(State(state): State<CurrencyState>) -> Response {
    let currencies = state
        .currency_client
        .currencies()
        .await
        .inspect_err(|error| tracing::warn!("could not fetch supported currencies: {error}"))
        .unwrap_or_default();

    let form = CurrencyForm {
        from: DEFAULT_FROM_CURRENCY.to_owned(),
        ..Default::default()
    };

    currency_page(&form, &currencies).into_response()
}

/// Convert the amount in the form and render the form with the result.
pub async fn convert_currency_endpoint(
    State(state): State<CurrencyState>,
    Form(form): Form<CurrencyForm>,
) -> Response {
    let mut errors = CurrencyErrors::default();

    let amount = match form.amount.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Some(amount),
        Ok(amount) => {
            errors.amount = Some(Error::InvalidAmount(amount).to_string());
            None
        }
        Err(_) => {
            errors.amount = Some(format!("\"{}\" is not a number", form.amount.trim()));
            None
        }
    };
    let from = CurrencyCode::new(&form.from)
        .inspect_err(|error| errors.from = Some(error.to_string()))
        .ok();
    let to = CurrencyCode::new(&form.to)
        .inspect_err(|error| errors.to = Some(error.to_string()))
        .ok();

    let (Some(amount), Some(from), Some(to)) = (amount, from, to) else {
        return currency_form(&form, &errors, None).into_response();
    };

    match state.currency_client.convert(amount, &from, &to).await {
        Ok(converted) => {
            let form = CurrencyForm {
                amount: form.amount,
                from: from.to_string(),
                to: to.to_string(),
            };
            let conversion = Conversion {
                amount,
                from,
                converted,
                to,
            };

            currency_form(&form, &errors, Some(&conversion)).into_response()
        }
        Err(error) => {
            tracing::error!("Could not convert {amount} {from} to {to}: {error}");
            error.into_alert_response()
        }
    }
}
