//! The transaction form shared by the create and edit pages, and the checks
//! applied to a submitted form.

use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryKind, get_visible_categories},
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    timezone::get_local_offset,
    transaction::{Transaction, TransactionBuilder, TransactionKind},
    user::User,
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    /// The value of the transaction in the family's currency.
    pub amount: f64,
    /// The date when the transaction ocurred.
    pub date: Date,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// Today's date in `local_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone.
pub fn local_today(local_timezone: &str) -> Result<Date, Error> {
    let Some(local_offset) = get_local_offset(local_timezone) else {
        tracing::error!("Invalid timezone {local_timezone}");
        return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
    };

    Ok(OffsetDateTime::now_utc().to_offset(local_offset).date())
}

/// Check a submitted form for `user` and turn it into a [TransactionBuilder].
///
/// # Errors
/// - [Error::FutureDate] if the date is after `today`,
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::InvalidCategory] if the category is not visible to `user` or is
///   for the other kind of transaction.
pub fn validate_transaction_form(
    form: &TransactionForm,
    user: &User,
    today: Date,
    connection: &Connection,
) -> Result<TransactionBuilder, Error> {
    if form.date > today {
        tracing::warn!("User {} tried to use the future date {}", user.id, form.date);
        return Err(Error::FutureDate(form.date));
    }

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Err(Error::InvalidAmount(form.amount));
    }

    if let Some(category_id) = form.category_id {
        let matches_category = get_visible_categories(user, Some(form.kind.category_kind()), connection)?
            .iter()
            .any(|category| category.id == category_id);

        if !matches_category {
            return Err(Error::InvalidCategory(Some(category_id)));
        }
    }

    Ok(
        Transaction::build(form.kind, form.amount, form.date, form.description.trim())
            .category_id(form.category_id),
    )
}

pub struct TransactionFormDefaults<'a> {
    pub kind: TransactionKind,
    pub amount: Option<f64>,
    pub date: Date,
    pub description: Option<&'a str>,
    pub category_id: Option<CategoryId>,
    pub max_date: Date,
    pub autofocus_amount: bool,
}

fn kind_radio(kind: TransactionKind, selected: TransactionKind) -> Markup {
    let id = format!("transaction-kind-{}", kind.as_str());

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="kind"
                id=(id)
                type="radio"
                value=(kind.as_str())
                checked[kind == selected]
                required
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label
                for=(id)
                class=(FORM_RADIO_LABEL_STYLE)
            {
                (kind.label())
            }
        }
    }
}

fn category_options(
    label: &str,
    kind: CategoryKind,
    categories: &[Category],
    selected: Option<CategoryId>,
) -> Markup {
    html! {
        optgroup label=(label) data-kind=(kind.as_str())
        {
            @for category in categories.iter().filter(|category| category.kind == kind) {
                option value=(category.id) selected[Some(category.id) == selected] { (category.name) }
            }
        }
    }
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    available_categories: &[Category],
) -> Markup {
    let amount_str = defaults.amount.map(|amount| format!("{:.2}", amount.abs()));
    let amount_placeholder = amount_str.as_deref().unwrap_or("0.01");
    let description_placeholder = defaults.description.unwrap_or("Description");

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Transaction type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                (kind_radio(TransactionKind::Expense, defaults.kind))
                (kind_radio(TransactionKind::Income, defaults.kind))
            }
        }

        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            input
                name="amount"
                id="amount"
                type="number"
                step="0.01"
                placeholder=(amount_placeholder)
                min="0.01"
                required
                value=[amount_str.as_deref()]
                autofocus[defaults.autofocus_amount]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="description"
                class=(FORM_LABEL_STYLE)
            {
                "Description"
            }

            input
                name="description"
                id="description"
                type="text"
                placeholder=(description_placeholder)
                value=[defaults.description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        @if !available_categories.is_empty() {
            div
            {
                label
                    for="category_id"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category"
                }

                select
                    name="category_id"
                    id="category_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "No category" }

                    (category_options("Expense", CategoryKind::Expense, available_categories, defaults.category_id))
                    (category_options("Income", CategoryKind::Income, available_categories, defaults.category_id))
                }
            }
        }
    }
}
