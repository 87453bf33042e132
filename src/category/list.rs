//! Categories listing page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, CategoryId, CategoryKind, get_visible_categories},
    endpoints,
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
    user::{UserID, get_user_by_id},
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

struct CategoryRow {
    category: Category,
    transaction_count: u32,
}

/// Render the categories the user can see, grouped by kind.
///
/// Only adults get the links for creating, editing and deleting categories.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let categories = get_visible_categories(&user, None, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let transactions_per_category = count_transactions_per_category(&connection).inspect_err(
        |error| tracing::error!("Could not count transactions per category: {error}"),
    )?;

    let (expense_rows, income_rows): (Vec<_>, Vec<_>) = categories
        .into_iter()
        .map(|category| CategoryRow {
            transaction_count: *transactions_per_category.get(&category.id).unwrap_or(&0),
            category,
        })
        .partition(|row| row.category.kind == CategoryKind::Expense);

    Ok(categories_view(&expense_rows, &income_rows, user.is_adult()).into_response())
}

fn count_transactions_per_category(
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare(
            "SELECT category_id, COUNT(1) FROM \"transaction\"
            WHERE category_id IS NOT NULL GROUP BY category_id",
        )?
        .query_map((), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect();

    result.map_err(Error::from)
}

fn categories_view(
    expense_rows: &[CategoryRow],
    income_rows: &[CategoryRow],
    can_manage: bool,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-8 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }
                }

                (category_table(CategoryKind::Expense, expense_rows, can_manage))
                (category_table(CategoryKind::Income, income_rows, can_manage))
            }
        }
    );

    base("Categories", &content)
}

fn new_category_url(kind: CategoryKind) -> String {
    format!("{}?kind={}", endpoints::NEW_CATEGORY_VIEW, kind.as_str())
}

fn category_table(kind: CategoryKind, rows: &[CategoryRow], can_manage: bool) -> Markup {
    let new_category_url = new_category_url(kind);
    let column_count = if can_manage { 3 } else { 2 };

    let table_row = |row: &CategoryRow| {
        let category = &row.category;
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
        let delete_url = endpoints::format_endpoint(endpoints::CATEGORY, category.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? {} transaction(s) will be left without a category.",
            category.name, row.transaction_count
        );

        html!(
            tr class=(TABLE_ROW_STYLE) data-category-id=(category.id)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(CATEGORY_BADGE_STYLE) { (category.name) }
                }

                td class=(TABLE_CELL_STYLE) { (row.transaction_count) }

                @if can_manage {
                    td class=(TABLE_CELL_STYLE)
                    {
                        div class="flex gap-4"
                        {
                            (edit_delete_action_links(
                                &edit_url,
                                &delete_url,
                                &confirm_message,
                                "closest tr",
                                "delete",
                            ))
                        }
                    }
                }
            }
        )
    };

    html!(
        section class="space-y-2" data-kind=(kind.as_str())
        {
            header class="flex justify-between items-end"
            {
                h2 class="text-lg font-semibold" { (kind.label()) " Categories" }

                @if can_manage {
                    a href=(new_category_url) class=(LINK_STYLE) { "Create " (kind.label()) " Category" }
                }
            }

            div class="overflow-x-auto dark:bg-gray-800"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                            @if can_manage {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }
                    }

                    tbody
                    {
                        @for row in rows {
                            (table_row(row))
                        }

                        @if rows.is_empty() {
                            tr
                            {
                                td
                                    colspan=(column_count)
                                    class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                {
                                    "No " (kind.as_str()) " categories yet."
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod categories_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        category::{CategoryKind, get_categories_page},
        test_utils::{
            assert_valid_html, create_test_category, create_test_family, create_test_kid,
            create_test_transaction, create_test_user, get_test_connection, parse_html_document,
            past_date, select_text,
        },
        transaction::TransactionKind,
    };

    use super::{CategoriesPageState, count_transactions_per_category};

    #[tokio::test]
    async fn lists_family_categories_grouped_by_kind() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let (_, alice) = create_test_family("Smith", &alice, &connection);
        let bob = create_test_user("bob", &connection);
        create_test_category("Food", CategoryKind::Expense, &alice, &connection);
        create_test_category("Salary", CategoryKind::Income, &alice, &connection);
        create_test_category("Hidden", CategoryKind::Income, &bob, &connection);
        let state = CategoriesPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_categories_page(State(state), Extension(alice.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            select_text(&html, "section[data-kind=expense] tbody span"),
            vec!["Food"]
        );
        assert_eq!(
            select_text(&html, "section[data-kind=income] tbody span"),
            vec!["Salary"]
        );
    }

    #[tokio::test]
    async fn kids_see_categories_without_actions() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let (_, alice) = create_test_family("Smith", &alice, &connection);
        let kid = create_test_kid("timmy", &alice, &connection);
        create_test_category("Food", CategoryKind::Expense, &alice, &connection);
        let state = CategoriesPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_categories_page(State(state), Extension(kid.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(
            select_text(&html, "section[data-kind=expense] tbody span"),
            vec!["Food"]
        );
        let delete_buttons = Selector::parse("button[hx-delete]").unwrap();
        assert_eq!(html.select(&delete_buttons).count(), 0);
    }

    #[test]
    fn counts_transactions_per_category() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let food = create_test_category("Food", CategoryKind::Expense, &alice, &connection);
        for _ in 0..3 {
            create_test_transaction(&alice, TransactionKind::Expense, 5.0, past_date(), &connection);
        }
        connection
            .execute(
                "UPDATE \"transaction\" SET category_id = ?1 WHERE id <= 2",
                [food.id],
            )
            .unwrap();

        let counts = count_transactions_per_category(&connection).unwrap();

        assert_eq!(counts[&food.id], 2);
        assert_eq!(counts.len(), 1);
    }
}
