//! Category editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        Category, CategoryId, CategoryName, domain::CategoryNameFormData, get_managed_category,
        update_category,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    user::{UserID, get_user_by_id},
};

/// The state needed for editing a category.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let category = get_managed_category(category_id, &user, &connection)?;

    Ok(edit_category_view(&category).into_response())
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form_data): Form<CategoryNameFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let category = match get_user_by_id(user_id, &connection)
        .and_then(|user| get_managed_category(category_id, &user, &connection))
    {
        Ok(category) => category,
        Err(Error::NotFound) => return Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => return error.into_alert_response(),
    };

    let name = match CategoryName::new(&form_data.name) {
        Ok(name) => name,
        Err(error) => {
            return edit_category_form_view(&category, &form_data.name, &format!("Error: {error}"))
                .into_response();
        }
    };

    match update_category(category_id, name, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::DuplicateCategoryName(_)) => {
            edit_category_form_view(&category, &form_data.name, &format!("Error: {error}"))
                .into_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(category: &Category) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let form = edit_category_form_view(category, category.name.as_ref(), "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Category", &content)
}

fn edit_category_form_view(category: &Category, name: &str, error_message: &str) -> Markup {
    let update_endpoint = endpoints::format_endpoint(endpoints::CATEGORY, category.id);

    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-2 text-sm text-gray-900 dark:text-white"
            {
                "Type:"
                span class=(CATEGORY_BADGE_STYLE) { (category.kind.label()) }
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE)
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Category" }
        }
    }
}

#[cfg(test)]
mod edit_category_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        Error,
        category::{
            Category, CategoryKind, domain::CategoryNameFormData, get_category,
            get_edit_category_page, update_category_endpoint,
        },
        endpoints,
        test_utils::{
            assert_content_type, assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, create_test_category, create_test_user, get_test_connection,
            must_get_form, parse_html_document, parse_html_fragment,
        },
        user::User,
    };

    use super::EditCategoryState;

    fn get_state() -> (EditCategoryState, User, Category) {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let category = create_test_category("Food", CategoryKind::Expense, &user, &connection);

        (
            EditCategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
            category,
        )
    }

    #[tokio::test]
    async fn get_edit_category_page_succeeds() {
        let (state, user, category) = get_state();

        let response = get_edit_category_page(Path(category.id), State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::CATEGORY, category.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Food");
        assert_form_submit_button_with_text(&form, "Update Category");
    }

    #[tokio::test]
    async fn get_edit_category_page_with_invalid_id_is_not_found() {
        let (state, user, _) = get_state();

        let result = get_edit_category_page(Path(999), State(state), Extension(user.id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn get_edit_category_page_of_stranger_is_forbidden() {
        let (state, _, category) = get_state();
        let stranger = create_test_user("eve", &state.db_connection.lock().unwrap());

        let result =
            get_edit_category_page(Path(category.id), State(state), Extension(stranger.id)).await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn update_category_endpoint_succeeds() {
        let (state, user, category) = get_state();
        let form = CategoryNameFormData {
            name: "Groceries".to_string(),
        };

        let response = update_category_endpoint(
            Path(category.id),
            State(state.clone()),
            Extension(user.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let updated = get_category(category.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(updated.name.as_ref(), "Groceries");
        assert_eq!(updated.kind, CategoryKind::Expense);
    }

    #[tokio::test]
    async fn update_category_endpoint_with_invalid_id_returns_not_found() {
        let (state, user, _) = get_state();
        let form = CategoryNameFormData {
            name: "Updated".to_string(),
        };

        let response =
            update_category_endpoint(Path(999), State(state), Extension(user.id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_category_endpoint_with_empty_name_returns_error() {
        let (state, user, category) = get_state();
        let form = CategoryNameFormData {
            name: "".to_string(),
        };

        let response = update_category_endpoint(
            Path(category.id),
            State(state),
            Extension(user.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: category name cannot be empty");
    }
}
