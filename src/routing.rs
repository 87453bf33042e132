//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, auth_guard_json, get_forgot_password_page, get_log_in_page,
        get_log_out, post_log_in,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, get_new_category_page, update_category_endpoint,
    },
    currency::{convert_currency_endpoint, get_currency_page},
    dashboard::{get_dashboard_page, get_index_page},
    endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    family::{
        accept_join_request_endpoint, create_family_endpoint, create_invitation_endpoint,
        create_join_request_endpoint, get_invitations_page, get_join_family_page,
        get_join_requests_page, get_new_family_page, join_family_endpoint,
        reject_join_request_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_edit_transaction_page,
        get_expenses_page, get_incomes_page, get_new_transaction_page, get_range_report,
        get_range_report_by_kind, get_since_report, get_transactions_page, get_until_report,
        update_transaction_endpoint,
    },
    user::{
        block_kid_endpoint, change_password_endpoint, create_kid_endpoint,
        delete_account_endpoint, get_change_password_page, get_delete_account_page,
        get_edit_profile_page, get_new_kid_page, get_profile_page, get_register_page,
        register_user, unblock_kid_endpoint, update_profile_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .route(endpoints::EDIT_PROFILE_VIEW, get(get_edit_profile_page))
        .route(
            endpoints::CHANGE_PASSWORD_VIEW,
            get(get_change_password_page),
        )
        .route(endpoints::DELETE_ACCOUNT_VIEW, get(get_delete_account_page))
        .route(endpoints::NEW_KID_VIEW, get(get_new_kid_page))
        .route(endpoints::NEW_FAMILY_VIEW, get(get_new_family_page))
        .route(endpoints::INVITATIONS_VIEW, get(get_invitations_page))
        .route(endpoints::JOIN_FAMILY_VIEW, get(get_join_family_page))
        .route(endpoints::JOIN_REQUESTS_VIEW, get(get_join_requests_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::INCOMES_VIEW, get(get_incomes_page))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_new_transaction_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::CURRENCY_VIEW, get(get_currency_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::PROFILE_API, put(update_profile_endpoint))
            .route(
                endpoints::CHANGE_PASSWORD_API,
                post(change_password_endpoint),
            )
            .route(endpoints::DELETE_ACCOUNT_API, post(delete_account_endpoint))
            .route(endpoints::KIDS_API, post(create_kid_endpoint))
            .route(endpoints::BLOCK_KID, post(block_kid_endpoint))
            .route(endpoints::UNBLOCK_KID, post(unblock_kid_endpoint))
            .route(endpoints::FAMILIES_API, post(create_family_endpoint))
            .route(endpoints::INVITATIONS_API, post(create_invitation_endpoint))
            .route(endpoints::JOIN_FAMILY_API, post(join_family_endpoint))
            .route(
                endpoints::JOIN_REQUESTS_API,
                post(create_join_request_endpoint),
            )
            .route(
                endpoints::ACCEPT_JOIN_REQUEST,
                post(accept_join_request_endpoint),
            )
            .route(
                endpoints::REJECT_JOIN_REQUEST,
                post(reject_join_request_endpoint),
            )
            .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
            .route(
                endpoints::CATEGORY,
                put(update_category_endpoint).delete(delete_category_endpoint),
            )
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::CURRENCY_API, post(convert_currency_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    // The JSON reports answer 401 with a JSON body instead of redirecting.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::REPORT_RANGE, get(get_range_report))
            .route(endpoints::REPORT_RANGE_BY_KIND, get(get_range_report_by_kind))
            .route(endpoints::REPORT_SINCE, get(get_since_report))
            .route(endpoints::REPORT_UNTIL, get(get_until_report))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_guard_json,
            )),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
