//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/categories/{category_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for instructions for resetting the user's password.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The page showing the user's profile, family and kids.
pub const PROFILE_VIEW: &str = "/profile";
/// The page for editing the user's name and email.
pub const EDIT_PROFILE_VIEW: &str = "/profile/edit";
/// The page for changing the user's password.
pub const CHANGE_PASSWORD_VIEW: &str = "/profile/password";
/// The page for deleting the user's account.
pub const DELETE_ACCOUNT_VIEW: &str = "/profile/delete";
/// The page for creating a kid account.
pub const NEW_KID_VIEW: &str = "/kids/new";
/// The page for creating a family.
pub const NEW_FAMILY_VIEW: &str = "/family/new";
/// The page for inviting someone to the family.
pub const INVITATIONS_VIEW: &str = "/family/invitations";
/// The page for joining a family with an access code or a request.
pub const JOIN_FAMILY_VIEW: &str = "/family/join";
/// The page for reviewing requests to join the family.
pub const JOIN_REQUESTS_VIEW: &str = "/family/join_requests";
/// The page listing categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing a category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page listing only expenses.
pub const EXPENSES_VIEW: &str = "/transactions/expenses";
/// The page listing only incomes.
pub const INCOMES_VIEW: &str = "/transactions/incomes";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing a transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The currency converter page.
pub const CURRENCY_VIEW: &str = "/currency";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to update the user's profile.
pub const PROFILE_API: &str = "/api/profile";
/// The route to change the user's password.
pub const CHANGE_PASSWORD_API: &str = "/api/profile/password";
/// The route to delete the user's account.
pub const DELETE_ACCOUNT_API: &str = "/api/profile/delete";
/// The route to create kid accounts.
pub const KIDS_API: &str = "/api/kids";
/// The route to block a kid.
pub const BLOCK_KID: &str = "/api/kids/{user_id}/block";
/// The route to unblock a kid.
pub const UNBLOCK_KID: &str = "/api/kids/{user_id}/unblock";
/// The route to create a family.
pub const FAMILIES_API: &str = "/api/families";
/// The route to create invitations.
pub const INVITATIONS_API: &str = "/api/family/invitations";
/// The route to join a family with an access code.
pub const JOIN_FAMILY_API: &str = "/api/family/join";
/// The route to ask to join a family.
pub const JOIN_REQUESTS_API: &str = "/api/family/join_requests";
/// The route to accept a join request.
pub const ACCEPT_JOIN_REQUEST: &str = "/api/family/join_requests/{request_id}/accept";
/// The route to reject a join request.
pub const REJECT_JOIN_REQUEST: &str = "/api/family/join_requests/{request_id}/reject";
/// The route to create a category.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to update or delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// JSON: transactions between two dates.
pub const REPORT_RANGE: &str = "/api/reports/range";
/// JSON: transactions of one kind between two dates.
pub const REPORT_RANGE_BY_KIND: &str = "/api/reports/range/{kind}";
/// JSON: transactions on or after a date.
pub const REPORT_SINCE: &str = "/api/reports/since";
/// JSON: transactions on or before a date.
pub const REPORT_UNTIL: &str = "/api/reports/until";
/// The route to convert an amount between currencies.
pub const CURRENCY_API: &str = "/api/currency";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
