//! Cookie based authentication: logging in and out and guarding routes.

mod cookie;
mod forgot_password;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod token;

pub use cookie::{
    DEFAULT_COOKIE_DURATION, get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
};
pub use forgot_password::get_forgot_password_page;
pub use log_in::{LoginState, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx, auth_guard_json};
pub use redirect::normalize_redirect_url;
pub use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
