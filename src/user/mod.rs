//! Users, their profiles and the kid accounts adults manage.

mod change_password;
mod db;
mod delete_account;
mod domain;
mod edit_profile;
mod kid;
mod profile;
mod register;

pub use change_password::{change_password_endpoint, get_change_password_page};
pub use db::{
    count_users, create_user, create_user_table, delete_user, family_or_self_ids,
    get_family_members, get_kids_of, get_user_by_id, get_user_by_login, set_user_blocked,
    set_user_family, update_user_password, update_user_profile, visible_user_ids,
};
pub use delete_account::{delete_account_endpoint, get_delete_account_page};
pub use domain::{Email, Login, NewUser, PersonName, Role, User, UserID};
pub use edit_profile::{get_edit_profile_page, update_profile_endpoint};
pub use kid::{block_kid_endpoint, create_kid_endpoint, get_new_kid_page, unblock_kid_endpoint};
pub use profile::get_profile_page;
pub use register::{get_register_page, register_user};

use crate::Error;

/// Check that `user` is an adult.
///
/// # Errors
///
/// Returns [Error::AdultOnly] for kids.
pub fn require_adult(user: &User) -> Result<(), Error> {
    if user.is_adult() {
        Ok(())
    } else {
        Err(Error::AdultOnly)
    }
}
