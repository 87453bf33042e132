//! Families, the invitations for joining them and requests to join.

mod create;
mod db;
mod domain;
mod invitation;
mod join;
mod join_request;

pub use create::{create_family_endpoint, get_new_family_page};
pub use db::{
    create_family, create_family_tables, create_invitation, create_join_request,
    delete_join_request, get_family, get_family_by_name, get_family_invitations,
    get_invitation_by_code, get_join_request, get_pending_join_requests,
    mark_invitation_accepted, mark_join_request_accepted,
};
pub use domain::{
    ACCESS_CODE_LENGTH, AccessCode, Family, FamilyId, FamilyInvitation, FamilyName,
    INVITATION_DURATION, InvitationId, JoinRequest, JoinRequestId,
};
pub use invitation::{create_invitation_endpoint, get_invitations_page};
pub use join::{get_join_family_page, join_family_endpoint, join_family_with_code};
pub use join_request::{
    accept_join_request_endpoint, create_join_request_endpoint, get_join_requests_page,
    reject_join_request_endpoint,
};

pub(crate) use join::{get_invitation_family, get_usable_invitation};
pub(crate) use join_request::{
    JoinRequestRow, get_created_family, get_join_request_rows, join_requests_table,
};
