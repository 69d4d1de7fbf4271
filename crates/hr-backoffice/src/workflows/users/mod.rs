//! Operator administration: listing the accounts behind the credential verifier and revoking
//! them.

pub mod router;
pub mod service;

pub use router::{users_router, UsersApi};
pub use service::{UserAdminError, UserAdminService};
