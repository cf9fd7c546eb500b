//! Credentials, bearer tokens and the ownership rules built on them.

pub mod access;
pub mod password;
pub mod token;

pub use access::{authorize_owner_or_admin, ensure_admin, ensure_owner_or_admin, require_admin};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKind, TokenService};
