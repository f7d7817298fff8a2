//! # Authentication
//!
//! Password hashing, session tokens, and the two middlewares built on
//! them: [`session::session_middleware`] for the JSON API and
//! [`page_guard::page_guard`] for page navigation.

pub mod page_guard;
pub mod password;
pub mod session;
pub mod token;

pub use page_guard::page_guard;
pub use password::{PasswordError, hash_password, verify_password};
pub use session::{
    SESSION_COOKIE, WorkspaceContext, authenticate, removal_cookie, session_cookie,
    session_middleware,
};
pub use token::{SessionClaims, TokenError, TokenService};
