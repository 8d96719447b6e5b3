//! Authentication: password hashing, signed session tokens and the session cookie.

mod config;
mod password;
mod session;
mod token;

pub use config::{SessionConfig, DEFAULT_COOKIE_MAX_AGE_DAYS, DEFAULT_COOKIE_NAME};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use session::SessionCookies;
pub use token::{Claims, TokenSigner};
