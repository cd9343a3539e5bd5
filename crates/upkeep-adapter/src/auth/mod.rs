/*
[INPUT]:  Operator credentials
[OUTPUT]: Session tokens and auth errors
[POS]:    Auth layer - handles maintenance API authentication
[UPDATE]: When auth flow changes
*/

pub mod jwt;
pub mod manager;

pub use jwt::{TokenData, TokenManager, decode_expiry};
pub use manager::AuthManager;
