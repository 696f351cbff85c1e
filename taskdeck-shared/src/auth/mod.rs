//! Authentication and authorization
//!
//! - `password`: Argon2id password hashing and verification
//! - `jwt`: access-token issuance and validation (HS256)
//! - `middleware`: the authenticated-request context injected by the API
//! - `policy`: the access policy engine, every permission rule in one place

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
