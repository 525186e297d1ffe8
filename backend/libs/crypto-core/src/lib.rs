//! Token handling shared by BlockTube services.
//!
//! Identity is provisioned by an external provider; services only validate the
//! bearer tokens it issues and read the caller's profile claims from them.
pub mod jwt;

pub use jwt::{Claims, JwtValidator};
