//! Authentication adapters.

mod jwt;
mod mock;

pub use jwt::{JwtTokenVerifier, JwtVerifierConfig};
pub use mock::MockTokenVerifier;
