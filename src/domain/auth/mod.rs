pub mod error;
pub mod jwt;
pub mod verifier;

pub use error::IdentityError;
pub use jwt::{Claims, JwtManager};
pub use verifier::{IdentityVerifier, JwtIdentityVerifier};
