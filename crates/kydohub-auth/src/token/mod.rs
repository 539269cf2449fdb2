//! Session token signing and verification.

pub mod claims;
pub mod codec;
pub mod error;
pub mod identity;

pub use claims::Claims;
pub use codec::TokenCodec;
pub use error::TokenError;
pub use identity::{IdentityClaims, IdentityVerifier};
