//! Bearer-token authentication.

pub mod extractor;
pub mod jwt;

pub use extractor::{AuthUser, MaybeAuthUser};
pub use jwt::{Claims, JwtKeys};
