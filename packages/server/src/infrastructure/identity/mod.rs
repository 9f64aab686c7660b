//! Bearer credential verification.

mod hmac;

pub use self::hmac::{DEFAULT_TOKEN_TTL_MILLIS, HmacIdentityGateway, IdentityConfigError};
