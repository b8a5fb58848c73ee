pub mod credentials;
pub mod token;

pub use credentials::AllowSet;
pub use token::{ServiceClaims, SignedToken, TokenError, TokenIssuer, UserClaims};
