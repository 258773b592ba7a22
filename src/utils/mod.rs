pub mod crypto;
pub mod jwt;
pub mod pkce;
pub mod scope;
pub mod secret;
