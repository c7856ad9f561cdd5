pub mod claims;
pub mod nonce;
