pub mod authority;
pub mod code_provider;
pub mod credentials;
pub mod token;
