pub mod admin;
pub mod assets;
pub mod channel;
pub mod manifest;
pub mod release;
pub mod stats;
pub mod upload;
