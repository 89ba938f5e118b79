pub mod asset;
pub mod channel;
pub mod deployment_event;
pub mod release;
pub mod release_asset;
pub mod runtime_version;
