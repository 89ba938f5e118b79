pub mod channel;
pub mod event;
pub mod release;
pub mod shared;
pub mod stats;
pub mod upload;
