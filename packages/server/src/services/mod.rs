pub mod gc;
pub mod release;
pub mod upload;
pub mod webhook;
