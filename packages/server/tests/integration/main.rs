
mod channels;
mod gc;
mod manifest;
mod releases;
mod stats;
mod upload;
