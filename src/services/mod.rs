pub mod download;
pub mod name_resolver;
pub mod progress;
pub mod storage;
pub mod upload;
