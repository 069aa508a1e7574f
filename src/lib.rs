// 模組定義
pub mod assembly;
pub mod config;
pub mod domain_types;
pub mod encoder;
pub mod export;
pub mod receiver;
pub mod series;
pub mod storage;
pub mod transport;
pub mod utils;
