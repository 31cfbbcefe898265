pub mod config;
pub mod logging;

pub mod fetch;
pub mod naming;
pub mod normalize;
pub mod pipeline;
pub mod storage;
pub mod table;
pub mod upload;
