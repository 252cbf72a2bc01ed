pub mod companies;
pub mod config;
pub mod data;
pub mod engine;
pub mod explore;
pub mod logging;
pub mod model;
pub mod stats;
pub mod trade;
