pub mod casts;
pub mod config;
pub mod data;
