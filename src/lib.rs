pub mod config;
pub mod judge;
