//! Configuration, row types and key helpers shared by every Lambda

pub mod config;
pub mod keys;
pub mod models;
pub mod names;
