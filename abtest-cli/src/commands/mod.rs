pub mod analyze;
pub mod config;
pub mod describe;
pub mod ztest;
