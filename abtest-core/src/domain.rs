pub mod ids;
pub mod config;
pub mod sample;

pub use ids::*;
pub use config::*;
pub use sample::*;
