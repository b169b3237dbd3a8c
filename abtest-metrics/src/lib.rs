pub mod aggregators;
pub mod statistical;
mod shapiro;

pub use aggregators::*;
pub use statistical::*;
