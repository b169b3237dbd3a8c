pub mod pipeline;
pub mod report;
pub mod selector;

pub use pipeline::*;
pub use report::*;
pub use selector::*;
