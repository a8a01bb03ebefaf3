pub mod config;
pub mod instant;
pub mod task;

pub use config::*;
pub use instant::*;
pub use task::*;
