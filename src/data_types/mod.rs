pub mod axis;
pub mod config;
pub mod diff;
pub mod record;

pub use axis::*;
pub use config::*;
pub use diff::*;
pub use record::*;
