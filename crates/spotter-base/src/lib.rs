pub mod clock;
pub mod logging;
pub mod vec2;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use logging::{init_file_logger, init_stdout_logger, FileLogger, StdoutLogger};
pub use vec2::Vec2;

// Re-export log crate so downstream crates can use spotter_base::log::*
pub use log;
