pub mod backlog;
pub mod log_sink;

pub use backlog::ImageBacklog;
pub use log_sink::LogSinks;
