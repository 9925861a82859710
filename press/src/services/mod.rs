pub mod log_file;
pub mod pipeline;
pub mod press_line;

pub use log_file::DailyLogLayer;
pub use pipeline::PlatePipeline;
pub use press_line::PressLine;
