mod config_reader;
mod file_utils;
mod logging;
mod request;
mod string_utils;
pub mod sys_utils;

pub use config_reader::*;
pub use file_utils::*;
pub use logging::*;
pub use request::*;
pub use string_utils::*;
pub use sys_utils::*;
