//! Chat commands: parsing and reply formatting.

mod format;
mod parser;

pub use format::{format_file_list, format_status, progress_bar, PROGRESS_BAR_WIDTH};
pub use parser::Command;
