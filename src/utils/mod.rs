pub mod format;

pub use format::{format_bytes, progress_bar, record_line};
