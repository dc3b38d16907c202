//! Terminal front end: progress display and directory selection

mod progress;
mod prompt;

pub use progress::{format_clock, format_progress_line, ProgressReporter};
pub use prompt::{resolve_directory, DirectoryChooser, DirectoryRole, TerminalChooser};
