mod error;
mod progress;
mod tables;

pub use error::print_error;
pub use progress::Progress;
pub use tables::{print_build_report, print_check_results, print_record_summary, print_type_table};

#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub interactive: bool,
}

impl Context {
    pub fn detect() -> Self {
        Self {
            interactive: crate::io::stderr_is_tty(),
        }
    }

    pub fn with_quiet(self, quiet: bool) -> Self {
        if quiet {
            Self { interactive: false }
        } else {
            self
        }
    }
}
