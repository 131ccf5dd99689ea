//! Terminal output: banner, usage screen, error reports and spinners

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{announce, banner, notice, report_error, Usage};
pub use progress::TaskSpinner;
