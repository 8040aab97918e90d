//! Run orchestration: worker dispatch, termination, and the final report.
mod runner;
mod summary;
mod termination;


pub use runner::{RunReport, run_load};
pub use summary::{print_report, report_lines};
pub use termination::{StopReason, TerminationController};
