//! Output: terminal summaries and the analysis report file

mod console;
pub mod report;

pub use console::{ColorScheme, ConsoleFormatter};
pub use report::{render_report, ReportGenerator, ReportInput, REPORT_FILE};
