mod report;

pub use report::{NewReport, Report, ReportSeverity, ReportStatus, StatusCounts};
