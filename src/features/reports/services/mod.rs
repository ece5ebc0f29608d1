pub mod heatmap;
mod report_service;

pub use report_service::{ReportService, Resolution};
