pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::FranchiseFeeReport;
pub use repositories::{MySqlReportRepository, ReportRepository};
pub use services::ReportService;
