pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Installment, InstallmentStatus, StudentFeeLedger};
pub use repositories::{InstallmentRepository, MySqlInstallmentRepository};
pub use services::InstallmentService;
