pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{BatchFeeLedger, InstallmentTemplate, TemplateInput};
pub use repositories::{FeeRepository, MySqlFeeRepository};
pub use services::FeeService;
