pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Batch, Franchise, StudentEnrollment, StudentRegistration};
pub use repositories::{FranchiseRepository, MySqlFranchiseRepository};
pub use services::FranchiseService;
