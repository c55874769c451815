mod fee_service;

pub use fee_service::FeeService;
