mod report_controller;

pub use report_controller::{configure, franchise_fee_report};
