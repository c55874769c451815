mod franchise_controller;

pub use franchise_controller::configure;
