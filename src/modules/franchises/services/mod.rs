mod franchise_service;

pub use franchise_service::{BatchWithLedger, FranchiseService};
