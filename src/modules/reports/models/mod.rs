mod franchise_fee_report;

pub use franchise_fee_report::{BatchFeeLine, FeeTotals, FranchiseFeeReport};
