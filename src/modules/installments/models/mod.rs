mod fee_summary;
mod installment;
mod payment;
mod schedule_edit;
mod student_fee_ledger;

pub use fee_summary::{FeeSummary, NextDue};
pub use installment::{Installment, InstallmentStatus};
pub use payment::Payment;
pub use schedule_edit::{
    EditPlan, InstallmentChange, MaterializeOutcome, NewInstallment, ScheduleEdit,
    ScheduleState, StatusUpdate,
};
pub use student_fee_ledger::StudentFeeLedger;
