mod balance_calculator;
mod installment_scheduler;
mod installment_service;
mod schedule_editor;

pub use balance_calculator::BalanceCalculator;
pub use installment_scheduler::InstallmentScheduler;
pub use installment_service::InstallmentService;
pub use schedule_editor::{ScheduleDiff, ScheduleEditor};
