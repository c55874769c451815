mod batch_fee_ledger;
mod installment_template;

pub use batch_fee_ledger::BatchFeeLedger;
pub use installment_template::{InstallmentTemplate, TemplateInput, MAX_TEMPLATES};
