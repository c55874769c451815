mod batch;
mod franchise;
mod student;

pub use batch::{Batch, NewBatch};
pub use franchise::{Franchise, FranchiseInput, MAX_LOCATION_LENGTH, MAX_NAME_LENGTH};
pub use student::{
    BatchEnrollment, BatchStudent, RegistrationInput, StudentEnrollment, StudentRegistration,
};
