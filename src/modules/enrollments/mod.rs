pub mod models;
pub mod repositories;

pub use models::CourseEnrollment;
pub use repositories::{CourseEnrollmentStore, MySqlCourseEnrollmentStore};
