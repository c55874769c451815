mod course_enrollment_store;

pub use course_enrollment_store::{CourseEnrollmentStore, MySqlCourseEnrollmentStore};
