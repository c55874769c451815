mod course_enrollment;

pub use course_enrollment::CourseEnrollment;
