pub mod catalog;
pub mod otp;
pub mod result;

pub use catalog::{Department, NewDepartmentRequest, NewSemesterRequest, NewSubjectRequest, Semester, Subject};
pub use otp::OtpRecord;
pub use result::{NewSemesterResult, ResultKey, SaveResultRequest, SemesterResult};
