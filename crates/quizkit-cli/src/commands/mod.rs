pub mod grade;
pub mod init;
pub mod session;
pub mod summarize;
pub mod validate;
