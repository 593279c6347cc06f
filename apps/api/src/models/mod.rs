pub mod report;
pub mod subjects;
