pub mod job_site;
pub mod role;
pub mod timecard;
