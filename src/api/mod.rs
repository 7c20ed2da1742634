pub mod job_site;
pub mod timecard;
