//! Weekly crew timecards: job sites, per-day shift entries, submission and
//! foreman approval, served over actix-web with a MySQL store.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod model;
pub mod models;
pub mod routes;
pub mod timecard;
pub mod utils;
