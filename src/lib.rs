//! Job application tracker: a SQLite-backed store of job applications with
//! validated CRUD, status filtering, keyword search, summary statistics and
//! CSV export, served over HTTP and a command line.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
