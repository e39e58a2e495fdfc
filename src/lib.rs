//! Data layer for a small mentee tracker: students register for an access
//! key and record marks, mentor meetings and activities; mentors read every
//! student's records behind a shared password.
//!
//! The `menteed` binary exposes this crate to a UI process as newline-delimited
//! JSON requests on stdin and responses on stdout.

pub mod backup;
pub mod calc;
pub mod config;
pub mod csv_table;
pub mod db;
pub mod directory;
pub mod error;
pub mod ipc;
pub mod keygen;
pub mod mentor;
pub mod model;
pub mod records;
pub mod store;
