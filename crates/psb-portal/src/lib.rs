//! Public Service Board recruitment portal.
//!
//! Job postings and notices for the public, a profile wizard and applications for applicants,
//! and review dashboards for the board and administrators, served as a JSON API over a
//! relational store.

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod notices;
pub mod otp;
pub mod profile;
pub mod reference;
pub mod schema;
pub mod storage;
pub mod telemetry;
pub mod uploads;
pub mod validation;
pub mod workflow;
