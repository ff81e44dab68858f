//! Library catalog and loan lifecycle service
//!
//! Books are registered in a catalog with unique ISBNs, loaned to customers one active
//! loan at a time, and a periodic sweep notifies customers whose loans are overdue.

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
