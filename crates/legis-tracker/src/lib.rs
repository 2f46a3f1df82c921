//! Tracks Canadian federal bills through the legislative process.
//!
//! The tracker polls the LEGISinfo listing, keeps an append-only status
//! history per bill, marks bills that died when their parliament ended, and
//! enriches enacted bills with a chapter citation and coming-into-force status.

pub mod bills;
pub mod config;
pub mod error;
pub mod feed;
pub mod telemetry;
pub mod tracker;
