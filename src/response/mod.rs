//! Response aggregate
//!
//! Completed surveys: one response row plus one answer per question, and the
//! summary and chart views built on top of them.

pub mod service;
pub mod tree;

pub use service::ResponseService;
