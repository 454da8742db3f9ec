//! Survey aggregate
//!
//! A survey is written and read as one unit together with its questions and
//! the choices of its multiple choice questions.

pub mod service;
pub mod tree;

pub use service::SurveyService;
