//! HTTP handlers for all web routes.

pub mod health;
pub mod history;
pub mod papers;
pub mod qa;
