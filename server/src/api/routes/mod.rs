//! API route handlers

pub mod employees;
pub mod health;
pub mod timezones;
pub mod views;
