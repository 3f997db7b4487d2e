//! Sunday Pay library crate.
//!
//! This crate estimates how a move from bank-paid Sunday shifts to
//! contracted, enhanced Sunday hours changes an individual's monthly
//! pay under a simplified UK tax and NI model, and simulates how Sunday
//! shifts might be spread across a staff pool.  External applications
//! may call into `engine::project_pay` and
//! `simulation::simulate_shift_allocation` directly or embed the API
//! via `api::router`.

pub mod api;
pub mod bands;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod simulation;
pub mod staffing;
pub mod tax;
