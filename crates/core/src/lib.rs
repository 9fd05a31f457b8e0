//! Core business logic for Spendflow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `workflow` - Multi-level approval workflow engine
//! - `access` - Which expenses an employee may see
//! - `currency` - Conversion into the company currency

pub mod access;
pub mod currency;
pub mod workflow;
