//! compliance-results -- inspect remote compliance test runs.
//!
//! This crate provides the core library for polling a compliance run,
//! streaming its results archive, parsing the JUnit reports inside it, and
//! rendering them as tables.

pub mod archive;
pub mod client;
pub mod commands;
pub mod config;
pub mod junit;
pub mod report;
