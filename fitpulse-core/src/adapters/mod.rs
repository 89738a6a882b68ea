//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the FitnessRepository port
//! - a seeded generator for demo data

pub mod demo;
pub mod duckdb;
