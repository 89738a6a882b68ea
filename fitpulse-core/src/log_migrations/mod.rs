//! Schema for the event log database (logs.duckdb)
//!
//! Kept separate from the fitness data migrations so the log file can be
//! exported or cleared without touching user data.

/// Log migrations in apply order, as (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
