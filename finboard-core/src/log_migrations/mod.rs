//! Event log migrations - SQL files embedded at compile time
//!
//! Each entry is `(file name, sql)`. Entries are applied in order and
//! recorded in `sys_migrations`; `000_migrations.sql` bootstraps that table.

/// Add new files as `NNN_description.sql` and list them here in order
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
