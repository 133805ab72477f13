//! Subcommand implementations. Each writes its user-facing output to the
//! given writer so it can be exercised without a terminal.

pub mod results;
pub mod status;
