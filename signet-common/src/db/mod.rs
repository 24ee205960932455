//! Stat database access
//!
//! The proof-of-play store is a single SQLite database living in the
//! player's library folder.

mod init;

pub use init::init_stat_database;
