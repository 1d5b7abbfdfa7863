//! # Storage Module
//!
//! Disk-backed game storage using redb.
//!
//! Uses redb embedded database for:
//! - ACID transactions (a guess and the session completion commit together)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)

mod redb_store;

pub use redb_store::RedbStore;
