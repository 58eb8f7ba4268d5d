//! State management module
//!
//! This module handles all persistent and per-session data:
//! - Database connection and queries (library.rs)
//! - Shared data structures (data.rs)
//! - The store interface the pipeline consumes (store.rs)
//! - Sort orders (sort.rs) and the list query (query.rs)
//! - Item dialog input (form.rs)

pub mod data;
pub mod form;
pub mod library;
pub mod query;
pub mod sort;
pub mod store;
