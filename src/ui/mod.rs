//! View-side helpers: incremental list updates and text export.

pub mod diff;
pub mod export;
pub mod list;
