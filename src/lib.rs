//! Offline shopping list core.
//!
//! Items live in a local SQLite database ([`Library`]). A [`ShoppingSession`]
//! combines the live collection with the current search text, sort order and
//! category filter, and publishes the displayed items plus spending
//! statistics. [`ListModel`] turns each new displayed sequence into an
//! incremental edit script for the visual list.
//!
//! ```no_run
//! use std::sync::Arc;
//! use shopping_list::{Library, ShoppingItem, ShoppingSession, SortOption};
//!
//! # async fn run() -> shopping_list::Result<()> {
//! let library = Arc::new(Library::open_in_memory()?);
//! let session = ShoppingSession::new(library);
//!
//! session.insert_item(ShoppingItem::new("Milk", 2).with_price(1.5));
//! session.set_sort_option(SortOption::NameAsc);
//!
//! let mut items = session.subscribe_items();
//! items.changed().await.ok();
//! println!("{} items, {:.2} estimated", items.borrow().len(), session.statistics().estimated_cost);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod ui;

pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use pipeline::session::ShoppingSession;
pub use state::data::{ItemCategory, ShoppingItem, ShoppingStatistics};
pub use state::form::ItemForm;
pub use state::library::Library;
pub use state::query::QueryState;
pub use state::sort::SortOption;
pub use state::store::{ItemStore, Snapshot};
pub use ui::diff::{diff, Edit, EditScript, Keyed};
pub use ui::export::shareable_list;
pub use ui::list::{ListModel, ListUpdateSink};
