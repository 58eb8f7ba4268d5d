//! The reactive view-model behind one open shopping list screen.
//!
//! A session owns the query inputs and two derived outputs:
//! - the displayed items, recomputed when the stored collection or any
//!   query input changes
//! - the statistics, recomputed when the stored collection changes
//!
//! Both are published on `watch` channels, so readers always see the
//! latest value. Mutations are never awaited by the caller: they queue up
//! in submission order and one writer applies them on the blocking pool.
//! Their effect shows up when the store re-emits.

use std::sync::Arc;

use log::{debug, error, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle};

use super::aggregate;
use super::projection;
use crate::error::Result;
use crate::state::data::{ItemCategory, ShoppingItem, ShoppingStatistics};
use crate::state::query::QueryState;
use crate::state::sort::SortOption;
use crate::state::store::{ItemStore, Snapshot};
use crate::ui::export;

/// A store call queued by a fire-and-forget mutation
struct Mutation {
    op: &'static str,
    run: Box<dyn FnOnce(&dyn ItemStore) -> Result<()> + Send>,
}

pub struct ShoppingSession {
    store: Arc<dyn ItemStore>,
    search: watch::Sender<String>,
    sort: watch::Sender<SortOption>,
    category: watch::Sender<Option<ItemCategory>>,
    items: watch::Receiver<Snapshot>,
    statistics: watch::Receiver<ShoppingStatistics>,
    /// Pending store writes, drained in order by `run_writer`
    writes: mpsc::UnboundedSender<Mutation>,
    /// Dataflow nodes, aborted when the session goes away
    tasks: Vec<JoinHandle<()>>,
}

impl ShoppingSession {
    /// Start a session with the default query (no search, newest first, all categories).
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self::with_query(store, QueryState::default())
    }

    /// Start a session with an initial query
    pub fn with_query(store: Arc<dyn ItemStore>, query: QueryState) -> Self {
        let mut source = store.observe_all();

        // Compute the first outputs right away so readers never see a blank list
        let snapshot = source.borrow_and_update().clone();
        let (items_tx, items_rx) = watch::channel(Arc::new(projection::project(&snapshot, &query)));
        let (stats_tx, stats_rx) = watch::channel(aggregate::statistics(&snapshot));

        let (search_tx, search_rx) = watch::channel(query.search);
        let (sort_tx, sort_rx) = watch::channel(query.sort);
        let (category_tx, category_rx) = watch::channel(query.category);

        // Not aborted on drop: queued writes still land once the session is gone
        let (writes_tx, writes_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&store), writes_rx));

        let tasks = vec![
            tokio::spawn(run_projection(
                source.clone(),
                search_rx,
                sort_rx,
                category_rx,
                items_tx,
            )),
            tokio::spawn(run_statistics(source, stats_tx)),
        ];

        ShoppingSession {
            store,
            search: search_tx,
            sort: sort_tx,
            category: category_tx,
            items: items_rx,
            statistics: stats_rx,
            writes: writes_tx,
            tasks,
        }
    }

    // ========== View outputs ==========

    /// Current displayed sequence
    pub fn items(&self) -> Snapshot {
        self.items.borrow().clone()
    }

    /// Receiver that wakes on every new displayed sequence
    pub fn subscribe_items(&self) -> watch::Receiver<Snapshot> {
        self.items.clone()
    }

    pub fn statistics(&self) -> ShoppingStatistics {
        *self.statistics.borrow()
    }

    pub fn subscribe_statistics(&self) -> watch::Receiver<ShoppingStatistics> {
        self.statistics.clone()
    }

    // ========== Query inputs ==========

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.search.send_replace(query.into());
    }

    pub fn set_sort_option(&self, option: SortOption) {
        self.sort.send_replace(option);
    }

    /// `None` shows every category
    pub fn set_filter_category(&self, category: Option<ItemCategory>) {
        self.category.send_replace(category);
    }

    pub fn search_query(&self) -> String {
        self.search.borrow().clone()
    }

    pub fn sort_option(&self) -> SortOption {
        *self.sort.borrow()
    }

    pub fn filter_category(&self) -> Option<ItemCategory> {
        *self.category.borrow()
    }

    /// All three query inputs as one value
    pub fn query(&self) -> QueryState {
        QueryState::new(self.search_query(), self.sort_option(), self.filter_category())
    }

    // ========== Mutations (fire-and-forget) ==========

    /// Add an item. Returns false, without touching the store,
    /// when the item is invalid.
    pub fn insert_item(&self, item: ShoppingItem) -> bool {
        if !self.check("insert", &item) {
            return false;
        }
        self.dispatch("insert", move |store| store.insert(&item).map(drop));
        true
    }

    /// Add several items at once. Nothing is issued if any of them is invalid.
    pub fn insert_items(&self, items: Vec<ShoppingItem>) -> bool {
        if !items.iter().all(|item| self.check("insert", item)) {
            return false;
        }
        self.dispatch("bulk insert", move |store| store.insert_all(&items).map(drop));
        true
    }

    /// Save an edited item. Returns false when the item is invalid.
    pub fn update_item(&self, item: ShoppingItem) -> bool {
        if !self.check("update", &item) {
            return false;
        }
        self.dispatch("update", move |store| store.update(&item).map(drop));
        true
    }

    pub fn delete_item(&self, item: ShoppingItem) {
        self.dispatch("delete", move |store| store.delete(&item).map(drop));
    }

    pub fn toggle_bought(&self, item: ShoppingItem, is_bought: bool) {
        let item = ShoppingItem { is_bought, ..item };
        self.dispatch("toggle bought", move |store| store.update(&item).map(drop));
    }

    pub fn clear_all_bought(&self) {
        self.dispatch("clear bought", |store| store.delete_all_bought().map(drop));
    }

    // ========== Point reads ==========

    pub async fn get_item_by_id(&self, id: i64) -> Result<Option<ShoppingItem>> {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || store.get_by_id(id)).await?
    }

    /// Whole list (ignoring the current query) as shareable text
    pub async fn shareable_list(&self) -> Result<String> {
        let store = Arc::clone(&self.store);
        let items = task::spawn_blocking(move || store.get_all()).await??;
        Ok(export::shareable_list(&items))
    }

    fn check(&self, op: &str, item: &ShoppingItem) -> bool {
        match item.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Not issuing {} for '{}': {}", op, item.name, e);
                false
            }
        }
    }

    /// Queue a store call behind every earlier one; the outcome is only logged
    fn dispatch<F>(&self, op: &'static str, f: F)
    where
        F: FnOnce(&dyn ItemStore) -> Result<()> + Send + 'static,
    {
        let mutation = Mutation {
            op,
            run: Box::new(f),
        };
        if self.writes.send(mutation).is_err() {
            error!("⚠️  {} dropped, the writer has stopped", op);
        }
    }
}

impl Drop for ShoppingSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl std::fmt::Debug for ShoppingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShoppingSession")
            .field("query", &self.query())
            .field("items", &self.items.borrow().len())
            .finish()
    }
}

/// Apply queued mutations one at a time, in submission order.
/// Ends after the last one once the session is gone.
async fn run_writer(store: Arc<dyn ItemStore>, mut queue: mpsc::UnboundedReceiver<Mutation>) {
    while let Some(Mutation { op, run }) = queue.recv().await {
        let store = Arc::clone(&store);
        match task::spawn_blocking(move || run(store.as_ref())).await {
            Ok(Ok(())) => debug!("{} finished", op),
            Ok(Err(e)) => error!("⚠️  {} failed: {}", op, e),
            Err(e) => error!("⚠️  {} did not complete: {}", op, e),
        }
    }
    debug!("Writer stopped");
}

/// Re-project whenever the collection or any query input changes.
/// Ends when an upstream sender goes away.
async fn run_projection(
    mut source: watch::Receiver<Snapshot>,
    mut search: watch::Receiver<String>,
    mut sort: watch::Receiver<SortOption>,
    mut category: watch::Receiver<Option<ItemCategory>>,
    out: watch::Sender<Snapshot>,
) {
    loop {
        let changed = tokio::select! {
            r = source.changed() => r,
            r = search.changed() => r,
            r = sort.changed() => r,
            r = category.changed() => r,
        };
        if changed.is_err() {
            break;
        }

        // Mark every input seen, a burst of changes collapses into one pass
        let snapshot = source.borrow_and_update().clone();
        let query = QueryState {
            search: search.borrow_and_update().clone(),
            sort: *sort.borrow_and_update(),
            category: *category.borrow_and_update(),
        };

        let projected = projection::project(&snapshot, &query);
        out.send_if_modified(|current| {
            if **current == projected {
                return false;
            }
            *current = Arc::new(projected);
            true
        });
    }
    debug!("Projection node stopped");
}

/// Recompute statistics on every new collection snapshot
async fn run_statistics(
    mut source: watch::Receiver<Snapshot>,
    out: watch::Sender<ShoppingStatistics>,
) {
    while source.changed().await.is_ok() {
        let stats = aggregate::statistics(&source.borrow_and_update());
        out.send_replace(stats);
    }
    debug!("Statistics node stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::Library;
    use std::time::Duration;

    async fn wait_until<T>(rx: &mut watch::Receiver<T>, pred: impl FnMut(&T) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for the session")
            .expect("session output closed");
    }

    fn ids(items: &[ShoppingItem]) -> Vec<i64> {
        items.iter().map(|item| item.id).collect()
    }

    fn seeded_library() -> Arc<Library> {
        Arc::new(seeded())
    }

    fn seeded() -> Library {
        let library = Library::open_in_memory().unwrap();
        let mut soap = ShoppingItem::new("Soap", 1)
            .with_price(3.0)
            .with_category(ItemCategory::Household)
            .with_timestamp(200);
        soap.is_bought = true;
        library
            .insert_all(&[
                ShoppingItem::new("Milk", 2)
                    .with_price(1.5)
                    .with_category(ItemCategory::Drinks)
                    .with_timestamp(100),
                soap,
            ])
            .unwrap();
        library
    }

    /// Library wrapper that records which writes reach the store
    struct RecordingStore {
        library: Library,
        calls: std::sync::Mutex<Vec<&'static str>>,
    }

    impl RecordingStore {
        fn new(library: Library) -> Self {
            Self {
                library,
                calls: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ItemStore for RecordingStore {
        fn observe_all(&self) -> watch::Receiver<Snapshot> {
            self.library.observe_all()
        }

        fn get_all(&self) -> Result<Vec<ShoppingItem>> {
            self.library.get_all()
        }

        fn get_by_id(&self, id: i64) -> Result<Option<ShoppingItem>> {
            self.library.get_by_id(id)
        }

        fn insert(&self, item: &ShoppingItem) -> Result<i64> {
            self.record("insert");
            self.library.insert(item)
        }

        fn insert_all(&self, items: &[ShoppingItem]) -> Result<Vec<i64>> {
            self.record("insert_all");
            self.library.insert_all(items)
        }

        fn update(&self, item: &ShoppingItem) -> Result<bool> {
            self.record("update");
            self.library.update(item)
        }

        fn delete(&self, item: &ShoppingItem) -> Result<bool> {
            self.record("delete");
            self.library.delete(item)
        }

        fn delete_all_bought(&self) -> Result<usize> {
            self.record("delete_all_bought");
            self.library.delete_all_bought()
        }
    }

    #[tokio::test]
    async fn test_initial_outputs() {
        let session = ShoppingSession::new(seeded_library());

        let names: Vec<String> = session.items().iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["Soap", "Milk"]);

        let stats = session.statistics();
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.bought_items, 1);
        assert_eq!(stats.pending_items, 1);
        assert_eq!(stats.total_cost, 3.0);
        assert_eq!(stats.estimated_cost, 6.0);
    }

    #[tokio::test]
    async fn test_query_inputs_reproject() {
        let session = ShoppingSession::new(seeded_library());
        let mut items = session.subscribe_items();

        session.set_search_query("mi");
        wait_until(&mut items, |items| items.len() == 1 && items[0].name == "Milk").await;
        assert_eq!(session.search_query(), "mi");

        session.set_search_query("");
        session.set_sort_option(SortOption::PriceAsc);
        wait_until(&mut items, |items| {
            items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>() == ["Milk", "Soap"]
        })
        .await;

        session.set_filter_category(Some(ItemCategory::Household));
        wait_until(&mut items, |items| items.len() == 1 && items[0].name == "Soap").await;
        assert_eq!(
            session.query(),
            QueryState::new("", SortOption::PriceAsc, Some(ItemCategory::Household))
        );

        // The filter does not touch the statistics
        assert_eq!(session.statistics().total_items, 2);
    }

    #[tokio::test]
    async fn test_mutations_flow_back_through_the_store() {
        let library = seeded_library();
        let session = ShoppingSession::new(library.clone());
        let mut items = session.subscribe_items();
        let mut stats = session.subscribe_statistics();

        assert!(session.insert_item(ShoppingItem::new("Bread", 1).with_price(2.0)));
        wait_until(&mut items, |items| items.len() == 3).await;
        wait_until(&mut stats, |stats| stats.total_items == 3).await;

        // Newest first puts Bread on top
        let bread = session.items()[0].clone();
        assert_eq!(bread.name, "Bread");
        assert!(bread.id > 0);

        session.toggle_bought(bread.clone(), true);
        wait_until(&mut stats, |stats| stats.bought_items == 2).await;
        assert_eq!(session.statistics().total_cost, 5.0);

        session.clear_all_bought();
        wait_until(&mut items, |items| items.len() == 1).await;
        assert_eq!(session.items()[0].name, "Milk");

        let milk = session.items()[0].clone();
        session.delete_item(milk.clone());
        wait_until(&mut stats, |stats| stats.total_items == 0).await;

        // Undo puts the same item back under its old id
        assert!(session.insert_item(milk.clone()));
        wait_until(&mut items, |items| ids(items) == vec![milk.id]).await;
        assert_eq!(session.get_item_by_id(milk.id).await.unwrap(), Some(milk));
    }

    #[tokio::test]
    async fn test_update_and_bulk_insert() {
        let store = Arc::new(RecordingStore::new(seeded()));
        let session = ShoppingSession::new(store.clone());
        let mut items = session.subscribe_items();
        let mut snapshots = store.observe_all();

        let mut milk = session.items()[1].clone();
        milk.quantity = 4;
        assert!(session.update_item(milk.clone()));
        wait_until(&mut items, |items| items.iter().any(|i| i.quantity == 4)).await;
        snapshots.borrow_and_update();

        assert!(session.insert_items(vec![
            ShoppingItem::new("Tea", 1),
            ShoppingItem::new("Coffee", 1),
        ]));
        wait_until(&mut items, |items| items.len() == 4).await;

        // The batch is one store call and one new snapshot
        assert_eq!(store.calls(), vec!["update", "insert_all"]);
        assert!(snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow_and_update().len(), 4);
        assert!(!snapshots.has_changed().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mutations_apply_in_submission_order() {
        let library = seeded_library();
        let session = ShoppingSession::new(library.clone());
        let mut items = session.subscribe_items();
        let milk = session.items()[1].clone();
        assert_eq!(milk.name, "Milk");

        for quantity in 1..=50 {
            assert!(session.update_item(ShoppingItem { quantity, ..milk.clone() }));
        }
        session.toggle_bought(ShoppingItem { quantity: 50, ..milk.clone() }, true);

        wait_until(&mut items, |items| items.iter().any(|i| i.id == milk.id && i.is_bought)).await;

        // The last call wins, nothing older lands after it
        let stored = library.get_by_id(milk.id).unwrap().unwrap();
        assert_eq!(stored.quantity, 50);
        assert!(stored.is_bought);
        assert!(session.items().iter().all(|i| i.id != milk.id || i.quantity == 50));
    }

    #[tokio::test]
    async fn test_queued_writes_land_after_drop() {
        let library = seeded_library();
        let session = ShoppingSession::new(library.clone());
        let mut snapshots = library.observe_all();

        assert!(session.insert_item(ShoppingItem::new("Bread", 1)));
        session.clear_all_bought();
        drop(session);

        wait_until(&mut snapshots, |items| {
            items.len() == 2 && items.iter().all(|i| !i.is_bought)
        })
        .await;
    }

    #[tokio::test]
    async fn test_invalid_items_are_not_issued() {
        let library = seeded_library();
        let session = ShoppingSession::new(library.clone());

        assert!(!session.insert_item(ShoppingItem::new("  ", 1)));
        assert!(!session.insert_item(ShoppingItem::new("Eggs", 0)));
        assert!(!session.update_item(ShoppingItem::new("Eggs", 1).with_price(-1.0)));
        assert!(!session.insert_items(vec![
            ShoppingItem::new("Tea", 1),
            ShoppingItem::new("", 1),
        ]));

        assert_eq!(library.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_shareable_list_ignores_query() {
        let session = ShoppingSession::new(seeded_library());
        session.set_filter_category(Some(ItemCategory::Drinks));

        let text = session.shareable_list().await.unwrap();
        assert!(text.contains("1. Milk (x2) - $1.50"));
        assert!(text.contains("1. Soap (x1) - $3.00"));
    }

    #[tokio::test]
    async fn test_initial_query_is_honoured() {
        let query = QueryState::new("", SortOption::DateAsc, None);
        let session = ShoppingSession::with_query(seeded_library(), query);
        assert_eq!(
            session.items().iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            vec!["Milk", "Soap"]
        );
    }

    #[tokio::test]
    async fn test_session_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::config::Config::from_json(&format!(
            r#"{{ "database_path": {:?}, "default_sort": "NameDesc" }}"#,
            dir.path().join("list.db")
        ))
        .unwrap();

        let library = Arc::new(Library::from_config(&config).unwrap());
        library
            .insert_all(&[ShoppingItem::new("apples", 1), ShoppingItem::new("Bananas", 1)])
            .unwrap();

        let session = ShoppingSession::with_query(library, config.initial_query());
        assert_eq!(session.sort_option(), SortOption::NameDesc);
        assert_eq!(
            session.items().iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            vec!["Bananas", "apples"]
        );
    }

    #[tokio::test]
    async fn test_drop_stops_the_dataflow() {
        let library = seeded_library();
        let session = ShoppingSession::new(library.clone());
        let mut items = session.subscribe_items();
        drop(session);

        library.insert(&ShoppingItem::new("Bread", 1)).unwrap();

        // The aborted projection node drops its sender, closing the channel
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while items.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
        assert_eq!(items.borrow().len(), 2);
    }
}
