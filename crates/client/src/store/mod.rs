//! Synchronization store.
//!
//! Single source of truth for the product list within a session. Every
//! mutation goes through the backend first and is reconciled into the local
//! list only once the backend confirms it; nothing is inserted optimistically.
//!
//! # Architecture
//!
//! - [`CatalogStore::spawn`] starts one actor task that owns the list and
//!   the status
//! - [`StoreHandle`] sends commands over a bounded channel; the actor runs
//!   them one at a time in submission order, so two calls never interleave
//!   at a network round-trip and the last call issued is the last applied
//! - Every state change is published as a [`Snapshot`] on a `watch` channel
//!   for views to render
//!
//! # Status
//!
//! `load` moves the status through `Loading` to `Idle` or `Error`. A failed
//! load or mutation records its message in `Error` and leaves the list
//! untouched. Reading a product's comments does not touch the status; its
//! failure is only returned to the caller. Only a successful `load` clears
//! an error.

mod comments;
mod error;

pub use error::SyncError;

use std::ops::ControlFlow;

use catalog_core::{
    Comment, CommentDraft, CommentId, Product, ProductDraft, ProductId, Snapshot, StoreStatus,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::CatalogApi;

const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Store tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Commands that may queue before callers wait for room.
    pub mailbox_capacity: usize,
    /// Also delete a product's comments when the product is deleted.
    pub cascade_comment_delete: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            cascade_comment_delete: false,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, SyncError>>;

enum Command {
    Load {
        reply: Reply<usize>,
    },
    Create {
        draft: ProductDraft,
        reply: Reply<Product>,
    },
    Update {
        product: Product,
        reply: Reply<Product>,
    },
    Delete {
        id: ProductId,
        reply: Reply<()>,
    },
    Comments {
        product_id: ProductId,
        reply: Reply<Vec<Comment>>,
    },
    AddComment {
        product_id: ProductId,
        draft: CommentDraft,
        reply: Reply<Comment>,
    },
    DeleteComment {
        product_id: ProductId,
        comment_id: CommentId,
        reply: Reply<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// The actor state. Only reachable through a [`StoreHandle`].
pub struct CatalogStore<A> {
    api: A,
    items: Vec<Product>,
    status: StoreStatus,
    options: StoreOptions,
    snapshot: watch::Sender<Snapshot>,
}

impl<A: CatalogApi> CatalogStore<A> {
    /// Start a store backed by `api` and return a handle to it.
    ///
    /// Must be called inside a Tokio runtime. The store starts `Idle` with an
    /// empty list; call [`StoreHandle::load`] to fetch the catalog.
    pub fn spawn(api: A, options: StoreOptions) -> StoreHandle {
        let (commands, mailbox) = mpsc::channel(options.mailbox_capacity.max(1));
        let (snapshot, snapshots) = watch::channel(Snapshot::default());

        let store = Self {
            api,
            items: Vec::new(),
            status: StoreStatus::Idle,
            options,
            snapshot,
        };
        let task = tokio::spawn(store.run(mailbox));

        StoreHandle {
            commands,
            snapshots,
            task: std::sync::Arc::new(std::sync::Mutex::new(Some(task))),
        }
    }

    async fn run(mut self, mut mailbox: mpsc::Receiver<Command>) {
        info!("Catalog store started");

        while let Some(command) = mailbox.recv().await {
            if self.handle(command).await.is_break() {
                mailbox.close();
                break;
            }
        }

        info!("Catalog store stopped");
    }

    /// Run one command. Breaks once the store should stop.
    async fn handle(&mut self, command: Command) -> ControlFlow<()> {
        // A dropped reply receiver means the caller stopped waiting; the
        // operation has already been applied either way.
        match command {
            Command::Load { reply } => {
                let _ = reply.send(self.load().await);
            }
            Command::Create { draft, reply } => {
                let _ = reply.send(self.create(draft).await);
            }
            Command::Update { product, reply } => {
                let _ = reply.send(self.update(product).await);
            }
            Command::Delete { id, reply } => {
                let _ = reply.send(self.delete(id).await);
            }
            Command::Comments { product_id, reply } => {
                let _ = reply.send(self.comments(&product_id).await);
            }
            Command::AddComment {
                product_id,
                draft,
                reply,
            } => {
                let _ = reply.send(self.add_comment(product_id, draft).await);
            }
            Command::DeleteComment {
                product_id,
                comment_id,
                reply,
            } => {
                let _ = reply.send(self.delete_comment(product_id, comment_id).await);
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn publish(&self) {
        self.snapshot.send_replace(Snapshot {
            items: self.items.clone(),
            status: self.status.clone(),
        });
    }

    /// Record `error` in the status and hand it back for the caller.
    fn fail(&mut self, error: SyncError) -> SyncError {
        warn!(error = %error, "Catalog operation failed");
        self.status = StoreStatus::Error(error.to_string());
        self.publish();
        error
    }

    #[instrument(skip(self))]
    async fn load(&mut self) -> Result<usize, SyncError> {
        self.status = StoreStatus::Loading;
        self.publish();

        match self.api.list_products().await {
            Ok(products) => {
                self.items = products;
                self.status = StoreStatus::Idle;
                self.publish();
                info!(count = self.items.len(), "Catalog loaded");
                Ok(self.items.len())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create(&mut self, draft: ProductDraft) -> Result<Product, SyncError> {
        let product = draft.into_product();
        let stored = self
            .api
            .create_product(&product)
            .await
            .map_err(|e| self.fail(e.into()))?;

        self.items.push(stored.clone());
        self.publish();
        info!(product_id = %stored.id, "Product created");
        Ok(stored)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn update(&mut self, product: Product) -> Result<Product, SyncError> {
        let stored = self
            .api
            .replace_product(&product)
            .await
            .map_err(|e| self.fail(e.into()))?;

        if let Some(slot) = self.items.iter_mut().find(|p| p.id == stored.id) {
            slot.clone_from(&stored);
            self.publish();
            info!(product_id = %stored.id, "Product updated");
            return Ok(stored);
        }

        warn!(product_id = %stored.id, "Replaced product is missing from the local list");
        Err(self.fail(SyncError::MissingLocally(stored.id)))
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&mut self, id: ProductId) -> Result<(), SyncError> {
        match self.api.delete_product(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!("Product already absent remotely"),
            Err(e) => return Err(self.fail(e.into())),
        }

        let before = self.items.len();
        self.items.retain(|p| p.id != id);
        if self.items.len() != before {
            self.publish();
        }
        info!("Product deleted");

        if self.options.cascade_comment_delete {
            self.delete_orphaned_comments(&id).await;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn comments(&mut self, product_id: &ProductId) -> Result<Vec<Comment>, SyncError> {
        // A failed read leaves the product list and its status alone.
        self.api.list_comments(product_id).await.map_err(|e| {
            warn!(error = %e, "Failed to fetch comments");
            SyncError::from(e)
        })
    }
}

/// Cloneable handle to a running [`CatalogStore`].
///
/// Every action waits for the store to process it and returns the outcome;
/// the same outcome is visible in the next [`Snapshot`].
#[derive(Clone)]
pub struct StoreHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: std::sync::Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshots.borrow();
        f.debug_struct("StoreHandle")
            .field("items", &snapshot.items.len())
            .field("status", &snapshot.status)
            .finish_non_exhaustive()
    }
}

impl StoreHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SyncError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SyncError::Closed)?;
        response.await.map_err(|_| SyncError::Closed)?
    }

    /// Fetch the full catalog, replacing the local list.
    ///
    /// Returns the number of products loaded.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the previous list is kept.
    pub async fn load(&self) -> Result<usize, SyncError> {
        self.request(|reply| Command::Load { reply }).await
    }

    /// Create a product from `draft` and append it to the list.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the list is unchanged.
    pub async fn create(&self, draft: ProductDraft) -> Result<Product, SyncError> {
        self.request(|reply| Command::Create { draft, reply }).await
    }

    /// Replace a product wholesale, keeping its position in the list.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or [`SyncError::MissingLocally`] if the
    /// product left the local list.
    pub async fn update(&self, product: Product) -> Result<Product, SyncError> {
        self.request(|reply| Command::Update { product, reply }).await
    }

    /// Delete a product. Deleting an unknown id succeeds without changes.
    ///
    /// # Errors
    ///
    /// Returns the backend error for failures other than 404.
    pub async fn delete(&self, id: ProductId) -> Result<(), SyncError> {
        self.request(|reply| Command::Delete { id, reply }).await
    }

    /// Fetch the comments of a product.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn comments(&self, product_id: ProductId) -> Result<Vec<Comment>, SyncError> {
        self.request(|reply| Command::Comments { product_id, reply })
            .await
    }

    /// Create a comment and link it to its product.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Saga`] if either write fails; the comment is
    /// removed again when linking fails.
    pub async fn add_comment(
        &self,
        product_id: ProductId,
        draft: CommentDraft,
    ) -> Result<Comment, SyncError> {
        self.request(|reply| Command::AddComment {
            product_id,
            draft,
            reply,
        })
        .await
    }

    /// Delete a comment and unlink it from its product.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Saga`] if either write fails; the comment is
    /// restored when unlinking fails.
    pub async fn delete_comment(
        &self,
        product_id: ProductId,
        comment_id: CommentId,
    ) -> Result<(), SyncError> {
        self.request(|reply| Command::DeleteComment {
            product_id,
            comment_id,
            reply,
        })
        .await
    }

    /// Current list and status.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stop the store after the commands already queued have run.
    ///
    /// Later actions on any clone of this handle fail with
    /// [`SyncError::Closed`].
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = done.await;
        }

        let task = self
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Catalog store task ended abnormally");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use catalog_core::Size;

    use super::*;
    use crate::api::ApiError;
    use crate::fake::{FakeApi, Op, server_error};

    pub(super) fn draft(name: &str, count: u32) -> ProductDraft {
        ProductDraft {
            image_url: format!("https://img.example/{name}.png"),
            name: name.to_string(),
            count,
            size: Size {
                width: 10.0,
                height: 5.0,
            },
            weight: "250g".to_string(),
        }
    }

    pub(super) fn seeded(names: &[&str]) -> (FakeApi, Vec<Product>) {
        let products: Vec<Product> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut p = draft(name, u32::try_from(i).unwrap()).into_product();
                p.id = ProductId::new(format!("p{i}"));
                p
            })
            .collect();
        (FakeApi::with_products(products.clone()), products)
    }

    #[tokio::test]
    async fn test_load_replaces_list_in_server_order() {
        let (api, products) = seeded(&["b", "a", "c"]);
        let store = CatalogStore::spawn(api, StoreOptions::default());

        assert_eq!(store.load().await.unwrap(), 3);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.items, products);
        assert_eq!(snapshot.status, StoreStatus::Idle);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_stale_list() {
        let (api, products) = seeded(&["a", "b"]);
        let store = CatalogStore::spawn(api.clone(), StoreOptions::default());
        store.load().await.unwrap();

        api.set_products(Vec::new());
        api.fail_next(Op::ListProducts, server_error());
        let err = store.load().await.unwrap_err();

        assert!(err.api_error().is_some_and(ApiError::is_network));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.items, products);
        assert_eq!(
            snapshot.status,
            StoreStatus::Error("API error: 500 - Internal Server Error".to_string())
        );

        // Retrying the load recovers
        store.load().await.unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.status, StoreStatus::Idle);
    }

    #[tokio::test]
    async fn test_load_publishes_loading_then_idle() {
        let (api, _) = seeded(&["a"]);
        api.delay_next(Op::ListProducts, Duration::from_millis(50));
        let store = CatalogStore::spawn(api, StoreOptions::default());
        let mut rx = store.subscribe();

        let loader = store.clone();
        let pending = tokio::spawn(async move { loader.load().await });

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().status.is_loading());

        pending.await.unwrap().unwrap();
        assert_eq!(store.snapshot().status, StoreStatus::Idle);
    }

    #[tokio::test]
    async fn test_create_appends_confirmed_product() {
        let (api, _) = seeded(&["b", "a"]);
        let store = CatalogStore::spawn(api.clone(), StoreOptions::default());
        store.load().await.unwrap();

        let created = store.create(draft("Box", 5)).await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.items.last(), Some(&created));
        assert!(created.comments.is_empty());
        assert_eq!(api.products().last(), Some(&created));
    }

    #[tokio::test]
    async fn test_create_failure_is_noop_locally() {
        let (api, products) = seeded(&["a"]);
        let store = CatalogStore::spawn(api.clone(), StoreOptions::default());
        store.load().await.unwrap();

        api.fail_next(Op::CreateProduct, server_error());
        assert!(store.create(draft("Box", 5)).await.is_err());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.items, products);
        assert!(snapshot.status.error_message().is_some());
    }

    #[tokio::test]
    async fn test_update_replaces_only_target_in_place() {
        let (api, products) = seeded(&["a", "b", "c"]);
        let store = CatalogStore::spawn(api, StoreOptions::default());
        store.load().await.unwrap();

        let mut edited = products[1].clone();
        edited.count = 99;
        store.update(edited.clone()).await.unwrap();

        let items = store.snapshot().items;
        assert_eq!(items, vec![products[0].clone(), edited, products[2].clone()]);
    }

    #[tokio::test]
    async fn test_update_of_locally_missing_product_sets_error() {
        let (api, products) = seeded(&["a"]);
        let store = CatalogStore::spawn(api, StoreOptions::default());
        // Never loaded: the backend knows p0, the store does not.
        let err = store.update(products[0].clone()).await.unwrap_err();

        assert!(matches!(err, SyncError::MissingLocally(ref id) if id.as_str() == "p0"));
        let snapshot = store.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(
            snapshot.status.error_message(),
            Some("Product p0 is no longer in the local list")
        );
    }

    #[tokio::test]
    async fn test_update_remote_not_found() {
        let (api, products) = seeded(&["a"]);
        let store = CatalogStore::spawn(api.clone(), StoreOptions::default());
        store.load().await.unwrap();
        api.set_products(Vec::new());

        let err = store.update(products[0].clone()).await.unwrap_err();
        assert!(err.api_error().is_some_and(ApiError::is_not_found));
        assert_eq!(store.snapshot().items, products);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let (api, products) = seeded(&["a", "b", "c"]);
        let store = CatalogStore::spawn(api, StoreOptions::default());
        store.load().await.unwrap();

        store.delete(products[1].id.clone()).await.unwrap();

        let items = store.snapshot().items;
        assert_eq!(items, vec![products[0].clone(), products[2].clone()]);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let (api, products) = seeded(&["a", "b"]);
        let store = CatalogStore::spawn(api, StoreOptions::default());
        store.load().await.unwrap();

        store.delete(ProductId::new("nope")).await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.items, products);
        assert_eq!(snapshot.status, StoreStatus::Idle);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_entry() {
        let (api, products) = seeded(&["a"]);
        let store = CatalogStore::spawn(api.clone(), StoreOptions::default());
        store.load().await.unwrap();

        api.fail_next(Op::DeleteProduct, server_error());
        assert!(store.delete(products[0].id.clone()).await.is_err());
        assert_eq!(store.snapshot().items, products);
    }

    #[tokio::test]
    async fn test_concurrent_updates_apply_in_call_order() {
        let (api, products) = seeded(&["a"]);
        let store = CatalogStore::spawn(api.clone(), StoreOptions::default());
        store.load().await.unwrap();

        // The first request is slow; under interleaving it would resolve last.
        api.delay_next(Op::ReplaceProduct, Duration::from_millis(50));
        let mut first = products[0].clone();
        first.count = 10;
        let mut second = products[0].clone();
        second.count = 20;

        let (a, b) = tokio::join!(store.update(first), store.update(second));
        a.unwrap();
        b.unwrap();

        let replaces: Vec<String> = api
            .resolved()
            .into_iter()
            .filter(|(op, _)| *op == Op::ReplaceProduct)
            .map(|(_, key)| key)
            .collect();
        assert_eq!(replaces, vec!["p0:10", "p0:20"]);

        // Last resolved wins, and last resolved is last called.
        let last_resolved = replaces.last().unwrap();
        let snapshot = store.snapshot();
        let local = &snapshot.items[0];
        assert_eq!(format!("{}:{}", local.id, local.count), *last_resolved);
        assert_eq!(local.count, 20);
        assert_eq!(api.products()[0].count, 20);
    }

    #[tokio::test]
    async fn test_mutation_success_keeps_error_status() {
        let (api, _) = seeded(&["a"]);
        let store = CatalogStore::spawn(api.clone(), StoreOptions::default());
        api.fail_next(Op::ListProducts, server_error());
        assert!(store.load().await.is_err());

        store.create(draft("Box", 1)).await.unwrap();
        assert!(store.snapshot().status.error_message().is_some());
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_handle() {
        let (api, _) = seeded(&["a"]);
        let store = CatalogStore::spawn(api, StoreOptions::default());
        let other = store.clone();

        store.shutdown().await;

        assert!(matches!(other.load().await, Err(SyncError::Closed)));
    }

    #[tokio::test]
    async fn test_shutdown_runs_queued_commands_first() {
        let (api, products) = seeded(&["a", "b"]);
        api.delay_next(Op::ListProducts, Duration::from_millis(50));
        let store = CatalogStore::spawn(api, StoreOptions::default());

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.load().await }
        });
        tokio::task::yield_now().await;
        store.shutdown().await;

        assert_eq!(pending.await.unwrap().unwrap(), 2);
        assert_eq!(store.snapshot().items, products);
        assert!(matches!(store.load().await, Err(SyncError::Closed)));
    }
}
