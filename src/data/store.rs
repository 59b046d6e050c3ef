//! Data store — per-photo save, create, rename and list flows.
//!
//! DESIGN
//! ======
//! A captured photo is saved locally first. A local-only save spawns a
//! join-gated `photo.create` task; its response drives the rename from the
//! temporary key to the server key.
//!
//! Listing enumerates local records once per session, then pages through
//! remote photos newer than the last-updated cursor. Every page request
//! carries the `lastUpdated` the first page used, since the server's page
//! token is bound to that query. The cursor moves to the last item of each
//! page and to "now" after the final page.
//!
//! In-progress flags drop redundant list calls; the remote flag is cleared
//! before the next page is requested and once a failing page has spent its
//! last try.
//!
//! A photo has at most one `photo.create` in flight. Its key is held from
//! dispatch until the task succeeds or fails its last try, and
//! `resume_local_only` skips held keys.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::api::ListQuery;
use crate::error::SyncError;
use crate::event_log::EventLog;
use crate::offline::ImageStore;
use crate::photo::PhotoMetadata;
use crate::utils::{RoutingPolicy, Task};

use super::events::PhotoObserver;
use super::gate::ApiGate;

#[derive(Default)]
struct Progress {
    local_complete: AtomicBool,
    local_in_progress: AtomicBool,
    remote_in_progress: AtomicBool,
    got_first_photo: AtomicBool,
}

struct StoreInner {
    images: ImageStore,
    gate: ApiGate,
    observer: Arc<dyn PhotoObserver>,
    progress: Progress,
    /// Keys with a `photo.create` task queued or running.
    creating: Mutex<HashSet<String>>,
    log: EventLog,
}

#[derive(Clone)]
pub struct DataStore {
    inner: Arc<StoreInner>,
}

impl DataStore {
    #[must_use]
    pub fn new(images: ImageStore, gate: ApiGate, observer: Arc<dyn PhotoObserver>, log: EventLog) -> Self {
        log.info("data store created");
        Self {
            inner: Arc::new(StoreInner {
                images,
                gate,
                observer,
                progress: Progress::default(),
                creating: Mutex::new(HashSet::new()),
                log,
            }),
        }
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    #[must_use]
    pub fn gate(&self) -> &ApiGate {
        &self.inner.gate
    }

    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.inner.log
    }

    #[must_use]
    pub fn local_complete(&self) -> bool {
        self.inner.progress.local_complete.load(Ordering::SeqCst)
    }

    // =========================================================================
    // SAVE + CREATE
    // =========================================================================

    /// Save a newly captured photo and queue its upload.
    ///
    /// # Errors
    ///
    /// Returns the local save failure, after notifying `save_failed`.
    pub async fn add_photo(
        &self,
        title: &str,
        base64_photo: &str,
        mime_type: &str,
        description: Option<&str>,
    ) -> Result<PhotoMetadata, SyncError> {
        self.save_photo(PhotoMetadata::captured(title, base64_photo, mime_type, description)).await
    }

    /// Save a photo locally; local-only photos are then created remotely.
    ///
    /// # Errors
    ///
    /// Returns the local save failure, after notifying `save_failed`.
    pub async fn save_photo(&self, photo: PhotoMetadata) -> Result<PhotoMetadata, SyncError> {
        match self.inner.images.save(photo).await {
            Ok(saved) => {
                self.inner.observer.photo_saved(&saved);
                if saved.local_only {
                    self.create_photo(saved.clone()).await;
                }
                Ok(saved)
            }
            Err(e) => {
                self.inner.observer.save_failed(&e);
                Err(e)
            }
        }
    }

    /// Whether a `photo.create` for `key` is queued or running.
    #[must_use]
    pub fn is_creating(&self, key: &str) -> bool {
        self.creating().contains(key)
    }

    /// Dispatch a join-gated `photo.create` for a locally saved photo.
    /// Returns `false` when the photo has no key or a create for it is
    /// already in flight.
    pub async fn create_photo(&self, photo: PhotoMetadata) -> bool {
        let Some(key) = photo.key.clone() else {
            self.inner.log.error("photo.create requested for a photo without a key");
            return false;
        };
        let fresh = self.creating().insert(key.clone());
        if !fresh {
            self.inner.log.info(format!("photo.create already in flight for {key}"));
            return false;
        }

        tokio::task::yield_now().await;

        let store = self.clone();
        let tries = self.inner.gate.task_tries();
        let mut attempt = 0;
        let task = Task::new("photo.create", move || {
            attempt += 1;
            let last_attempt = attempt >= tries;
            let store = store.clone();
            let photo = photo.clone();
            let key = key.clone();
            async move {
                match store.inner.gate.api().create_photo(&photo).await {
                    Ok(created) => {
                        store.create_callback(&created, photo).await;
                        store.creating().remove(&key);
                        Ok::<(), SyncError>(())
                    }
                    Err(e) => {
                        if last_attempt {
                            store.inner.log.error(format!("photo.create for {key} gave up: {e}"));
                            store.creating().remove(&key);
                        }
                        Err(SyncError::from(e))
                    }
                }
            }
            .boxed()
        })
        .with_policy(RoutingPolicy::GatedOnJoin)
        .with_tries(tries);

        self.inner.gate.dispatch(task).await;
        true
    }

    fn creating(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.inner.creating.lock() {
            Ok(keys) => keys,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Apply a `photo.create` response to the stored photo and rename it.
    pub async fn create_callback(&self, created: &PhotoMetadata, mut stored: PhotoMetadata) -> Option<PhotoMetadata> {
        let Some(previous_key) = stored.key.clone() else {
            self.inner.log.error("photo.create callback for a photo without a key");
            return None;
        };
        let Some(new_key) = created.key.clone() else {
            self.inner.log.error(format!("photo.create response for {previous_key} has no key"));
            return None;
        };

        stored.key = Some(new_key);
        stored.local_only = false;
        stored.base64_photo = None;
        stored.updated.clone_from(&created.updated);
        if !created.tags.is_empty() {
            stored.tags.clone_from(&created.tags);
        }

        match self.inner.images.rename(&previous_key, stored).await {
            Ok(renamed) => {
                self.inner.observer.photo_renamed(&previous_key, &renamed);
                Some(renamed)
            }
            Err(_) => None,
        }
    }

    /// Re-dispatch `photo.create` for every stored photo still local-only
    /// that has no create in flight. Returns how many were queued.
    ///
    /// # Errors
    ///
    /// Record-store failures while enumerating.
    pub async fn resume_local_only(&self) -> Result<usize, SyncError> {
        let pending: Vec<PhotoMetadata> =
            self.inner.images.all().await?.into_iter().filter(|p| p.local_only).collect();
        let mut count = 0;
        for photo in pending {
            if self.create_photo(photo).await {
                count += 1;
            }
        }
        if count > 0 {
            self.inner.log.info(format!("resumed {count} local-only photos"));
        }
        Ok(count)
    }

    // =========================================================================
    // LIST
    // =========================================================================

    /// Load local photos (first call only), then fetch newer remote photos.
    pub async fn get_photos(&self) {
        tokio::task::yield_now().await;

        if !self.local_complete() && !self.get_local_photos().await {
            return;
        }

        let last_updated = match self.inner.images.cursor().get().await {
            Ok(value) => value,
            Err(e) => {
                self.inner.log.error(format!("reading lastUpdated failed: {e}"));
                return;
            }
        };
        let limit = self.inner.progress.got_first_photo.load(Ordering::SeqCst).then_some(1);
        self.get_remote_photos(last_updated, None, limit).await;
    }

    /// Notify `photo_loaded` for every stored photo. Returns `false` if the
    /// enumeration did not complete.
    pub async fn get_local_photos(&self) -> bool {
        let progress = &self.inner.progress;
        if progress.local_in_progress.swap(true, Ordering::SeqCst) {
            self.inner.log.info("getLocalPhotos called while in progress");
            return false;
        }

        let photos = match self.inner.images.all().await {
            Ok(photos) => photos,
            Err(e) => {
                self.inner.log.error(format!("reading local photos failed: {e}"));
                progress.local_in_progress.store(false, Ordering::SeqCst);
                return false;
            }
        };

        for photo in &photos {
            self.inner.observer.photo_loaded(photo);
        }

        progress.local_complete.store(true, Ordering::SeqCst);
        progress.local_in_progress.store(false, Ordering::SeqCst);
        true
    }

    /// Request one page of remote photos through a join-gated task.
    pub fn get_remote_photos(
        &self,
        last_updated: Option<String>,
        page_token: Option<String>,
        limit: Option<u32>,
    ) -> BoxFuture<'static, ()> {
        let store = self.clone();
        async move {
            store.inner.log.info(format!(
                "getRemotePhotos called with lastUpdated={last_updated:?} pageToken={page_token:?} limit={limit:?}"
            ));

            let progress = &store.inner.progress;
            if !progress.local_complete.load(Ordering::SeqCst) {
                store.inner.log.info("getRemotePhotos called before getLocalComplete");
                return;
            }
            if progress.remote_in_progress.swap(true, Ordering::SeqCst) {
                store.inner.log.info("getRemotePhotos called while getRemoteInProgress");
                return;
            }

            let query = ListQuery { last_updated, page_token, limit, ..ListQuery::default() };
            let page_store = store.clone();
            let tries = store.inner.gate.task_tries();
            let mut attempt = 0;
            let task = Task::new("photo.list", move || {
                attempt += 1;
                let last_attempt = attempt >= tries;
                let store = page_store.clone();
                let query = query.clone();
                async move { store.list_page(query, last_attempt).await }.boxed()
            })
            .with_policy(RoutingPolicy::GatedOnJoin)
            .with_tries(tries);

            store.inner.gate.dispatch(task).await;
        }
        .boxed()
    }

    async fn list_page(&self, query: ListQuery, last_attempt: bool) -> Result<(), SyncError> {
        let progress = &self.inner.progress;
        let page = match self.inner.gate.api().list_photos(&query).await {
            Ok(page) => page,
            Err(e) => {
                // Retries keep the guard; only giving up releases it.
                if last_attempt {
                    self.inner.log.error(format!("photo.list gave up: {e}"));
                    progress.remote_in_progress.store(false, Ordering::SeqCst);
                }
                return Err(e.into());
            }
        };
        progress.got_first_photo.store(true, Ordering::SeqCst);

        let mut newest = None;
        for item in page.items {
            if item.updated.is_some() {
                newest.clone_from(&item.updated);
            }
            // Failures are already reported through save_failed.
            if let Err(e) = self.save_photo(item).await {
                tracing::debug!(error = %e, "remote photo not stored");
            }
        }

        let cursor = self.inner.images.cursor();
        if let Some(page_token) = page.next_page_token {
            if let Some(newest) = newest {
                if let Err(e) = cursor.advance(&newest).await {
                    self.inner.log.error(format!("advancing lastUpdated failed: {e}"));
                }
            }
            progress.remote_in_progress.store(false, Ordering::SeqCst);
            self.get_remote_photos(query.last_updated, Some(page_token), None).await;
        } else {
            if let Err(e) = cursor.set(None).await {
                self.inner.log.error(format!("setting lastUpdated failed: {e}"));
            }
            progress.remote_in_progress.store(false, Ordering::SeqCst);
            self.inner.observer.photos_complete();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
