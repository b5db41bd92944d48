use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info};

use crate::api_client::ApiClient;
use crate::draft::{validate_entry_media, EntryDraft};
use crate::error::ApiError;
use crate::filters::CatalogFilters;
use crate::models::{Banner, CatalogEntry, EntryPayload};
use crate::notifications::Notifications;
use crate::upload::{MediaKind, UploadFile};
use crate::Outcome;

struct CatalogState {
    entries: Vec<CatalogEntry>,
    selected: Option<CatalogEntry>,
    draft: EntryDraft,
}

/// Result of deleting several entries one request at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkDeleteReport {
    pub deleted: Vec<i64>,
    pub failed: Vec<(i64, String)>,
}

impl BulkDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }
}

// Keeps `is_loading` accurate even if a load future is dropped mid-flight.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Holds the catalog list, the entry open in the detail view and the
/// new-entry draft.
///
/// Mutations never refresh the list on their own; see
/// [`crate::workflow::CatalogSession`] for the reload policy.
pub struct CatalogController {
    api: ApiClient,
    notifications: Arc<Notifications>,
    state: Mutex<CatalogState>,
    next_load: AtomicU64,
    loads_in_flight: AtomicUsize,
}

impl CatalogController {
    pub fn new(api: ApiClient, notifications: Arc<Notifications>) -> Self {
        Self {
            api,
            notifications,
            state: Mutex::new(CatalogState {
                entries: Vec::new(),
                selected: None,
                draft: EntryDraft::template(),
            }),
            next_load: AtomicU64::new(0),
            loads_in_flight: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.state().entries.clone()
    }

    pub fn entry(&self, id: i64) -> Option<CatalogEntry> {
        self.state().entries.iter().find(|e| e.id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.loads_in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn selected(&self) -> Option<CatalogEntry> {
        self.state().selected.clone()
    }

    pub fn set_selected(&self, entry: CatalogEntry) {
        self.state().selected = Some(entry);
    }

    pub fn clear_selected(&self) {
        self.state().selected = None;
    }

    pub fn draft(&self) -> EntryDraft {
        self.state().draft.clone()
    }

    /// Edit the draft in place through its setters.
    pub fn edit_draft<F>(&self, edit: F)
    where
        F: FnOnce(&mut EntryDraft),
    {
        edit(&mut self.state().draft);
    }

    pub fn reset_draft(&self) {
        self.state().draft = EntryDraft::template();
    }

    /// Replace the list with the server's filtered listing.
    ///
    /// When loads overlap, only the most recently issued one may replace the
    /// list or report a failure; older ones return [`Outcome::Skipped`]. A
    /// failed load keeps the previous list.
    pub async fn load(&self, filters: &CatalogFilters) -> Outcome {
        let ticket = self.next_load.fetch_add(1, Ordering::SeqCst) + 1;
        let result = {
            let _loading = LoadingGuard::enter(&self.loads_in_flight);
            self.api.list_entries(filters).await
        };

        // Superseded loads neither touch the list nor notify, even on failure
        let latest = self.next_load.load(Ordering::SeqCst);
        if ticket < latest {
            debug!("Discarding catalog load #{} (#{} was issued since)", ticket, latest);
            return Outcome::Skipped;
        }

        match result {
            Ok(entries) => {
                debug!("Catalog load #{} returned {} entries", ticket, entries.len());
                self.state().entries = entries;
                Outcome::Success
            }
            Err(e) => {
                error!("Catalog load #{} failed: {}", ticket, e);
                self.notifications
                    .failure("Error", format!("Failed to load anime: {}", e));
                Outcome::Failure
            }
        }
    }

    /// Submit the held draft. On success the draft goes back to the
    /// template; on failure it is kept for a retry.
    pub async fn create(&self) -> Outcome {
        let draft = self.draft();
        if let Err(message) = draft.validate() {
            self.notifications.failure("Error", message);
            return Outcome::Failure;
        }

        match self.api.create_entry(&draft.to_payload()).await {
            Ok(created) => {
                info!("Created entry {} ({})", created.id, created.title);
                self.reset_draft();
                self.notifications.success("Success", "Anime added!");
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                Outcome::Failure
            }
        }
    }

    /// Send every mutable field of `entry`. The server's copy replaces the
    /// matching list item; the list is not reloaded.
    pub async fn update(&self, entry: &CatalogEntry) -> Outcome {
        if let Err(message) = validate_entry_media(entry) {
            self.notifications.failure("Error", message);
            return Outcome::Failure;
        }

        match self.api.update_entry(&EntryPayload::from(entry)).await {
            Ok(updated) => {
                info!("Updated entry {}", updated.id);
                let mut state = self.state();
                if let Some(slot) = state.entries.iter_mut().find(|e| e.id == updated.id) {
                    *slot = updated;
                }
                drop(state);
                self.notifications.success("Success", "Anime updated!");
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                Outcome::Failure
            }
        }
    }

    /// The entry stays in the held list until the next reload.
    pub async fn delete(&self, id: i64) -> Outcome {
        match self.api.delete_entry(id).await {
            Ok(()) => {
                info!("Deleted entry {}", id);
                self.notifications.success("Success", "Anime deleted!");
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                Outcome::Failure
            }
        }
    }

    /// Delete each id with its own request, in order. A failure does not
    /// stop the remaining deletes.
    pub async fn delete_many(&self, ids: &[i64]) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        for &id in ids {
            match self.api.delete_entry(id).await {
                Ok(()) => {
                    info!("Deleted entry {}", id);
                    report.deleted.push(id);
                }
                Err(e) => {
                    error!("Failed to delete entry {}: {}", id, e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        if report.is_complete() {
            self.notifications
                .success("Success", format!("Deleted {} anime", report.deleted.len()));
        } else {
            let failed: Vec<String> = report.failed.iter().map(|(id, _)| id.to_string()).collect();
            self.notifications.failure(
                "Error",
                format!(
                    "Deleted {} of {} anime; failed: {}",
                    report.deleted.len(),
                    report.attempted(),
                    failed.join(", ")
                ),
            );
        }
        report
    }

    /// Fetch the full entry (with comments) and hold it as selected. On
    /// failure the previous selection is kept.
    pub async fn select_for_detail(&self, id: i64) -> Outcome {
        match self.api.get_entry(id).await {
            Ok(entry) => {
                self.set_selected(entry);
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                Outcome::Failure
            }
        }
    }

    /// Upload an asset of the given kind. Files whose declared type does not
    /// match are rejected before any request is made.
    pub async fn upload_media(&self, kind: MediaKind, file: &UploadFile) -> Option<String> {
        if let Err(e) = file.ensure_kind(kind) {
            debug!("Rejected upload of {}: {}", file.file_name, e);
            self.notifications.failure("Error", kind.wrong_type_message());
            return None;
        }

        match self.api.upload(file).await {
            Ok(url) => {
                let what = match kind {
                    MediaKind::Image => "Cover",
                    MediaKind::Video => "Video",
                    MediaKind::Audio => "Music",
                };
                self.notifications.success("Success", format!("{} uploaded!", what));
                Some(url)
            }
            Err(ApiError::AuthorizationRequired) => {
                self.notifications.failure("Error", "Sign in to upload files");
                None
            }
            Err(e) => {
                self.notifications
                    .failure("Error", format!("Failed to upload {}: {}", kind, e));
                None
            }
        }
    }

    pub async fn upload_thumbnail(&self, file: &UploadFile) -> Option<String> {
        self.upload_media(MediaKind::Image, file).await
    }

    pub async fn upload_video(&self, file: &UploadFile) -> Option<String> {
        self.upload_media(MediaKind::Video, file).await
    }

    pub async fn upload_music(&self, file: &UploadFile) -> Option<String> {
        self.upload_media(MediaKind::Audio, file).await
    }

    /// Upload and store the resulting URL in the new-entry draft.
    pub async fn upload_into_draft(&self, kind: MediaKind, file: &UploadFile) -> Outcome {
        match self.upload_media(kind, file).await {
            Some(url) => {
                self.attach_upload(kind, url);
                Outcome::Success
            }
            None => Outcome::Failure,
        }
    }

    pub fn attach_upload(&self, kind: MediaKind, url: impl Into<String>) {
        self.state().draft.set_media(kind, url);
    }

    /// Active banners for the carousel. Banners are decorative, so a failed
    /// fetch is logged and yields an empty list.
    pub async fn banners(&self) -> Vec<Banner> {
        match self.api.list_banners().await {
            Ok(banners) => banners,
            Err(e) => {
                error!("Failed to load banners: {}", e);
                Vec::new()
            }
        }
    }
}
