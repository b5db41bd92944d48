use std::sync::{Arc, Mutex};

use futures::future::LocalBoxFuture;
use log::info;

use crate::api_client::ApiClient;
use crate::models::{CatalogEntry, Rating};
use crate::notifications::Notifications;
use crate::Outcome;

/// Owns the comment being typed and submits comments and ratings against a
/// single entry.
pub struct CommentController {
    api: ApiClient,
    notifications: Arc<Notifications>,
    draft: Mutex<String>,
}

impl CommentController {
    pub fn new(api: ApiClient, notifications: Arc<Notifications>) -> Self {
        Self {
            api,
            notifications,
            draft: Mutex::new(String::new()),
        }
    }

    pub fn draft(&self) -> String {
        self.draft.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock().unwrap_or_else(|e| e.into_inner()) = text.into();
    }

    /// Post the draft on `target`, then hand the re-fetched entry (now
    /// carrying the comment) to `on_entry_updated`.
    ///
    /// Nothing happens without a target or with a blank draft.
    pub async fn add_comment<U>(&self, target: Option<&CatalogEntry>, on_entry_updated: U) -> Outcome
    where
        U: FnOnce(CatalogEntry),
    {
        let target = match target {
            Some(target) => target,
            None => return Outcome::Skipped,
        };
        let text = self.draft();
        if text.trim().is_empty() {
            return Outcome::Skipped;
        }

        if let Err(e) = self.api.create_comment(target.id, &text).await {
            self.notifications.failure("Error", e.to_string());
            return Outcome::Failure;
        }
        info!("Comment posted on entry {}", target.id);
        self.notifications.notice("Comment added");
        self.set_draft(String::new());

        match self.api.get_entry(target.id).await {
            Ok(refreshed) => {
                on_entry_updated(refreshed);
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                Outcome::Failure
            }
        }
    }

    /// Rate `target`. On success the entry is re-fetched so the detail view
    /// shows the new aggregate, and `on_list_reload` (if given) runs at the
    /// same time so list cards show it too.
    pub async fn submit_rating<U>(
        &self,
        target: Option<&CatalogEntry>,
        rating: Rating,
        on_entry_updated: U,
        on_list_reload: Option<LocalBoxFuture<'_, ()>>,
    ) -> Outcome
    where
        U: FnOnce(CatalogEntry),
    {
        let target = match target {
            Some(target) => target,
            None => return Outcome::Skipped,
        };

        let summary = match self.api.rate(target.id, rating).await {
            Ok(summary) => summary,
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                return Outcome::Failure;
            }
        };
        info!(
            "Rated entry {} with {} (now {:.1} from {} ratings)",
            target.id, rating, summary.rating, summary.rating_count
        );
        self.notifications
            .success("Rating saved", format!("You rated it {}", rating));

        let reload = async move {
            if let Some(reload) = on_list_reload {
                reload.await;
            }
        };
        let (refreshed, ()) = futures::join!(self.api.get_entry(target.id), reload);

        match refreshed {
            Ok(entry) => {
                on_entry_updated(entry);
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                Outcome::Failure
            }
        }
    }
}
