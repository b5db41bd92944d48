//! Reload-after-mutation policy.
//!
//! The controllers never refresh the catalog list on their own. Everything a
//! front end does that should be followed by a reload goes through
//! [`CatalogSession`], which remembers the last filters used and reloads with
//! them after each successful mutation.

use std::sync::{Arc, Mutex};

use futures::FutureExt;
use log::info;

use crate::api_client::ApiClient;
use crate::auth::AuthController;
use crate::banners::BannerCarousel;
use crate::catalog::{BulkDeleteReport, CatalogController};
use crate::comments::CommentController;
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::filters::CatalogFilters;
use crate::manage::Selection;
use crate::models::{CatalogEntry, Rating, User};
use crate::notifications::Notifications;
use crate::session::{FileTokenStore, SessionContext, TokenStore};
use crate::Outcome;

pub struct CatalogSession {
    session: Arc<SessionContext>,
    notifications: Arc<Notifications>,
    auth: AuthController,
    catalog: CatalogController,
    comments: CommentController,
    filters: Mutex<CatalogFilters>,
}

impl CatalogSession {
    /// Wire the three controllers to one API client and one session context.
    pub fn new(config: &ApiConfig, store: impl TokenStore + 'static) -> ApiResult<Self> {
        let session = Arc::new(SessionContext::new(store));
        let api = ApiClient::new(config, session)?;
        Ok(Self::from_client(api))
    }

    /// Session persisted to the configured session file.
    pub fn with_session_file(config: &ApiConfig) -> ApiResult<Self> {
        Self::new(config, FileTokenStore::new(config.session_file.clone()))
    }

    pub fn from_client(api: ApiClient) -> Self {
        let notifications = Arc::new(Notifications::new());
        Self {
            session: api.session().clone(),
            auth: AuthController::new(api.clone(), notifications.clone()),
            catalog: CatalogController::new(api.clone(), notifications.clone()),
            comments: CommentController::new(api, notifications.clone()),
            notifications,
            filters: Mutex::new(CatalogFilters::default()),
        }
    }

    /// Load any persisted token and check it with the server. Silent: the
    /// result is just the signed-in user, if any.
    pub async fn start(&self) -> Option<User> {
        if !self.session.init_session() {
            return None;
        }
        self.auth.verify().await
    }

    /// Sign out and drop every piece of per-user state.
    pub fn teardown(&self) {
        self.auth.logout();
        self.catalog.clear_selected();
        self.comments.set_draft(String::new());
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn notifications(&self) -> &Arc<Notifications> {
        &self.notifications
    }

    pub fn auth(&self) -> &AuthController {
        &self.auth
    }

    pub fn catalog(&self) -> &CatalogController {
        &self.catalog
    }

    pub fn comments(&self) -> &CommentController {
        &self.comments
    }

    pub fn filters(&self) -> CatalogFilters {
        self.filters.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Switch to new filters and load with them.
    pub async fn browse(&self, filters: CatalogFilters) -> Outcome {
        *self.filters.lock().unwrap_or_else(|e| e.into_inner()) = filters.clone();
        self.catalog.load(&filters).await
    }

    /// Load again with the last filters used.
    pub async fn reload(&self) -> Outcome {
        let filters = self.filters();
        self.catalog.load(&filters).await
    }

    pub async fn create_and_reload(&self) -> Outcome {
        self.reload_after(self.catalog.create().await).await
    }

    pub async fn update_and_reload(&self, entry: &CatalogEntry) -> Outcome {
        self.reload_after(self.catalog.update(entry).await).await
    }

    pub async fn delete_and_reload(&self, id: i64) -> Outcome {
        self.reload_after(self.catalog.delete(id).await).await
    }

    /// Delete every selected id, one request each. The selection is cleared
    /// whatever happens and the list is reloaded once at the end, so ids that
    /// failed to delete show up again. The report says which ones.
    pub async fn bulk_delete(&self, selection: &mut Selection) -> BulkDeleteReport {
        if selection.is_empty() {
            return BulkDeleteReport::default();
        }
        let ids = selection.ids().to_vec();
        selection.clear();

        let report = self.catalog.delete_many(&ids).await;
        info!(
            "Bulk delete: {} deleted, {} failed",
            report.deleted.len(),
            report.failed.len()
        );
        self.reload().await;
        report
    }

    pub async fn open_detail(&self, id: i64) -> Outcome {
        self.catalog.select_for_detail(id).await
    }

    /// Rate the entry open in the detail view; refreshes both the detail and
    /// the list.
    pub async fn rate_selected(&self, rating: Rating) -> Outcome {
        let target = self.catalog.selected();
        let reload = async {
            self.reload().await;
        }
        .boxed_local();
        self.comments
            .submit_rating(
                target.as_ref(),
                rating,
                |entry| self.catalog.set_selected(entry),
                Some(reload),
            )
            .await
    }

    /// Post the comment draft on the entry open in the detail view.
    pub async fn comment_on_selected(&self) -> Outcome {
        let target = self.catalog.selected();
        self.comments
            .add_comment(target.as_ref(), |entry| self.catalog.set_selected(entry))
            .await
    }

    pub async fn load_banners(&self) -> BannerCarousel {
        BannerCarousel::new(self.catalog.banners().await)
    }

    async fn reload_after(&self, outcome: Outcome) -> Outcome {
        if outcome.is_success() {
            self.reload().await;
        }
        outcome
    }
}
