//! Typed wrapper over the content API.
//!
//! This is the only module that performs network I/O. Every call returns
//! `ApiResult`; non-2xx responses become [`ApiError::Server`] carrying the
//! body's `error` field.

use std::sync::Arc;

use log::{debug, error, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::config::{ApiConfig, Endpoints};
use crate::error::{ApiError, ApiResult};
use crate::filters::CatalogFilters;
use crate::models::{
    AuthAction, AuthRequest, AuthResponse, Banner, CatalogEntry, Comment, CommentRequest,
    EntryPayload, ErrorBody, MessageResponse, PasswordChangeRequest, Rating, RatingRequest,
    RatingSummary, UploadResponse, User, VerifyResponse,
};
use crate::session::SessionContext;
use crate::upload::UploadFile;

/// Header the session token travels in. Never sent as a cookie.
pub const AUTH_HEADER: &str = "X-Auth-Token";
pub const FILE_NAME_HEADER: &str = "X-File-Name";

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoints: Endpoints,
    session: Arc<SessionContext>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionContext>) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config.endpoints.clone(), session))
    }

    /// Reuse an existing [`reqwest::Client`] (connection pool shared with the caller).
    pub fn with_client(client: reqwest::Client, endpoints: Endpoints, session: Arc<SessionContext>) -> Self {
        Self {
            client,
            endpoints,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // Auth

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.authenticate(AuthAction::Login, email, password, "Login failed").await
    }

    pub async fn register(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.authenticate(AuthAction::Register, email, password, "Registration failed")
            .await
    }

    async fn authenticate(
        &self,
        action: AuthAction,
        email: &str,
        password: &str,
        fallback: &str,
    ) -> ApiResult<AuthResponse> {
        info!("POST {} ({:?})", self.endpoints.auth, action);
        let response = self
            .client
            .post(&self.endpoints.auth)
            .json(&AuthRequest {
                action,
                email,
                password,
            })
            .send()
            .await?;
        parse_json(response, fallback).await
    }

    pub async fn verify(&self) -> ApiResult<User> {
        let token = self.require_token()?;
        debug!("GET {} (verify)", self.endpoints.auth);
        let response = self
            .client
            .get(&self.endpoints.auth)
            .header(AUTH_HEADER, token)
            .send()
            .await?;
        let body: VerifyResponse = parse_json(response, "Verification failed").await?;
        Ok(body.user)
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> ApiResult<MessageResponse> {
        let token = self.require_token()?;
        info!("POST {}", self.endpoints.change_password);
        let response = self
            .client
            .post(&self.endpoints.change_password)
            .header(AUTH_HEADER, token)
            .json(&PasswordChangeRequest {
                old_password,
                new_password,
            })
            .send()
            .await?;
        parse_json(response, "Failed to change password").await
    }

    // Catalog

    pub async fn list_entries(&self, filters: &CatalogFilters) -> ApiResult<Vec<CatalogEntry>> {
        let params = filters.query_pairs();
        debug!("GET {} {:?}", self.endpoints.anime, params);
        let mut request = self.client.get(&self.endpoints.anime);
        if !params.is_empty() {
            request = request.query(&params);
        }
        let response = request.send().await?;
        parse_json(response, "Failed to fetch anime").await
    }

    /// Full representation of one entry, comments included.
    pub async fn get_entry(&self, id: i64) -> ApiResult<CatalogEntry> {
        debug!("GET {}?id={}", self.endpoints.anime, id);
        let response = self
            .client
            .get(&self.endpoints.anime)
            .query(&[("id", id)])
            .send()
            .await?;
        parse_json(response, "Failed to fetch anime").await
    }

    pub async fn create_entry(&self, payload: &EntryPayload) -> ApiResult<CatalogEntry> {
        let token = self.require_token()?;
        info!("POST {} (create \"{}\")", self.endpoints.anime, payload.title);
        let response = self
            .client
            .post(&self.endpoints.anime)
            .header(AUTH_HEADER, token)
            .json(payload)
            .send()
            .await?;
        parse_json(response, "Failed to create anime").await
    }

    pub async fn update_entry(&self, payload: &EntryPayload) -> ApiResult<CatalogEntry> {
        let token = self.require_token()?;
        let id = payload
            .id
            .ok_or_else(|| ApiError::Validation("Cannot update an entry without an id".to_string()))?;
        info!("PUT {} (update {})", self.endpoints.anime, id);
        let response = self
            .client
            .put(&self.endpoints.anime)
            .header(AUTH_HEADER, token)
            .json(payload)
            .send()
            .await?;
        parse_json(response, "Failed to update anime").await
    }

    pub async fn delete_entry(&self, id: i64) -> ApiResult<()> {
        let token = self.require_token()?;
        info!("DELETE {}?id={}", self.endpoints.anime, id);
        let response = self
            .client
            .delete(&self.endpoints.anime)
            .header(AUTH_HEADER, token)
            .query(&[("id", id)])
            .send()
            .await?;
        check_status(response, "Failed to delete anime").await
    }

    // Ratings and comments

    pub async fn rate(&self, entry_id: i64, rating: Rating) -> ApiResult<RatingSummary> {
        let token = self.require_token()?;
        info!("POST {} (entry {} -> {})", self.endpoints.ratings, entry_id, rating);
        let response = self
            .client
            .post(&self.endpoints.ratings)
            .header(AUTH_HEADER, token)
            .json(&RatingRequest {
                anime_id: entry_id,
                rating,
            })
            .send()
            .await?;
        parse_json(response, "Failed to rate anime").await
    }

    pub async fn create_comment(&self, entry_id: i64, text: &str) -> ApiResult<Comment> {
        let token = self.require_token()?;
        info!("POST {} (entry {})", self.endpoints.comments, entry_id);
        let response = self
            .client
            .post(&self.endpoints.comments)
            .header(AUTH_HEADER, token)
            .json(&CommentRequest {
                anime_id: entry_id,
                comment_text: text,
            })
            .send()
            .await?;
        parse_json(response, "Failed to create comment").await
    }

    pub async fn list_comments(&self, entry_id: i64) -> ApiResult<Vec<Comment>> {
        debug!("GET {}?anime_id={}", self.endpoints.comments, entry_id);
        let response = self
            .client
            .get(&self.endpoints.comments)
            .query(&[("anime_id", entry_id)])
            .send()
            .await?;
        parse_json(response, "Failed to fetch comments").await
    }

    // Media and banners

    /// Send raw bytes to the storage service and get back the asset URL.
    pub async fn upload(&self, file: &UploadFile) -> ApiResult<String> {
        let token = self.require_token()?;
        info!(
            "POST {} ({}, {} bytes, {})",
            self.endpoints.upload,
            file.file_name,
            file.len(),
            file.media_type
        );
        let response = self
            .client
            .post(&self.endpoints.upload)
            .header(AUTH_HEADER, token)
            .header(CONTENT_TYPE, file.media_type.as_str())
            .header(FILE_NAME_HEADER, file.file_name.as_str())
            .body(file.data.clone())
            .send()
            .await?;
        let body: UploadResponse = parse_json(response, "Failed to upload file").await?;
        Ok(body.url)
    }

    pub async fn list_banners(&self) -> ApiResult<Vec<Banner>> {
        debug!("GET {}", self.endpoints.banners);
        let response = self.client.get(&self.endpoints.banners).send().await?;
        parse_json(response, "Failed to fetch banners").await
    }

    fn require_token(&self) -> ApiResult<String> {
        self.session.token().ok_or(ApiError::AuthorizationRequired)
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, fallback: &str) -> ApiResult<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(server_error(status.as_u16(), &body, fallback));
    }

    serde_json::from_slice(&body).map_err(|e| {
        error!("Failed to decode response ({}): {}", status, e);
        ApiError::Decode(e.to_string())
    })
}

async fn check_status(response: Response, fallback: &str) -> ApiResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.bytes().await?;
    Err(server_error(status.as_u16(), &body, fallback))
}

fn server_error(status: u16, body: &[u8], fallback: &str) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    error!("Content API returned {}: {}", status, message);
    ApiError::Server { status, message }
}
