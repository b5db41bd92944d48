use std::sync::{Arc, Mutex};

use log::{debug, info};

use crate::api_client::ApiClient;
use crate::error::ApiError;
use crate::models::User;
use crate::notifications::Notifications;
use crate::session::SessionContext;
use crate::Outcome;

/// Shortest new password accepted before asking the server.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Client-side pre-check for a password change. Passing it says nothing
/// about whether the server will accept the new password.
pub fn check_password_change(old_password: &str, new_password: &str, confirmation: &str) -> Result<(), String> {
    if old_password.is_empty() || new_password.is_empty() || confirmation.is_empty() {
        return Err("Fill in all password fields".to_string());
    }
    if new_password != confirmation {
        return Err("Passwords do not match".to_string());
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

/// Owns the current user. Anonymous when `current_user` is `None`.
pub struct AuthController {
    api: ApiClient,
    notifications: Arc<Notifications>,
    user: Mutex<Option<User>>,
}

impl AuthController {
    pub fn new(api: ApiClient, notifications: Arc<Notifications>) -> Self {
        Self {
            api,
            notifications,
            user: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        self.api.session()
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|u| u.is_admin)
            .unwrap_or(false)
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.lock().unwrap_or_else(|e| e.into_inner()) = user;
    }

    /// Background check of the persisted token. Never notifies and never
    /// fails: the result is simply authenticated or anonymous.
    pub async fn verify(&self) -> Option<User> {
        match self.api.verify().await {
            Ok(user) => {
                debug!("Session verified for user {}", user.id);
                self.set_user(Some(user.clone()));
                Some(user)
            }
            Err(ApiError::AuthorizationRequired) => {
                debug!("No persisted session");
                self.set_user(None);
                None
            }
            Err(e) => {
                debug!("Session verification failed: {}", e);
                self.set_user(None);
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Outcome {
        if let Err(message) = check_credentials(email, password) {
            self.notifications.failure("Sign-in failed", message);
            return Outcome::Failure;
        }

        match self.api.login(email.trim(), password).await {
            Ok(response) => {
                self.session().begin(response.token);
                info!("User {} signed in", response.user.id);
                self.notifications
                    .success("Signed in", format!("Welcome, {}!", response.user.email));
                self.set_user(Some(response.user));
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Sign-in failed", e.to_string());
                Outcome::Failure
            }
        }
    }

    /// A new account is signed in straight away with the token the server
    /// returns on registration.
    pub async fn register(&self, email: &str, password: &str) -> Outcome {
        if let Err(message) = check_credentials(email, password) {
            self.notifications.failure("Registration failed", message);
            return Outcome::Failure;
        }

        match self.api.register(email.trim(), password).await {
            Ok(response) => {
                self.session().begin(response.token);
                info!("User {} registered", response.user.id);
                self.notifications.success("Registration complete", "Welcome!");
                self.set_user(Some(response.user));
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Registration failed", e.to_string());
                Outcome::Failure
            }
        }
    }

    /// Purely local: the token is dropped here but the server is not told.
    pub fn logout(&self) {
        self.session().teardown_session();
        self.set_user(None);
        self.notifications.notice("Signed out");
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str, confirmation: &str) -> Outcome {
        if let Err(message) = check_password_change(old_password, new_password, confirmation) {
            self.notifications.failure("Error", message);
            return Outcome::Failure;
        }

        match self.api.change_password(old_password, new_password).await {
            Ok(response) => {
                let message = if response.message.is_empty() {
                    "Password changed successfully!".to_string()
                } else {
                    response.message
                };
                self.notifications.success("Success", message);
                Outcome::Success
            }
            Err(e) => {
                self.notifications.failure("Error", e.to_string());
                Outcome::Failure
            }
        }
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.is_empty() {
        Err("Email and password are required".to_string())
    } else {
        Ok(())
    }
}
