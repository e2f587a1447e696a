//! REST API surface, one namespace per backend resource.
//!
//! Each method is a single HTTP call through [`HttpClient`]: no retries,
//! no caching, no local validation. Failures arrive already reported by the
//! client's interception and are returned unchanged.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use reqwest::multipart::{Form, Part};

use super::error::ApiError;
use super::http::{HttpClient, Query};
use super::types::{
    Activity, ActivityDraft, ActivityPatch, ActivityStats, Comment, CommentDraft, Credentials, LoginResponse,
    MediaItem, MediaStats, MediaUpload, Message, Notification, NotificationStats, ProfileUpdate, RegisterRequest,
    User, UserStats,
};

#[derive(Clone)]
pub struct Api {
    http: HttpClient,
}

impl Api {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { http: &self.http }
    }

    #[must_use]
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { http: &self.http }
    }

    #[must_use]
    pub fn activities(&self) -> ActivitiesApi<'_> {
        ActivitiesApi { http: &self.http }
    }

    #[must_use]
    pub fn media(&self) -> MediaApi<'_> {
        MediaApi { http: &self.http }
    }

    #[must_use]
    pub fn comments(&self) -> CommentsApi<'_> {
        CommentsApi { http: &self.http }
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationsApi<'_> {
        NotificationsApi { http: &self.http }
    }
}

// =============================================================================
// AUTH
// =============================================================================

pub struct AuthApi<'a> {
    http: &'a HttpClient,
}

impl AuthApi<'_> {
    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.http.post("/auth/login", credentials).await
    }

    /// `POST /auth/register`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.http.post("/auth/register", request).await
    }

    /// `GET /auth/me`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.http.get("/auth/me", None).await
    }

    /// `POST /auth/logout`; the backend only acknowledges.
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn logout(&self) -> Result<Message, ApiError> {
        self.http.post_empty("/auth/logout").await
    }
}

// =============================================================================
// USERS
// =============================================================================

pub struct UsersApi<'a> {
    http: &'a HttpClient,
}

impl UsersApi<'_> {
    /// `GET /users/`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn list(&self, query: &Query) -> Result<Vec<User>, ApiError> {
        self.http.get("/users/", Some(query)).await
    }

    /// `GET /users/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn get(&self, id: i64) -> Result<User, ApiError> {
        self.http.get(&format!("/users/{id}"), None).await
    }

    /// `PUT /users/me`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.http.put("/users/me", update).await
    }

    /// `GET /users/stats/summary`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn stats(&self) -> Result<UserStats, ApiError> {
        self.http.get("/users/stats/summary", None).await
    }
}

// =============================================================================
// ACTIVITIES
// =============================================================================

pub struct ActivitiesApi<'a> {
    http: &'a HttpClient,
}

impl ActivitiesApi<'_> {
    /// `GET /activities/`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn list(&self, query: &Query) -> Result<Vec<Activity>, ApiError> {
        self.http.get("/activities/", Some(query)).await
    }

    /// `GET /activities/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn get(&self, id: i64) -> Result<Activity, ApiError> {
        self.http.get(&format!("/activities/{id}"), None).await
    }

    /// `POST /activities/`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn create(&self, draft: &ActivityDraft) -> Result<Activity, ApiError> {
        self.http.post("/activities/", draft).await
    }

    /// `PUT /activities/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn update(&self, id: i64, patch: &ActivityPatch) -> Result<Activity, ApiError> {
        self.http.put(&format!("/activities/{id}"), patch).await
    }

    /// `DELETE /activities/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn delete(&self, id: i64) -> Result<Message, ApiError> {
        self.http.delete(&format!("/activities/{id}")).await
    }

    /// `GET /activities/stats/summary`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn stats(&self) -> Result<ActivityStats, ApiError> {
        self.http.get("/activities/stats/summary", None).await
    }
}

// =============================================================================
// MEDIA
// =============================================================================

pub struct MediaApi<'a> {
    http: &'a HttpClient,
}

impl MediaApi<'_> {
    /// `GET /media/`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn list(&self, query: &Query) -> Result<Vec<MediaItem>, ApiError> {
        self.http.get("/media/", Some(query)).await
    }

    /// `GET /media/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn get(&self, id: i64) -> Result<MediaItem, ApiError> {
        self.http.get(&format!("/media/{id}"), None).await
    }

    /// `POST /media/upload` as `multipart/form-data` with fields
    /// `activity_id`, `title`, optional `description`, and `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Build`] for an unparseable content type, otherwise
    /// the reported [`ApiError`] on failure.
    pub async fn upload(&self, upload: MediaUpload) -> Result<MediaItem, ApiError> {
        let file = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| ApiError::Build(e.to_string()))?;
        let mut form = Form::new()
            .text("activity_id", upload.activity_id.to_string())
            .text("title", upload.title);
        if let Some(description) = upload.description {
            form = form.text("description", description);
        }
        self.http.post_multipart("/media/upload", form.part("file", file)).await
    }

    /// `DELETE /media/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn delete(&self, id: i64) -> Result<Message, ApiError> {
        self.http.delete(&format!("/media/{id}")).await
    }

    /// `GET /media/stats/summary`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn stats(&self) -> Result<MediaStats, ApiError> {
        self.http.get("/media/stats/summary", None).await
    }
}

// =============================================================================
// COMMENTS
// =============================================================================

pub struct CommentsApi<'a> {
    http: &'a HttpClient,
}

impl CommentsApi<'_> {
    /// `GET /comments/media/{media_id}`; top-level comments with replies nested.
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn list_for_media(&self, media_id: i64, query: &Query) -> Result<Vec<Comment>, ApiError> {
        self.http.get(&format!("/comments/media/{media_id}"), Some(query)).await
    }

    /// `GET /comments/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn get(&self, id: i64) -> Result<Comment, ApiError> {
        self.http.get(&format!("/comments/{id}"), None).await
    }

    /// `POST /comments/`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn create(&self, draft: &CommentDraft) -> Result<Comment, ApiError> {
        self.http.post("/comments/", draft).await
    }

    /// `DELETE /comments/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn delete(&self, id: i64) -> Result<Message, ApiError> {
        self.http.delete(&format!("/comments/{id}")).await
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

pub struct NotificationsApi<'a> {
    http: &'a HttpClient,
}

impl NotificationsApi<'_> {
    /// `GET /notifications/`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn list(&self, query: &Query) -> Result<Vec<Notification>, ApiError> {
        self.http.get("/notifications/", Some(query)).await
    }

    /// `PUT /notifications/{id}/read`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn mark_as_read(&self, id: i64) -> Result<Message, ApiError> {
        self.http.put_empty(&format!("/notifications/{id}/read")).await
    }

    /// `PUT /notifications/mark-all-read`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn mark_all_as_read(&self) -> Result<Message, ApiError> {
        self.http.put_empty("/notifications/mark-all-read").await
    }

    /// `DELETE /notifications/{id}`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn delete(&self, id: i64) -> Result<Message, ApiError> {
        self.http.delete(&format!("/notifications/{id}")).await
    }

    /// `GET /notifications/stats`
    ///
    /// # Errors
    ///
    /// Returns the reported [`ApiError`] on failure.
    pub async fn stats(&self) -> Result<NotificationStats, ApiError> {
        self.http.get("/notifications/stats", None).await
    }
}
