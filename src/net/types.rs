//! Wire DTOs for the class-community REST backend.
//!
//! DESIGN
//! ======
//! Field names follow the backend's JSON verbatim so serde needs no renames.
//! Timestamps stay as the ISO-8601 strings the backend sends; the client
//! only displays them. `User` is treated as opaque beyond its `id`. Response
//! models keep unknown fields in `extra`, so records pass through without
//! losing anything the backend sent and a user is always replaced wholesale.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// USERS & AUTH
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

/// A classmate record as returned by `/auth/me`, `/users/...`, and login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Remaining profile fields (bio, phone, dormitory, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Best available display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.username.clone())
            .or_else(|| self.extra.get("name").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/login` responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wechat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dormitory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
}

/// Partial profile update for `PUT /users/me`; absent fields are left alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wechat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dormitory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_users: u64,
    pub students_count: u64,
    pub teachers_count: u64,
    pub admins_count: u64,
    pub active_users: u64,
    #[serde(default)]
    pub dormitories: Vec<Value>,
}

// =============================================================================
// ACTIVITIES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub activity_date: Option<String>,
    pub location: Option<String>,
    pub creator_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub creator: Option<User>,
    /// Fields this client does not model, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_activities: u64,
    pub upcoming_activities: u64,
    pub completed_activities: u64,
    pub ongoing_activities: u64,
}

// =============================================================================
// MEDIA
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub filename: String,
    pub original_filename: String,
    /// Path relative to the backend's upload root, e.g. `photos/<uuid>.jpg`.
    pub file_path: String,
    pub file_size: Option<u64>,
    pub media_type: MediaType,
    pub activity_id: i64,
    pub uploader_id: i64,
    pub upload_time: String,
    #[serde(default)]
    pub views_count: u64,
    pub uploader: Option<User>,
    pub activity: Option<Activity>,
    /// Fields this client does not model, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A file to send to `POST /media/upload` as multipart form data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaUpload {
    pub activity_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStats {
    pub total_media: u64,
    pub total_photos: u64,
    pub total_videos: u64,
    pub total_views: u64,
}

// =============================================================================
// COMMENTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub media_item_id: i64,
    pub author_id: i64,
    pub parent_id: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub author: Option<User>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    /// Fields this client does not model, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    pub content: String,
    pub media_item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub user_id: i64,
    #[serde(default)]
    pub is_read: bool,
    pub related_comment_id: Option<i64>,
    pub created_at: String,
    /// Fields this client does not model, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total_notifications: u64,
    pub unread_notifications: u64,
    pub read_notifications: u64,
}

/// Acknowledgement body returned by delete/mark/logout endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message: String,
}
