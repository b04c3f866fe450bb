use serde::{Deserialize, Serialize};

/// Metadata for one saved image.
///
/// `image` is the identity key used when merging; `image_name` is display
/// data only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
}

impl ImageEntry {
    /// Two entries describe the same image when their `image` references match
    pub fn same_image(&self, other: &ImageEntry) -> bool {
        self.image == other.image
    }

    /// Overwrite everything except `image_name` with the values from `incoming`
    pub fn overwrite_from(&mut self, incoming: &ImageEntry) {
        self.image = incoming.image.clone();
        self.category = incoming.category.clone();
        self.date = incoming.date.clone();
        self.saved = incoming.saved;
    }
}

/// A user's stored image list, keyed by `user_name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub user_name: String,
    #[serde(rename = "imageData", default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageEntry>,
}

/// Result of a successful merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
}

impl MergeOutcome {
    /// Message returned to the client
    pub fn message(&self) -> &'static str {
        match self {
            MergeOutcome::Created => "New user entry created",
            MergeOutcome::Updated => "User entry updated",
        }
    }
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeOutcome::Created => write!(f, "created"),
            MergeOutcome::Updated => write!(f, "updated"),
        }
    }
}

/// Per-user profile data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_image: Option<String>,
    #[serde(default)]
    pub user_name: String,
}

/// `{"message": "..."}` response body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
