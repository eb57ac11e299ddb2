//! Notification - the payload delivered to the webhook.

/// A push notification.
///
/// Serializes (with the `serde` feature) to exactly
/// `{"title": "...", "body": "..."}`, the shape the webhook expects.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}
