//! Notifiers that live outside the adapters crate.

use async_trait::async_trait;
use hostwatch_adapters::webhook::Notifier;
use hostwatch_adapters::AdapterError;
use hostwatch_types::Notification;

/// Prints each notification to stdout as the JSON the webhook would receive.
///
/// Used for `--dry-run`. Rate-limit state is still recorded, exactly as for
/// a real delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintNotifier;

impl PrintNotifier {
    pub fn new() -> Self {
        Self
    }

    /// The payload as pretty-printed JSON.
    pub fn render(notification: &Notification) -> Result<String, AdapterError> {
        serde_json::to_string_pretty(notification).map_err(|e| AdapterError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Notifier for PrintNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), AdapterError> {
        println!("{}", Self::render(notification)?);
        Ok(())
    }

    fn description(&self) -> &str {
        "stdout"
    }
}
