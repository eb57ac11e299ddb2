//! Alert aggregation.

use hostwatch_types::{AlertBatch, Notification};

/// Merge the batches of one cycle into a single notification.
///
/// Non-empty batches are rendered under their heading in the order given.
/// Returns `None` when every batch is empty, which means nothing should be
/// delivered this cycle.
pub fn aggregate(title: &str, batches: &[AlertBatch]) -> Option<Notification> {
    let body: String = batches
        .iter()
        .filter(|b| !b.is_empty())
        .map(AlertBatch::render)
        .collect();

    if body.is_empty() {
        None
    } else {
        Some(Notification::new(title, body))
    }
}
