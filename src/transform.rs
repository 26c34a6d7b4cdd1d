//! Raw search items → validated campground records.
//!
//! Every item either becomes a record or is rejected with its reason;
//! nothing is retried and source order is preserved.

use serde_json::Value;
use std::collections::HashSet;

use crate::logging::{self, DataSource};
use crate::model::{CampgroundRecord, FieldIssue, ValidationError};
use crate::schema::validate_item;

/// Result of transforming one page of items.
///
/// `records.len() + rejected.len()` always equals the number of input items.
#[derive(Debug, Default)]
pub struct TransformOutcome {
    pub records: Vec<CampgroundRecord>,
    /// `(index in the source page, reason)` for every dropped item.
    pub rejected: Vec<(usize, ValidationError)>,
}

impl TransformOutcome {
    pub fn total(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// Validates each item, keeping the valid ones in source order.
///
/// A second item carrying an `id` already seen in this page is rejected: a
/// single upsert statement cannot touch the same row twice.
pub fn transform(items: &[Value]) -> TransformOutcome {
    let mut outcome = TransformOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        let result = validate_item(item).and_then(|record| {
            if seen.insert(record.id.clone()) {
                Ok(record)
            } else {
                Err(ValidationError {
                    id: Some(record.id),
                    issues: vec![FieldIssue {
                        field: "id".to_string(),
                        problem: "duplicate id within batch".to_string(),
                    }],
                })
            }
        });

        match result {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                logging::warn(
                    DataSource::Pipeline,
                    e.id.as_deref(),
                    &format!("Dropping item #{}: {}", index, e),
                );
                outcome.rejected.push((index, e));
            }
        }
    }

    outcome
}
