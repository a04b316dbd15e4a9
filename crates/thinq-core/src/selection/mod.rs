//! Exclusive selection: at most one document per collection carries
//! `is_selected == true`.


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use thinq_types::{DocRef, Document, Fields, Filter, SelectableEntity, WriteOp, SELECTED_FIELD};

use crate::store::{DocumentStore, StoreResult};

fn selected_flag(selected: bool) -> Fields {
    let mut fields = Fields::new();
    fields.insert(SELECTED_FIELD.to_string(), Value::Bool(selected));
    fields
}

pub struct ExclusiveSelectionService {
    store: Arc<dyn DocumentStore>,
    collection: String,
    violations: AtomicU64,
}

impl ExclusiveSelectionService {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self { store, collection: collection.into(), violations: AtomicU64::new(0) }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Make `candidate_id` the only selected document.
    ///
    /// Clearing every selected document and setting the candidate happen in
    /// one atomic commit; a missing candidate fails the whole commit with
    /// `NotFound` and nothing changes.
    pub async fn select(&self, candidate_id: &str) -> StoreResult<()> {
        // Cheap early NotFound; the commit re-checks inside its atomic section.
        self.store.get(&self.collection, candidate_id).await?;

        let summary = self
            .store
            .atomic_commit(vec![
                WriteOp::UpdateWhere {
                    collection: self.collection.clone(),
                    filter: Filter::eq(SELECTED_FIELD, json!(true)),
                    fields: selected_flag(false),
                },
                WriteOp::Update {
                    target: DocRef::new(&self.collection, candidate_id),
                    fields: selected_flag(true),
                },
            ])
            .await?;

        tracing::info!(
            "⭐ Selected {}/{} ({} document(s) written)",
            self.collection,
            candidate_id,
            summary.documents_written
        );
        Ok(())
    }

    /// The selected document, if any.
    ///
    /// More than one selected document means something wrote the flag
    /// outside [`Self::select`]; the lowest id wins and the violation is
    /// logged and counted.
    pub async fn get_selected_document(&self) -> StoreResult<Option<Document>> {
        let mut selected =
            self.store.query(&self.collection, &Filter::eq(SELECTED_FIELD, json!(true)), None).await?;

        if selected.len() > 1 {
            self.violations.fetch_add(1, Ordering::SeqCst);
            let ids: Vec<&str> = selected.iter().map(|doc| doc.id.as_str()).collect();
            tracing::warn!(
                "⚠️ {} documents selected in '{}' ({}); returning {}",
                selected.len(),
                self.collection,
                ids.join(", "),
                ids[0]
            );
        }

        // `query` orders by id.
        Ok(if selected.is_empty() { None } else { Some(selected.swap_remove(0)) })
    }

    pub async fn get_selected(&self) -> StoreResult<Option<SelectableEntity>> {
        Ok(self.get_selected_document().await?.as_ref().map(SelectableEntity::from))
    }

    /// Times more than one selected document was observed.
    pub fn violations_observed(&self) -> u64 {
        self.violations.load(Ordering::SeqCst)
    }
}
