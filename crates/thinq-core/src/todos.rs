//! Device-facing todo reads, title-addressed progress updates and timed
//! completions recorded as work sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use serde_json::{json, Value};
use thinq_types::{
    CacheConfig, Document, Fields, Filter, StoreError, Todo, TodoCompletion, TodoProgressSummary,
    TodoProgressUpdate, WorkSession,
};

use crate::cache::TtlCache;
use crate::error::{AppError, AppResult};
use crate::store::{DocumentStore, StoreResult};

/// Title → document id, verified against the store on every use.
#[derive(Default)]
struct TitleIndex {
    ids: DashMap<String, String>,
}

impl TitleIndex {
    fn get(&self, title: &str) -> Option<String> {
        self.ids.get(title).map(|id| id.value().clone())
    }

    fn remember(&self, title: &str, id: &str) {
        self.ids.insert(title.to_string(), id.to_string());
    }

    fn evict(&self, title: &str) {
        self.ids.remove(title);
    }
}

pub struct TodoService {
    store: Arc<dyn DocumentStore>,
    collection: String,
    sessions_collection: String,
    titles_limit: usize,
    ttl: Duration,
    /// Keyed by `YYYY-MM-DD`
    titles: TtlCache<String, Vec<String>>,
    index: TitleIndex,
}

impl TodoService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            sessions_collection: "work_sessions".to_string(),
            titles_limit: cache.titles_limit,
            ttl: Duration::from_secs(cache.ttl_secs),
            titles: TtlCache::new(),
            index: TitleIndex::default(),
        }
    }

    pub fn with_sessions_collection(mut self, collection: impl Into<String>) -> Self {
        self.sessions_collection = collection.into();
        self
    }

    /// Titles of open todos due today (server local date).
    pub async fn today_titles(&self) -> StoreResult<Vec<String>> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        self.titles_due_on(&today).await
    }

    /// Titles of open todos due on `date`, cached per date.
    ///
    /// Only the first `titles_limit` open todos (by id) are scanned.
    pub async fn titles_due_on(&self, date: &str) -> StoreResult<Vec<String>> {
        self.titles
            .get_or_compute(date.to_string(), self.ttl, || async {
                let open = self
                    .store
                    .query(
                        &self.collection,
                        &Filter::eq("is_completed", json!(false)),
                        Some(self.titles_limit),
                    )
                    .await?;
                let titles: Vec<String> = open
                    .iter()
                    .map(Todo::from_document)
                    .filter(|todo| todo.is_due_on(date) && !todo.title.is_empty())
                    .map(|todo| todo.title)
                    .collect();
                tracing::debug!("📋 {} open todo(s) due {}", titles.len(), date);
                Ok(titles)
            })
            .await
    }

    /// Apply a progress report to the todo with the given title.
    pub async fn update_progress(&self, update: &TodoProgressUpdate) -> AppResult<Document> {
        let title = update.title.trim();
        if title.is_empty() {
            return Err(AppError::MissingField("title"));
        }

        let id = self.resolve_title(title).await?;
        let doc = match self.store.update(&self.collection, &id, update.to_fields()).await {
            Ok(doc) => doc,
            Err(e) => {
                if e.is_not_found() {
                    self.index.evict(title);
                }
                return Err(e.into());
            },
        };

        self.titles.clear();
        tracing::info!("📝 Updated todo '{}' ({})", title, id);
        Ok(doc)
    }

    /// Every open todo, regardless of due date.
    pub async fn open_todos(&self) -> StoreResult<Vec<Todo>> {
        let open = self
            .store
            .query(&self.collection, &Filter::eq("is_completed", json!(false)), None)
            .await?;
        Ok(open.iter().map(Todo::from_document).collect())
    }

    /// Mark a todo done and record the timed session that finished it.
    pub async fn complete(&self, completion: &TodoCompletion) -> AppResult<(Todo, WorkSession)> {
        if completion.end_time < completion.start_time {
            return Err(AppError::invalid("endTime", "ends before startTime"));
        }

        let doc = self.store.get(&self.collection, &completion.todo_id).await?;
        let todo = Todo::from_document(&doc);
        if todo.is_completed {
            return Err(AppError::Conflict(format!(
                "Todo '{}' is already completed",
                todo.title
            )));
        }

        let session = WorkSession::for_completion(completion, &todo.title);
        let mut fields = Fields::new();
        fields.insert("is_completed".to_string(), Value::Bool(true));
        fields.insert("start_time".to_string(), json!(session.start_time));
        fields.insert("stop_time".to_string(), json!(session.end_time));
        let updated = self.store.update(&self.collection, &todo.id, fields).await?;
        self.store.set(&self.sessions_collection, &session.id, session.to_fields()).await?;

        self.titles.clear();
        tracing::info!(
            "✅ Completed todo '{}' in {}",
            todo.title,
            session.formatted_duration
        );
        Ok((Todo::from_document(&updated), session))
    }

    pub async fn progress_summary(&self) -> StoreResult<TodoProgressSummary> {
        let all = self.store.query(&self.collection, &Filter::All, None).await?;
        let completed = all.iter().filter(|doc| doc.get_bool("is_completed") == Some(true)).count();
        Ok(TodoProgressSummary::new(all.len(), completed, Local::now().naive_local()))
    }

    /// All recorded sessions, oldest first. Unreadable documents are skipped.
    pub async fn work_sessions(&self) -> StoreResult<Vec<WorkSession>> {
        let docs = self.store.query(&self.sessions_collection, &Filter::All, None).await?;
        let mut sessions: Vec<WorkSession> =
            docs.iter().filter_map(WorkSession::from_document).collect();
        sessions.sort_by_key(|session| session.start_time);
        Ok(sessions)
    }

    /// Sessions started on `date`, most recent first.
    pub async fn work_sessions_on(&self, date: NaiveDate) -> StoreResult<Vec<WorkSession>> {
        let mut sessions: Vec<WorkSession> = self
            .work_sessions()
            .await?
            .into_iter()
            .filter(|session| session.started_on(date))
            .collect();
        sessions.reverse();
        Ok(sessions)
    }

    pub async fn today_work_sessions(&self) -> StoreResult<Vec<WorkSession>> {
        self.work_sessions_on(Local::now().date_naive()).await
    }

    async fn resolve_title(&self, title: &str) -> StoreResult<String> {
        if let Some(id) = self.index.get(title) {
            match self.store.get(&self.collection, &id).await {
                Ok(doc) if doc.get_str("title") == Some(title) => return Ok(doc.id),
                Ok(_) => self.index.evict(title),
                Err(e) if e.is_not_found() => self.index.evict(title),
                Err(e) => return Err(e),
            }
        }

        let found = self.store.query(&self.collection, &Filter::eq("title", title), Some(1)).await?;
        let doc = found.into_iter().next().ok_or_else(|| StoreError::NotFound {
            collection: self.collection.clone(),
            id: format!("title={}", title),
        })?;
        self.index.remember(title, &doc.id);
        Ok(doc.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::Value;
    use thinq_types::Fields;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn service_with(todos: Value) -> (Arc<MemoryStore>, TodoService) {
        let store = Arc::new(MemoryStore::new());
        for (id, todo) in todos.as_object().unwrap() {
            store.set("todos", id, todo.as_object().cloned().unwrap()).await.unwrap();
        }
        let service = TodoService::new(store.clone(), "todos", &CacheConfig::default());
        (store, service)
    }

    fn progress(title: &str, completed: bool) -> TodoProgressUpdate {
        TodoProgressUpdate { title: title.to_string(), is_completed: completed, ..Default::default() }
    }

    #[tokio::test]
    async fn test_titles_are_open_and_due_on_date() {
        let (_, service) = service_with(json!({
            "a": {"title": "Stretch", "is_completed": false, "due_date_string": "2026-10-18"},
            "b": {"title": "Done", "is_completed": true, "due_date_string": "2026-10-18"},
            "c": {"title": "Tomorrow", "is_completed": false, "due_date_string": "2026-10-19"},
            "d": {"title": "No date", "is_completed": false}
        }))
        .await;

        assert_eq!(service.titles_due_on("2026-10-18").await.unwrap(), ["Stretch"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_titles_are_cached_until_updated() {
        let (store, service) = service_with(json!({
            "a": {"title": "Stretch", "is_completed": false, "due_date_string": "2026-10-18"}
        }))
        .await;
        assert_eq!(service.titles_due_on("2026-10-18").await.unwrap(), ["Stretch"]);

        store
            .set(
                "todos",
                "b",
                fields(json!({"title": "Read", "is_completed": false, "due_date_string": "2026-10-18"})),
            )
            .await
            .unwrap();
        assert_eq!(service.titles_due_on("2026-10-18").await.unwrap(), ["Stretch"]);

        service.update_progress(&progress("Stretch", true)).await.unwrap();
        assert_eq!(service.titles_due_on("2026-10-18").await.unwrap(), ["Read"]);
    }

    #[tokio::test]
    async fn test_update_progress_merges_fields() {
        let (store, service) =
            service_with(json!({"a": {"title": "Stretch", "is_completed": false}})).await;

        let update = TodoProgressUpdate {
            pause_time: Some(json!("10:15")),
            ..progress("Stretch", false)
        };
        let doc = service.update_progress(&update).await.unwrap();
        assert_eq!(doc.id, "a");

        let stored = store.get("todos", "a").await.unwrap();
        assert_eq!(stored.get("pause_times"), Some(&json!("10:15")));
        assert_eq!(stored.get_str("title"), Some("Stretch"));
    }

    #[tokio::test]
    async fn test_unknown_or_blank_title() {
        let (_, service) = service_with(json!({"a": {"title": "Stretch"}})).await;

        let err = service.update_progress(&progress("Nope", true)).await.unwrap_err();
        assert!(err.is_not_found());

        let err = service.update_progress(&progress("  ", true)).await.unwrap_err();
        assert!(matches!(err, AppError::MissingField("title")));
    }

    #[tokio::test]
    async fn test_stale_index_entry_is_evicted() {
        let (store, service) = service_with(json!({"a": {"title": "Stretch"}})).await;
        service.update_progress(&progress("Stretch", false)).await.unwrap();

        // The indexed document is renamed, another takes the title.
        store.update("todos", "a", fields(json!({"title": "Renamed"}))).await.unwrap();
        store.set("todos", "z", fields(json!({"title": "Stretch"}))).await.unwrap();

        let doc = service.update_progress(&progress("Stretch", true)).await.unwrap();
        assert_eq!(doc.id, "z");
        assert_eq!(store.get("todos", "a").await.unwrap().get_bool("is_completed"), Some(false));

        store.delete("todos", "z").await.unwrap();
        assert!(service.update_progress(&progress("Stretch", true)).await.unwrap_err().is_not_found());
    }
    fn completion(todo_id: &str, start: &str, end: &str, duration_seconds: u64) -> TodoCompletion {
        TodoCompletion {
            todo_id: todo_id.to_string(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            duration_seconds,
        }
    }

    #[tokio::test]
    async fn test_complete_marks_todo_and_records_session() {
        let (store, service) = service_with(json!({
            "a": {"title": "Stretch", "is_completed": false, "due_date_string": "2026-10-18"}
        }))
        .await;
        let service = service.with_sessions_collection("sessions");
        assert_eq!(service.titles_due_on("2026-10-18").await.unwrap(), ["Stretch"]);

        let (todo, session) = service
            .complete(&completion("a", "2026-10-18T09:00:00", "2026-10-18T09:25:00", 1500))
            .await
            .unwrap();
        assert!(todo.is_completed);
        assert_eq!(todo.start_time, Some(json!("2026-10-18T09:00:00")));
        assert_eq!(session.todo_title, "Stretch");
        assert_eq!(session.formatted_duration, "25:00");

        let stored = store.get("sessions", &session.id).await.unwrap();
        assert_eq!(stored.get_str("todo_id"), Some("a"));
        assert!(service.titles_due_on("2026-10-18").await.unwrap().is_empty());
        assert!(service.open_todos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_rejects_done_missing_and_backwards() {
        let (_, service) = service_with(json!({
            "a": {"title": "Done", "is_completed": true},
            "b": {"title": "Open", "is_completed": false}
        }))
        .await;

        let err = service
            .complete(&completion("a", "2026-10-18T09:00:00", "2026-10-18T09:10:00", 600))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = service
            .complete(&completion("zzz", "2026-10-18T09:00:00", "2026-10-18T09:10:00", 600))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .complete(&completion("b", "2026-10-18T09:10:00", "2026-10-18T09:00:00", 600))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidField { field: "endTime", .. }));
        assert_eq!(service.open_todos().await.unwrap().len(), 1);
        assert!(service.work_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_summary_counts_all_todos() {
        let (_, service) = service_with(json!({
            "a": {"title": "One", "is_completed": true},
            "b": {"title": "Two", "is_completed": false},
            "c": {"title": "Three"},
            "d": {"title": "Four", "is_completed": true}
        }))
        .await;

        let summary = service.progress_summary().await.unwrap();
        assert_eq!(summary.total_todos, 4);
        assert_eq!(summary.completed_todos, 2);
        assert_eq!(summary.progress_percentage, 50.0);
    }

    #[tokio::test]
    async fn test_sessions_for_a_day_are_newest_first() {
        let (_, service) = service_with(json!({
            "a": {"title": "Early", "is_completed": false},
            "b": {"title": "Late", "is_completed": false},
            "c": {"title": "Yesterday", "is_completed": false}
        }))
        .await;
        for (id, start, end) in [
            ("b", "2026-10-18T15:00:00", "2026-10-18T15:30:00"),
            ("c", "2026-10-17T20:00:00", "2026-10-17T20:30:00"),
            ("a", "2026-10-18T08:00:00", "2026-10-18T08:30:00"),
        ] {
            service.complete(&completion(id, start, end, 1800)).await.unwrap();
        }

        let all: Vec<String> =
            service.work_sessions().await.unwrap().into_iter().map(|s| s.todo_title).collect();
        assert_eq!(all, ["Yesterday", "Early", "Late"]);

        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let today: Vec<String> =
            service.work_sessions_on(day).await.unwrap().into_iter().map(|s| s.todo_title).collect();
        assert_eq!(today, ["Late", "Early"]);
    }
}
