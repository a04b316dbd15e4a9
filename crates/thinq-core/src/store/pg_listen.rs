//! Change subscriptions over LISTEN/NOTIFY.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgListener, PgNotification, PgPool};
use sqlx::Row;
use thinq_types::{ChangeKind, ChangeRecord, Fields, StoreError};

use super::pg_helpers::{map_sqlx_err, ChangeNotification, CHANGE_CHANNEL};
use super::{StoreResult, Subscription, SubscriptionSender};

/// LISTEN first, then snapshot, so no change between the two is missed.
/// A change racing the snapshot may be reported twice.
pub(crate) async fn subscribe_impl(pool: &PgPool, collection: &str) -> StoreResult<Subscription> {
    let mut listener = PgListener::connect_with(pool).await.map_err(map_sqlx_err)?;
    listener.listen(CHANGE_CHANNEL).await.map_err(map_sqlx_err)?;

    let rows = sqlx::query("SELECT id, fields FROM documents WHERE collection = $1 ORDER BY id")
        .bind(collection)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_err)?;

    let observed_at = Utc::now();
    let mut snapshot = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: String = row.try_get("id").map_err(map_sqlx_err)?;
        let fields: serde_json::Value = row.try_get("fields").map_err(map_sqlx_err)?;
        snapshot.push(ChangeRecord::added(id, into_fields(fields), observed_at));
    }

    let (sender, subscription) = Subscription::channel(collection);
    sender.send_batch(snapshot);

    tokio::spawn(listen_loop(pool.clone(), listener, collection.to_string(), sender, observed_at));
    tracing::debug!("Subscribed to '{}' via {}", collection, CHANGE_CHANNEL);
    Ok(subscription)
}

async fn listen_loop(
    pool: PgPool,
    mut listener: PgListener,
    collection: String,
    sender: SubscriptionSender,
    mut last_observed: DateTime<Utc>,
) {
    loop {
        let received = tokio::select! {
            () = sender.closed() => {
                tracing::debug!("Subscription to '{}' cancelled", collection);
                return;
            }
            received = listener.try_recv() => received,
        };

        let first = match received {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                sender.send_error(StoreError::unavailable("change listener connection lost"));
                return;
            },
            Err(e) => {
                sender.send_error(map_sqlx_err(e));
                return;
            },
        };

        let mut pending = vec![first];
        while let Some(more) = listener.next_buffered() {
            pending.push(more);
        }

        let batch = match to_batch(&pool, &collection, &pending, &mut last_observed).await {
            Ok(batch) => batch,
            Err(e) => {
                sender.send_error(e);
                return;
            },
        };
        if !sender.send_batch(batch) {
            return;
        }
    }
}

async fn to_batch(
    pool: &PgPool,
    collection: &str,
    notifications: &[PgNotification],
    last_observed: &mut DateTime<Utc>,
) -> StoreResult<Vec<ChangeRecord>> {
    let mut batch = Vec::new();
    for notification in notifications {
        let Some(change) = ChangeNotification::parse(notification.payload()) else {
            continue;
        };
        if change.collection != collection {
            continue;
        }
        let observed_at = change.at.max(*last_observed);
        *last_observed = observed_at;

        match change.op {
            ChangeKind::Removed => batch.push(ChangeRecord::removed(change.id, observed_at)),
            kind @ (ChangeKind::Added | ChangeKind::Modified) => {
                // Gone since the notification was queued; its removal follows.
                let Some(fields) = current_fields(pool, collection, &change.id).await? else {
                    continue;
                };
                batch.push(ChangeRecord {
                    entity_id: change.id,
                    kind,
                    payload: fields,
                    observed_at,
                });
            },
        }
    }
    Ok(batch)
}

async fn current_fields(pool: &PgPool, collection: &str, id: &str) -> StoreResult<Option<Fields>> {
    let row = sqlx::query("SELECT fields FROM documents WHERE collection = $1 AND id = $2")
        .bind(collection)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_err)?;
    row.map(|row| row.try_get::<serde_json::Value, _>("fields").map(into_fields))
        .transpose()
        .map_err(map_sqlx_err)
}

fn into_fields(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}
