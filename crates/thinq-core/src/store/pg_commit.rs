//! Atomic batch commits for the PostgreSQL store.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{Row, Transaction};
use thinq_types::{StoreError, WriteOp};

use super::pg_helpers::{fields_to_json, map_sqlx_err, ChangeNotification, CHANGE_CHANNEL};
use super::{CommitSummary, StoreResult};

/// `(collection, id)` -> fields before the commit first touched the row.
type Originals = BTreeMap<(String, String), serde_json::Value>;

/// Apply `ops` in one transaction.
///
/// An advisory transaction lock is taken per touched collection (in sorted
/// order) so concurrent commits on a collection apply one after another, and
/// each statement sees the rows the previous commit left behind.
///
/// The row trigger is muted for the transaction; one notification per row
/// whose final fields differ from its pre-commit state is sent instead, so a
/// clear-then-set of the same value is not reported.
pub(crate) async fn atomic_commit_impl(
    pool: &PgPool,
    ops: Vec<WriteOp>,
) -> StoreResult<CommitSummary> {
    let mut collections: Vec<&str> = ops.iter().map(WriteOp::collection).collect();
    collections.sort_unstable();
    collections.dedup();

    let mut tx = pool.begin().await.map_err(map_sqlx_err)?;

    for collection in &collections {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(*collection)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
    }
    sqlx::query("SELECT set_config('thinq.defer_notify', 'on', true)")
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

    let mut originals = Originals::new();
    let mut summary = CommitSummary::default();
    for op in &ops {
        match op {
            WriteOp::Update { target, fields } => {
                let row = sqlx::query(
                    "SELECT fields FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
                )
                .bind(&target.collection)
                .bind(&target.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
                let Some(row) = row else {
                    tx.rollback().await.map_err(map_sqlx_err)?;
                    return Err(StoreError::not_found(&target.collection, &target.id));
                };
                originals
                    .entry((target.collection.clone(), target.id.clone()))
                    .or_insert(row.try_get("fields").map_err(map_sqlx_err)?);

                let result = sqlx::query(
                    r#"UPDATE documents SET fields = fields || $3, updated_at = NOW()
                       WHERE collection = $1 AND id = $2"#,
                )
                .bind(&target.collection)
                .bind(&target.id)
                .bind(fields_to_json(fields))
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
                summary.documents_written += result.rows_affected() as usize;
            },
            WriteOp::UpdateWhere { collection, filter, fields } => {
                let Some(containment) = filter.containment() else {
                    continue;
                };
                let rows = sqlx::query(
                    r#"SELECT id, fields FROM documents
                       WHERE collection = $1 AND fields @> $2 FOR UPDATE"#,
                )
                .bind(collection)
                .bind(&containment)
                .fetch_all(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
                for row in &rows {
                    let id: String = row.try_get("id").map_err(map_sqlx_err)?;
                    let before: serde_json::Value = row.try_get("fields").map_err(map_sqlx_err)?;
                    originals.entry((collection.clone(), id)).or_insert(before);
                }

                let result = sqlx::query(
                    r#"UPDATE documents SET fields = fields || $3, updated_at = NOW()
                       WHERE collection = $1 AND fields @> $2"#,
                )
                .bind(collection)
                .bind(containment)
                .bind(fields_to_json(fields))
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
                summary.documents_written += result.rows_affected() as usize;
            },
        }
    }

    notify_changed(&mut tx, &originals).await?;
    tx.commit().await.map_err(map_sqlx_err)?;
    Ok(summary)
}

/// Queue a `modified` notification for every row that ended up different.
/// Delivered to listeners on commit.
async fn notify_changed(tx: &mut Transaction<'_, Postgres>, originals: &Originals) -> StoreResult<()> {
    let at = Utc::now();
    for ((collection, id), before) in originals {
        let after: serde_json::Value =
            sqlx::query("SELECT fields FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_one(&mut **tx)
                .await
                .map_err(map_sqlx_err)?
                .try_get("fields")
                .map_err(map_sqlx_err)?;
        if &after == before {
            continue;
        }

        let payload = ChangeNotification::modified(collection, id, at).to_payload()?;
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(payload)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_err)?;
    }
    Ok(())
}
