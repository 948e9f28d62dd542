// Postgres persistence for comment records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harvest_common::{CommentRecord, PageRequest};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::{CommentStore, Result};

/// Bound parameters per inserted row.
const INSERT_COLUMNS: usize = 13;

/// Postgres caps bind parameters per statement.
const MAX_BIND_PARAMS: usize = 65535;

/// Rows per INSERT statement.
const INSERT_CHUNK: usize = MAX_BIND_PARAMS / INSERT_COLUMNS;

#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

/// A row from the comment_records table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    run_id: String,
    dataset_id: String,
    fetched_at: DateTime<Utc>,
    author_name: Option<String>,
    author_id: Option<String>,
    comment_id: Option<String>,
    comment_text: Option<String>,
    reaction_count: i64,
    post_url: Option<String>,
    parent_id: Option<String>,
    post_title: Option<String>,
    raw: serde_json::Value,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        CommentRecord {
            id: row.id,
            run_id: row.run_id,
            dataset_id: row.dataset_id,
            fetched_at: row.fetched_at,
            author_name: row.author_name,
            author_id: row.author_id,
            comment_id: row.comment_id,
            comment_text: row.comment_text,
            reaction_count: row.reaction_count,
            post_url: row.post_url,
            parent_id: row.parent_id,
            post_title: row.post_title,
            raw: row.raw,
        }
    }
}

const SELECT_COLUMNS: &str = "id, run_id, dataset_id, fetched_at, author_name, author_id, \
     comment_id, comment_text, reaction_count, post_url, parent_id, post_title, raw";

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn insert_many(&self, records: &[CommentRecord]) -> Result<u64> {
        let mut written = 0u64;

        for chunk in records.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO comment_records \
                 (id, run_id, dataset_id, fetched_at, author_name, author_id, comment_id, \
                  comment_text, reaction_count, post_url, parent_id, post_title, raw) ",
            );
            builder.push_values(chunk, |mut row, r| {
                row.push_bind(r.id)
                    .push_bind(&r.run_id)
                    .push_bind(&r.dataset_id)
                    .push_bind(r.fetched_at)
                    .push_bind(&r.author_name)
                    .push_bind(&r.author_id)
                    .push_bind(&r.comment_id)
                    .push_bind(&r.comment_text)
                    .push_bind(r.reaction_count)
                    .push_bind(&r.post_url)
                    .push_bind(&r.parent_id)
                    .push_bind(&r.post_title)
                    .push_bind(&r.raw);
            });

            let result = builder.build().execute(&self.pool).await?;
            written += result.rows_affected();
        }

        debug!(written, "Inserted comment records");
        Ok(written)
    }

    async fn list_recent(&self, page: PageRequest) -> Result<Vec<CommentRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM comment_records \
             ORDER BY fetched_at DESC, seq DESC \
             OFFSET $1 LIMIT $2"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .bind(page.page_size as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn list_by_run(&self, run_id: &str) -> Result<Vec<CommentRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM comment_records \
             WHERE run_id = $1 \
             ORDER BY seq ASC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(run_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }
}
