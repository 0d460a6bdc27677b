use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::StoreError;
use crate::queries::repo_types::{CloseOutcome, NewQuery, Query, QueryStatus, StatusFilter};

/// Persistence for support queries.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Insert an Open query and return it with its assigned id.
    async fn insert(&self, new: &NewQuery) -> Result<Query, StoreError>;

    /// All queries matching `filter`, oldest id first.
    async fn list(&self, filter: StatusFilter) -> Result<Vec<Query>, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Query>, StoreError>;

    /// Move an Open query to Closed. Only one caller can win for a given id.
    async fn close(&self, id: i64, closed_at: OffsetDateTime) -> Result<CloseOutcome, StoreError>;
}

#[derive(Clone)]
pub struct PgQueryStore {
    db: PgPool,
}

impl PgQueryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QueryStore for PgQueryStore {
    async fn insert(&self, new: &NewQuery) -> Result<Query, StoreError> {
        let query = sqlx::query_as::<_, Query>(
            r#"
            INSERT INTO queries
                (csv_query_id, client_email, client_mobile, query_heading,
                 query_description, status, date_raised, date_closed)
            VALUES (NULL, $1, $2, $3, $4, 'Open', $5, NULL)
            RETURNING id, csv_query_id, client_email, client_mobile, query_heading,
                      query_description, status, date_raised, date_closed
            "#,
        )
        .bind(&new.client_email)
        .bind(new.client_mobile)
        .bind(&new.query_heading)
        .bind(&new.query_description)
        .bind(new.date_raised)
        .fetch_one(&self.db)
        .await?;
        Ok(query)
    }

    async fn list(&self, filter: StatusFilter) -> Result<Vec<Query>, StoreError> {
        let rows = sqlx::query_as::<_, Query>(
            r#"
            SELECT id, csv_query_id, client_email, client_mobile, query_heading,
                   query_description, status, date_raised, date_closed
            FROM queries
            WHERE $1::query_status IS NULL OR status = $1
            ORDER BY id ASC
            "#,
        )
        .bind(filter.status())
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<Query>, StoreError> {
        let row = sqlx::query_as::<_, Query>(
            r#"
            SELECT id, csv_query_id, client_email, client_mobile, query_heading,
                   query_description, status, date_raised, date_closed
            FROM queries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn close(&self, id: i64, closed_at: OffsetDateTime) -> Result<CloseOutcome, StoreError> {
        let closed = sqlx::query_as::<_, Query>(
            r#"
            UPDATE queries
               SET status = 'Closed',
                   date_closed = GREATEST($2, date_raised)
             WHERE id = $1 AND status = 'Open'
            RETURNING id, csv_query_id, client_email, client_mobile, query_heading,
                      query_description, status, date_raised, date_closed
            "#,
        )
        .bind(id)
        .bind(closed_at)
        .fetch_optional(&self.db)
        .await?;

        if let Some(query) = closed {
            return Ok(CloseOutcome::Closed(query));
        }

        let status = sqlx::query_scalar::<_, QueryStatus>(
            r#"SELECT status FROM queries WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(match status {
            Some(_) => CloseOutcome::AlreadyClosed,
            None => CloseOutcome::Missing,
        })
    }
}
