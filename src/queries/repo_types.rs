use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Lifecycle status of a query. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "query_status")]
pub enum QueryStatus {
    Open,
    Closed,
}

/// Which queries a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StatusFilter {
    /// The status to match, or `None` for every query.
    pub fn status(self) -> Option<QueryStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Open => Some(QueryStatus::Open),
            StatusFilter::Closed => Some(QueryStatus::Closed),
        }
    }
}

/// Query record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Query {
    pub id: i64,
    pub csv_query_id: Option<String>, // set only for rows imported from the legacy sheet
    pub client_email: String,
    pub client_mobile: i64,
    pub query_heading: String,
    pub query_description: String,
    pub status: QueryStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub date_raised: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_closed: Option<OffsetDateTime>,
}

/// Validated input for a new query row.
#[derive(Debug, Clone)]
pub struct NewQuery {
    pub client_email: String,
    pub client_mobile: i64,
    pub query_heading: String,
    pub query_description: String,
    pub date_raised: OffsetDateTime,
}

/// Result of a conditional close.
#[derive(Debug)]
pub enum CloseOutcome {
    Closed(Query),
    AlreadyClosed,
    Missing,
}
