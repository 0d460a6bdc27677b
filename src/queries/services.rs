use std::num::IntErrorKind;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::repo_types::Role;
use crate::auth::session::Session;
use crate::db::StoreError;
use crate::queries::dto::SubmitQueryRequest;
use crate::queries::repo::QueryStore;
use crate::queries::repo_types::{CloseOutcome, NewQuery, Query, StatusFilter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("mobile number must be numeric")]
    NonNumericMobile,
    #[error("mobile number is too large to store")]
    MobileOutOfRange,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} role required")]
    Forbidden(Role),
    #[error("query not found")]
    NotFound,
    #[error("query is already closed")]
    AlreadyClosed,
    #[error("query store failure")]
    Store(#[from] StoreError),
}

fn require(session: &Session, role: Role) -> Result<(), QueryError> {
    if session.has_role(role) {
        Ok(())
    } else {
        warn!(username = %session.username, have = %session.role, need = %role, "role check failed");
        Err(QueryError::Forbidden(role))
    }
}

/// Blank-only input counts as missing; accepted input is kept exactly as sent.
fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn parse_mobile(mobile: &str) -> Result<i64, ValidationError> {
    mobile.trim().parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValidationError::MobileOutOfRange,
        _ => ValidationError::NonNumericMobile,
    })
}

/// Check every field before any write; empty fields are reported ahead of a bad mobile.
pub fn validate(req: &SubmitQueryRequest, now: OffsetDateTime) -> Result<NewQuery, ValidationError> {
    let client_email = required(&req.email, "email")?;
    let mobile = required(&req.mobile, "mobile")?;
    let query_heading = required(&req.heading, "heading")?;
    let query_description = required(&req.description, "description")?;

    let client_mobile = parse_mobile(&mobile)?;

    Ok(NewQuery {
        client_email,
        client_mobile,
        query_heading,
        query_description,
        date_raised: now,
    })
}

/// Client submits a new query. Returns it as stored, status Open.
pub async fn submit_query(
    store: &dyn QueryStore,
    session: &Session,
    req: &SubmitQueryRequest,
) -> Result<Query, QueryError> {
    require(session, Role::Client)?;
    let new = validate(req, OffsetDateTime::now_utc())?;
    let query = store.insert(&new).await?;
    info!(id = query.id, username = %session.username, "query submitted");
    Ok(query)
}

/// Support lists queries. Every call reads the store afresh.
pub async fn list_queries(
    store: &dyn QueryStore,
    session: &Session,
    filter: StatusFilter,
) -> Result<Vec<Query>, QueryError> {
    require(session, Role::Support)?;
    Ok(store.list(filter).await?)
}

pub async fn get_query(
    store: &dyn QueryStore,
    session: &Session,
    id: i64,
) -> Result<Query, QueryError> {
    require(session, Role::Support)?;
    store.find(id).await?.ok_or(QueryError::NotFound)
}

/// Support closes an Open query. Closing twice is an error, not a no-op.
pub async fn close_query(
    store: &dyn QueryStore,
    session: &Session,
    id: i64,
) -> Result<Query, QueryError> {
    require(session, Role::Support)?;
    match store.close(id, OffsetDateTime::now_utc()).await? {
        CloseOutcome::Closed(query) => {
            info!(id, username = %session.username, "query closed");
            Ok(query)
        }
        CloseOutcome::AlreadyClosed => Err(QueryError::AlreadyClosed),
        CloseOutcome::Missing => Err(QueryError::NotFound),
    }
}
