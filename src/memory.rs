//! In-memory stores used by tests and `AppState::fake()`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::repo::CredentialStore;
use crate::auth::repo_types::{Role, User};
use crate::db::StoreError;
use crate::queries::repo::QueryStore;
use crate::queries::repo_types::{CloseOutcome, NewQuery, Query, QueryStatus, StatusFilter};

fn unavailable() -> StoreError {
    StoreError::Backend(anyhow::anyhow!("store unavailable"))
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, User>>,
    fail: bool,
}

impl MemoryCredentialStore {
    /// Every call fails with a backend error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        let mut users = self.users.lock().unwrap();
        if users.contains_key(username) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        Ok(self.users.lock().unwrap().get(username).cloned())
    }
}

#[derive(Default)]
pub struct MemoryQueryStore {
    rows: Mutex<Vec<Query>>,
    fail: bool,
}

impl MemoryQueryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl QueryStore for MemoryQueryStore {
    async fn insert(&self, new: &NewQuery) -> Result<Query, StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        let mut rows = self.rows.lock().unwrap();
        let id = rows.last().map_or(1, |q| q.id + 1);
        let query = Query {
            id,
            csv_query_id: None,
            client_email: new.client_email.clone(),
            client_mobile: new.client_mobile,
            query_heading: new.query_heading.clone(),
            query_description: new.query_description.clone(),
            status: QueryStatus::Open,
            date_raised: new.date_raised,
            date_closed: None,
        };
        rows.push(query.clone());
        Ok(query)
    }

    async fn list(&self, filter: StatusFilter) -> Result<Vec<Query>, StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        let wanted = filter.status();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|q| wanted.map_or(true, |s| q.status == s))
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Query>, StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        Ok(self.rows.lock().unwrap().iter().find(|q| q.id == id).cloned())
    }

    async fn close(&self, id: i64, closed_at: OffsetDateTime) -> Result<CloseOutcome, StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        let mut rows = self.rows.lock().unwrap();
        let Some(query) = rows.iter_mut().find(|q| q.id == id) else {
            return Ok(CloseOutcome::Missing);
        };
        if query.status == QueryStatus::Closed {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        query.status = QueryStatus::Closed;
        query.date_closed = Some(closed_at.max(query.date_raised));
        Ok(CloseOutcome::Closed(query.clone()))
    }
}
