use tracing::{debug, info, warn};

use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::auth::repo::CredentialStore;
use crate::auth::repo_types::{Role, User};
use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username and password cannot be empty")]
    Validation,
    #[error("Username already exists")]
    DuplicateUsername,
    #[error("password hashing failed")]
    Hashing(#[source] anyhow::Error),
    #[error("credential store failure")]
    Store(#[source] StoreError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AuthError::DuplicateUsername,
            other => AuthError::Store(other),
        }
    }
}

/// Register a new user with a salted Argon2 hash of `password`.
pub async fn register(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
    role: Role,
) -> Result<User, AuthError> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::Validation);
    }

    let hash = hash_password(password).map_err(AuthError::Hashing)?;
    let user = store.insert(username, &hash, role).await?;

    info!(username = %user.username, role = %user.role, "user registered");
    Ok(user)
}

/// Check a username/password pair. Unknown users and wrong passwords both yield `None`.
pub async fn authenticate(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<Option<Role>, AuthError> {
    let Some(user) = store.find_by_username(username).await? else {
        verify_against_dummy(password);
        debug!(%username, "login for unknown username");
        return Ok(None);
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(user.role)),
        Ok(false) => {
            debug!(%username, "login with wrong password");
            Ok(None)
        }
        Err(e) => {
            // A stored hash that does not parse can never match.
            warn!(%username, error = %e, "stored password hash is malformed");
            Ok(None)
        }
    }
}

pub async fn find_user(
    store: &dyn CredentialStore,
    username: &str,
) -> Result<Option<User>, AuthError> {
    Ok(store.find_by_username(username).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCredentialStore;

    #[tokio::test]
    async fn register_then_authenticate_returns_role() {
        let store = MemoryCredentialStore::default();
        register(&store, "carol", "s3cret", Role::Support)
            .await
            .expect("register");
        let role = authenticate(&store, "carol", "s3cret").await.unwrap();
        assert_eq!(role, Some(Role::Support));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let store = MemoryCredentialStore::default();
        register(&store, "dave", "right", Role::Client).await.unwrap();

        assert_eq!(authenticate(&store, "dave", "wrong").await.unwrap(), None);
        assert_eq!(authenticate(&store, "nobody", "right").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_username_scenario() {
        let store = MemoryCredentialStore::default();
        register(&store, "alice", "pw1", Role::Client).await.unwrap();

        let err = register(&store, "alice", "pw2", Role::Support)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));

        assert_eq!(
            authenticate(&store, "alice", "pw1").await.unwrap(),
            Some(Role::Client)
        );
        assert_eq!(authenticate(&store, "alice", "pw2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let store = MemoryCredentialStore::default();
        register(&store, "Erin", "pw", Role::Client).await.unwrap();
        register(&store, "erin", "pw", Role::Support).await.unwrap();

        assert_eq!(
            authenticate(&store, "Erin", "pw").await.unwrap(),
            Some(Role::Client)
        );
        assert_eq!(
            authenticate(&store, "erin", "pw").await.unwrap(),
            Some(Role::Support)
        );
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected_without_writing() {
        let store = MemoryCredentialStore::default();

        let err = register(&store, "", "pw", Role::Client).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation));
        let err = register(&store, "frank", "", Role::Client)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation));

        assert!(find_user(&store, "frank").await.unwrap().is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn stored_hash_is_never_plaintext() {
        let store = MemoryCredentialStore::default();
        let user = register(&store, "gina", "plaintext-pw", Role::Client)
            .await
            .unwrap();
        assert_ne!(user.password_hash, "plaintext-pw");
        assert!(!user.password_hash.contains("plaintext-pw"));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_store_error() {
        let store = MemoryCredentialStore::failing();
        let err = register(&store, "hal", "pw", Role::Client)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));

        let err = authenticate(&store, "hal", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }
}
