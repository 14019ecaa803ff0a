use validator::Validate;

use crate::auth::{dummy_hash, hash_password, verify_password, RegisterRequest};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::store::{Store, StoreError};

const EMAIL_TAKEN: &str = "Email already registered";
const USERNAME_TAKEN: &str = "Username already taken";

/// Creates an active, non-superuser account with a bcrypt-hashed password.
pub async fn register(
    store: &dyn Store,
    bcrypt_cost: u32,
    request: RegisterRequest,
) -> Result<User, AppError> {
    request.validate()?;

    if let Some(existing) = store
        .user_by_email_or_username(&request.email, &request.username)
        .await?
    {
        let message = if existing.email == request.email {
            EMAIL_TAKEN
        } else {
            USERNAME_TAKEN
        };
        return Err(AppError::Conflict(message.into()));
    }

    let hashed_password = hash_password(&request.password, bcrypt_cost)?;
    let new_user = NewUser {
        email: request.email,
        username: request.username,
        full_name: request.full_name,
        hashed_password,
    };

    // A concurrent registration can still win the race at the unique index.
    let user = store.insert_user(new_user).await.map_err(|e| match e {
        StoreError::UniqueViolation(key) if key.contains("email") => {
            AppError::Conflict(EMAIL_TAKEN.into())
        }
        StoreError::UniqueViolation(_) => AppError::Conflict(USERNAME_TAKEN.into()),
        other => other.into(),
    })?;

    log::info!("registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// `None` for an unknown username and for a wrong password alike. Both
/// paths run one bcrypt check at `bcrypt_cost`.
pub async fn authenticate(
    store: &dyn Store,
    bcrypt_cost: u32,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let user = store.user_by_username(username).await?;
    let fallback = dummy_hash(bcrypt_cost)?;
    Ok(check_credentials(user, password, &fallback, verify_password))
}

/// Calls `verify` exactly once, against `fallback_hash` when there is no user.
fn check_credentials<F>(
    user: Option<User>,
    password: &str,
    fallback_hash: &str,
    verify: F,
) -> Option<User>
where
    F: Fn(&str, &str) -> bool,
{
    match user {
        Some(user) => verify(password, &user.hashed_password).then_some(user),
        None => {
            verify(password, fallback_hash);
            None
        }
    }
}

/// Resolves a token subject to its account, rejecting deleted and
/// deactivated users.
pub async fn resolve_active_user(store: &dyn Store, username: &str) -> Result<User, AppError> {
    let user = store
        .user_by_username(username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".into()))?;
    if !user.is_active {
        return Err(AppError::InactiveUser);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::store::MemoryStore;

    fn request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            username: username.into(),
            full_name: Some("Alice A".into()),
            password: "secret1".into(),
        }
    }

    #[actix_rt::test]
    async fn test_register_hashes_and_defaults() {
        let store = MemoryStore::new();
        let user = register(&store, 4, request("a@example.com", "alice"))
            .await
            .unwrap();
        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert_ne!(user.hashed_password, "secret1");
        assert!(verify_password("secret1", &user.hashed_password));
    }

    #[actix_rt::test]
    async fn test_register_conflicts_are_distinguished() {
        let store = MemoryStore::new();
        register(&store, 4, request("a@example.com", "alice"))
            .await
            .unwrap();

        match register(&store, 4, request("a@example.com", "other")).await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, EMAIL_TAKEN),
            other => panic!("expected email conflict, got {:?}", other),
        }
        match register(&store, 4, request("b@example.com", "alice")).await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, USERNAME_TAKEN),
            other => panic!("expected username conflict, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_register_rejects_invalid_input() {
        let store = MemoryStore::new();
        let err = register(&store, 4, request("a@example.com", "no spaces"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_rt::test]
    async fn test_authenticate_is_indistinguishable() {
        let store = MemoryStore::new();
        register(&store, 4, request("a@example.com", "alice"))
            .await
            .unwrap();

        assert!(authenticate(&store, 4, "alice", "secret1")
            .await
            .unwrap()
            .is_some());
        assert!(authenticate(&store, 4, "alice", "wrong!!")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate(&store, 4, "nobody", "secret1")
            .await
            .unwrap()
            .is_none());
    }

    #[actix_rt::test]
    async fn test_unknown_user_still_checks_a_hash() {
        let store = MemoryStore::new();
        let alice = register(&store, 4, request("a@example.com", "alice"))
            .await
            .unwrap();
        let fallback = dummy_hash(4).unwrap();

        let checked = RefCell::new(Vec::new());
        let verify = |password: &str, hashed: &str| {
            checked.borrow_mut().push(hashed.to_string());
            verify_password(password, hashed)
        };

        assert!(check_credentials(None, "wrong!!", &fallback, verify).is_none());
        assert!(check_credentials(Some(alice.clone()), "wrong!!", &fallback, verify).is_none());
        assert!(check_credentials(Some(alice.clone()), "secret1", &fallback, verify).is_some());
        assert_eq!(
            *checked.borrow(),
            vec![fallback.clone(), alice.hashed_password.clone(), alice.hashed_password]
        );
    }

    #[actix_rt::test]
    async fn test_resolve_inactive_user() {
        let store = MemoryStore::new();
        let user = register(&store, 4, request("a@example.com", "alice"))
            .await
            .unwrap();
        store.set_active(user.id, false).await.unwrap();

        let err = resolve_active_user(&store, "alice").await.unwrap_err();
        assert!(matches!(err, AppError::InactiveUser));
        let err = resolve_active_user(&store, "ghost").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
