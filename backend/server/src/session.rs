//! # Admin Sessions
//!
//! - Login hands out an opaque bearer token (UUID v4)
//! - Token maps to the admin's id and email, plus an expiry
//! - Handlers take [`AdminSession`] as an extractor and pass `admin_id` down explicitly
//! - Expired tokens are rejected and dropped on lookup, the rest are pruned on each login
use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use catalog::models::Account;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::AppError, state::State};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub admin_id: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, AdminSession>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn open(&self, account: &Account) -> AdminSession {
        let now = Utc::now();
        let session = AdminSession {
            token: Uuid::new_v4().to_string(),
            admin_id: account.id.clone(),
            email: account.email.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());

        session
    }

    pub async fn get(&self, token: &str) -> Option<AdminSession> {
        let now = Utc::now();
        let session = self.sessions.read().await.get(token).cloned()?;

        if session.is_expired(now) {
            self.sessions.write().await.remove(token);
            return None;
        }

        Some(session)
    }

    pub async fn close(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl FromRequestParts<Arc<State>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AppError::Unauthorized)?;

        state
            .sessions
            .get(token)
            .await
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: "admin-1".to_string(),
            username: "boss".to_string(),
            email: "boss@bubbletime.my".to_string(),
            role: "admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_and_get() {
        let store = SessionStore::new(Duration::minutes(5));
        let session = store.open(&account()).await;

        let found = store.get(&session.token).await.unwrap();
        assert_eq!(found.admin_id, "admin-1");
        assert_eq!(found.expires_at - found.issued_at, Duration::minutes(5));
        assert!(store.get("not-a-token").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_dropped() {
        let store = SessionStore::new(Duration::zero());
        let session = store.open(&account()).await;

        assert!(store.get(&session.token).await.is_none());
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_close() {
        let store = SessionStore::new(Duration::minutes(5));
        let session = store.open(&account()).await;

        assert!(store.close(&session.token).await);
        assert!(!store.close(&session.token).await);
        assert!(store.get(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn test_login_prunes_expired() {
        let store = SessionStore::new(Duration::zero());
        store.open(&account()).await;
        store.open(&account()).await;

        assert_eq!(store.count().await, 1);
    }
}
