//! In-memory fakes for the provider and the stores.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};
use uuid::Uuid;

use crate::{
    auth::{
        provider::{AuthProvider, ProviderError, ProviderFactory},
        storage::SessionStore,
        types::{AuthSession, ProviderSession, ProviderUser},
    },
    user::{storage::UserStore, types::User},
};

pub(crate) const PROVIDER_USER_ID: &str = "6f1c2a4e-8d3b-4f5a-9c7e-1b2d3e4f5a6b";

#[derive(Default)]
struct ProviderState {
    accounts: Mutex<HashMap<String, (String, String)>>,
    fail_create: AtomicBool,
    fail_sign_in: AtomicBool,
    fail_delete: AtomicBool,
    create_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    clients_built: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeProvider {
    state: Arc<ProviderState>,
}

fn rejected(status: StatusCode, message: &str) -> ProviderError {
    ProviderError::Status {
        status,
        message: message.to_string(),
    }
}

impl FakeProvider {
    pub(crate) fn fail_create(&self) {
        self.state.fail_create.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_sign_in(&self) {
        self.state.fail_sign_in.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_delete(&self) {
        self.state.fail_delete.store(true, Ordering::SeqCst);
    }

    pub(crate) fn accounts(&self) -> Result<Vec<(String, String)>> {
        let accounts = self
            .state
            .accounts
            .lock()
            .map_err(|_| anyhow!("accounts lock poisoned"))?;
        Ok(accounts
            .iter()
            .map(|(id, (email, _))| (id.clone(), email.clone()))
            .collect())
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_in_calls(&self) -> usize {
        self.state.sign_in_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.state.delete_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_out_calls(&self) -> usize {
        self.state.sign_out_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn clients_built(&self) -> usize {
        self.state.clients_built.load(Ordering::SeqCst)
    }

    fn lock_error(_: impl std::fmt::Debug) -> ProviderError {
        rejected(StatusCode::INTERNAL_SERVER_ERROR, "accounts lock poisoned")
    }
}

#[async_trait]
impl AuthProvider for FakeProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProviderUser, ProviderError> {
        self.state.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_create.load(Ordering::SeqCst) {
            return Err(rejected(StatusCode::BAD_REQUEST, "signup disabled"));
        }

        let mut accounts = self.state.accounts.lock().map_err(Self::lock_error)?;
        if accounts.values().any(|(existing, _)| existing == email) {
            return Err(rejected(
                StatusCode::UNPROCESSABLE_ENTITY,
                "User already registered",
            ));
        }

        let id = if accounts.contains_key(PROVIDER_USER_ID) {
            Uuid::new_v4().to_string()
        } else {
            PROVIDER_USER_ID.to_string()
        };
        accounts.insert(
            id.clone(),
            (email.to_string(), password.expose_secret().to_string()),
        );

        Ok(ProviderUser {
            id,
            email: Some(email.to_string()),
        })
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        self.state.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_sign_in.load(Ordering::SeqCst) {
            return Err(rejected(StatusCode::BAD_REQUEST, "Invalid login credentials"));
        }

        let accounts = self.state.accounts.lock().map_err(Self::lock_error)?;
        let id = accounts
            .iter()
            .find(|(_, (existing, secret))| {
                existing == email && secret.as_str() == password.expose_secret()
            })
            .map(|(id, _)| id.clone())
            .ok_or_else(|| rejected(StatusCode::BAD_REQUEST, "Invalid login credentials"))?;

        Ok(ProviderSession {
            access_token: format!("access-{id}"),
            refresh_token: format!("refresh-{id}"),
            expires_in: Some(3600),
            expires_at: None,
            user: Some(ProviderUser {
                id,
                email: Some(email.to_string()),
            }),
        })
    }

    async fn delete_account(&self, id: &str) -> Result<(), ProviderError> {
        self.state.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_delete.load(Ordering::SeqCst) {
            return Err(rejected(StatusCode::SERVICE_UNAVAILABLE, "provider down"));
        }

        let mut accounts = self.state.accounts.lock().map_err(Self::lock_error)?;
        accounts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| rejected(StatusCode::NOT_FOUND, "User not found"))
    }

    async fn sign_out(&self, _access_token: &SecretString) -> Result<(), ProviderError> {
        self.state.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ProviderFactory for FakeProvider {
    fn client(&self) -> Result<Box<dyn AuthProvider>, ProviderError> {
        self.state.clients_built.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

#[derive(Default)]
struct StoreState {
    users: Mutex<Vec<User>>,
    sessions: Mutex<HashMap<Vec<u8>, (AuthSession, Instant)>>,
    fail_lookups: AtomicBool,
    fail_inserts: AtomicBool,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<StoreState>,
}

impl MemoryStore {
    pub(crate) fn fail_lookups(&self) {
        self.state.fail_lookups.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_inserts(&self) {
        self.state.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub(crate) fn users(&self) -> Result<Vec<User>> {
        Ok(self
            .state
            .users
            .lock()
            .map_err(|_| anyhow!("users lock poisoned"))?
            .clone())
    }

    pub(crate) fn session_count(&self) -> Result<usize> {
        Ok(self
            .state
            .sessions
            .lock()
            .map_err(|_| anyhow!("sessions lock poisoned"))?
            .len())
    }

    pub(crate) fn seed_user(&self, email: &str, name: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
        };
        self.state
            .users
            .lock()
            .map_err(|_| anyhow!("users lock poisoned"))?
            .push(user.clone());
        Ok(user)
    }

    pub(crate) fn seed_session(&self, session_hash: &[u8], session: AuthSession) -> Result<()> {
        self.store_session(session_hash, session, Duration::from_secs(3600))
    }

    fn store_session(
        &self,
        session_hash: &[u8],
        session: AuthSession,
        ttl: Duration,
    ) -> Result<()> {
        let mut sessions = self
            .state
            .sessions
            .lock()
            .map_err(|_| anyhow!("sessions lock poisoned"))?;
        let now = Instant::now();
        sessions.retain(|_, (_, valid_until)| *valid_until > now);
        sessions.insert(session_hash.to_vec(), (session, now + ttl));
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        if self.state.fail_lookups.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }
        Ok(self.users()?.into_iter().find(|user| user.email == email))
    }

    async fn insert_user(&self, user: &User) -> Result<User> {
        if self.state.fail_inserts.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }
        let mut users = self
            .state
            .users
            .lock()
            .map_err(|_| anyhow!("users lock poisoned"))?;
        if users.iter().any(|existing| existing.email == user.email) {
            bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let mut users = self
            .state
            .users
            .lock()
            .map_err(|_| anyhow!("users lock poisoned"))?;
        let before = users.len();
        users.retain(|user| user.id != id);
        if users.len() == before {
            bail!("user {id} not found");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(
        &self,
        session_hash: &[u8],
        session: &AuthSession,
        ttl_seconds: i64,
    ) -> Result<()> {
        let ttl = Duration::from_secs(u64::try_from(ttl_seconds).unwrap_or_default());
        self.store_session(session_hash, session.clone(), ttl)
    }

    async fn lookup_session(&self, session_hash: &[u8]) -> Result<Option<AuthSession>> {
        Ok(self
            .state
            .sessions
            .lock()
            .map_err(|_| anyhow!("sessions lock poisoned"))?
            .get(session_hash)
            .filter(|(_, valid_until)| *valid_until > Instant::now())
            .map(|(session, _)| session.clone()))
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()> {
        self.state
            .sessions
            .lock()
            .map_err(|_| anyhow!("sessions lock poisoned"))?
            .remove(session_hash);
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: &str) -> Result<()> {
        self.state
            .sessions
            .lock()
            .map_err(|_| anyhow!("sessions lock poisoned"))?
            .retain(|_, (session, _)| session.user_id != user_id);
        Ok(())
    }
}
