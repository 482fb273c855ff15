use crate::api::ApiClient;
use crate::domain::models::{Credentials, RegisterRequest, Role, User};
use crate::error::{ClientError, ClientResult};
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// Where the session token lives between requests (browser storage, a
/// cookie, a file...).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, token: &str) {
        (**self).save(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub user: User,
    pub role: Option<Role>,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        let role = user.role();
        Self { user, role }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// Identity lookup still in flight; no access decision may be taken.
    Resolving,
    Anonymous,
    Authenticated { identity: Identity },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Pending,
    Granted,
    Denied,
}

/// Owns the session token and the identity derived from it. Built once per
/// session and passed by reference to whoever needs the viewer's role.
pub struct SessionResolver<S: TokenStore> {
    api: ApiClient,
    store: S,
    token: Option<String>,
    state: SessionState,
}

impl<S: TokenStore> SessionResolver<S> {
    pub fn new(api: ApiClient, store: S) -> Self {
        Self {
            api,
            store,
            token: None,
            state: SessionState::Resolving,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated { identity } => Some(identity),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().and_then(|i| i.role)
    }

    pub fn access(&self, required: Role) -> Access {
        match &self.state {
            SessionState::Resolving => Access::Pending,
            SessionState::Anonymous => Access::Denied,
            SessionState::Authenticated { identity } => match identity.role {
                Some(role) if role.includes(required) => Access::Granted,
                _ => Access::Denied,
            },
        }
    }

    /// Revalidates a previously stored token. Never fails: an unusable
    /// token is dropped and the session presents as anonymous.
    pub async fn init(&mut self) {
        self.state = SessionState::Resolving;
        let Some(token) = self.store.load() else {
            self.state = SessionState::Anonymous;
            return;
        };
        match self.api.me(&token).await {
            Ok(user) => {
                tracing::debug!("Session restored for user {}", user.id);
                self.token = Some(token);
                self.state = SessionState::Authenticated {
                    identity: user.into(),
                };
            }
            Err(e) => {
                tracing::debug!("Stored token rejected, continuing anonymously: {}", e);
                self.discard();
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<Identity> {
        self.state = SessionState::Resolving;
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let token = match self.api.login(&credentials).await {
            Ok(token) => token,
            Err(e) => {
                self.discard();
                return Err(match e {
                    ClientError::Auth(_) | ClientError::Server { status: 400..=499, .. } => {
                        tracing::info!("Login rejected for {}", credentials.email);
                        ClientError::Auth("invalid credentials".to_string())
                    }
                    other => other,
                });
            }
        };
        self.store.save(&token);

        match self.api.me(&token).await {
            Ok(user) => {
                let identity = Identity::from(user);
                tracing::info!(
                    "User {} logged in as {}",
                    identity.user.id,
                    identity.role.map_or("unknown role", Role::label)
                );
                self.token = Some(token);
                self.state = SessionState::Authenticated {
                    identity: identity.clone(),
                };
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!("Identity lookup failed after login: {}", e);
                self.discard();
                Err(ClientError::Auth("unable to retrieve the user".to_string()))
            }
        }
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> ClientResult<Identity> {
        if request.email.trim().is_empty() {
            return Err(ClientError::validation("email", "email is required"));
        }
        if request.password.is_empty() {
            return Err(ClientError::validation("password", "password is required"));
        }
        if request.password != request.password_confirm {
            return Err(ClientError::validation("password", "passwords do not match"));
        }
        self.api.register(request).await?;
        self.login(&request.email, &request.password).await
    }

    /// Local only; the server is not told.
    pub fn logout(&mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        self.store.clear();
        self.token = None;
        self.state = SessionState::Anonymous;
    }
}
