use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use tracing::{info, debug, warn, instrument};
use uuid::Uuid;

use models::user::{validate_email, validate_username, Role};

use super::domain::{AuthSession, AuthUser, Claims, NewUser, RegisterInput};
use super::password;
use super::repository::AuthRepository;
use crate::audit::{self, AuditAction, AuditEntry, AuditSink};
use crate::clock::Clock;
use crate::context::Caller;
use crate::errors::ServiceError;
use crate::storage::bounded;

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Sessions are token-less when unset.
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub min_password_len: usize,
    pub storage_timeout: Duration,
}

impl AuthConfig {
    pub fn from_app(cfg: &configs::AppConfig) -> Self {
        let secret = cfg.auth.jwt_secret.trim();
        Self {
            jwt_secret: (!secret.is_empty()).then(|| secret.to_string()),
            token_ttl_hours: cfg.auth.token_ttl_hours,
            min_password_len: cfg.policy.min_password_len,
            storage_timeout: Duration::from_millis(cfg.policy.storage_timeout_ms),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 12,
            min_password_len: 8,
            storage_timeout: Duration::from_secs(5),
        }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    cfg: AuthConfig,
}

async fn hash_off_thread(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ServiceError::Storage(format!("hashing task failed: {e}")))?
}

async fn verify_off_thread(password: String, stored: Option<String>) -> bool {
    tokio::task::spawn_blocking(move || match stored {
        Some(h) => password::verify_password(&password, &h),
        None => {
            password::verify_dummy(&password);
            false
        }
    })
    .await
    .unwrap_or(false)
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, audit: Arc<dyn AuditSink>, clock: Arc<dyn Clock>, cfg: AuthConfig) -> Self {
        Self { repo, audit, clock, cfg }
    }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use service::audit::MemoryAuditSink;
    /// use service::clock::SystemClock;
    /// use models::user::Role;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(
    ///     Arc::new(MockAuthRepository::default()),
    ///     Arc::new(MemoryAuditSink::default()),
    ///     Arc::new(SystemClock),
    ///     AuthConfig::default(),
    /// );
    /// let input = RegisterInput { username: "alice".into(), email: "alice@x.com".into(), password: "password123".into(), role: Role::Student };
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// let id = rt.block_on(svc.register(input)).unwrap();
    /// assert!(!id.is_nil());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username, role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> Result<Uuid, ServiceError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        validate_username(&username)?;
        validate_email(&email).map_err(|_| ServiceError::InvalidEmail)?;
        password::check_strength(&input.password, self.cfg.min_password_len)?;

        bounded("register.check", self.cfg.storage_timeout, async {
            if self.repo.find_by_username(&username).await?.is_some() {
                debug!("username exists");
                return Err(ServiceError::DuplicateUsername);
            }
            if self.repo.find_by_email(&email).await?.is_some() {
                return Err(ServiceError::DuplicateEmail);
            }
            Ok(())
        })
        .await?;

        let password_hash = hash_off_thread(input.password).await?;
        let user = bounded(
            "register",
            self.cfg.storage_timeout,
            self.repo.create_user(NewUser { username, email, password_hash, role: input.role }),
        )
        .await?;

        info!(user_id = %user.id, "user_registered");
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(Some(user.id), AuditAction::Register, format!("username={} role={}", user.username, user.role), self.clock.now()),
        )
        .await;
        Ok(user.id)
    }

    /// Authenticate by username or email and optionally issue a token.
    ///
    /// Unknown account and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username_or_email: &str, password: &str) -> Result<AuthSession, ServiceError> {
        let login = username_or_email.trim();
        let found: Option<AuthUser> =
            bounded("authenticate", self.cfg.storage_timeout, self.repo.find_by_login(login)).await?;

        let ok = verify_off_thread(password.to_string(), found.as_ref().map(|u| u.password_hash.clone())).await;
        let user = match (ok, found) {
            (true, Some(u)) => u,
            (_, found) => {
                warn!("login rejected");
                audit::record(
                    self.audit.as_ref(),
                    AuditEntry::new(found.map(|u| u.id), AuditAction::FailedLogin, format!("login={login}"), self.clock.now()),
                )
                .await;
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = match &self.cfg.jwt_secret {
            Some(secret) => Some(self.issue_token(&user, secret)?),
            None => None,
        };
        info!(user_id = %user.id, "user_logged_in");
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(Some(user.id), AuditAction::Login, format!("username={}", user.username), self.clock.now()),
        )
        .await;
        Ok(AuthSession { user_id: user.id, username: user.username, role: user.role, token })
    }

    fn issue_token(&self, user: &AuthUser, secret: &str) -> Result<String, ServiceError> {
        let now = self.clock.now().timestamp();
        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            role: user.role,
            iat: now,
            exp: now + self.cfg.token_ttl_hours * 3600,
        };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| ServiceError::Storage(format!("token signing failed: {e}")))
    }

    /// Decode a session token back into the caller it was issued to.
    pub fn verify_token(&self, token: &str) -> Result<Caller, ServiceError> {
        let secret = self.cfg.jwt_secret.as_deref().ok_or(ServiceError::InvalidToken)?;
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map_err(|_| ServiceError::InvalidToken)?;
        Ok(Caller::new(data.claims.uid, data.claims.role))
    }

    /// Public sign-up. Only student accounts can be created this way.
    pub async fn register_self(&self, input: RegisterInput) -> Result<Uuid, ServiceError> {
        if input.role != Role::Student {
            return Err(ServiceError::forbidden("self-registration creates student accounts only"));
        }
        self.register(input).await
    }

    /// Account creation by an administrator; any role.
    #[instrument(skip(self, input), fields(caller = %caller.user_id, username = %input.username, role = %input.role))]
    pub async fn create_account(&self, caller: &Caller, input: RegisterInput) -> Result<Uuid, ServiceError> {
        caller.require_admin()?;
        let role = input.role;
        let id = self.register(input).await?;
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(Some(caller.user_id), AuditAction::CreateUser, format!("user={id} role={role}"), self.clock.now()),
        )
        .await;
        Ok(id)
    }

    /// Create the configured admin account. Returns `false` when the
    /// username is already taken, so restarts leave the store alone.
    pub async fn ensure_admin(&self, username: &str, email: &str, password: &str) -> Result<bool, ServiceError> {
        let input = RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        };
        match self.register(input).await {
            Ok(id) => {
                info!(user_id = %id, "bootstrap admin created");
                Ok(true)
            }
            Err(ServiceError::DuplicateUsername) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Tokens are stateless; logging out only leaves a trail.
    pub async fn logout(&self, caller: &Caller) -> Result<(), ServiceError> {
        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(Some(caller.user_id), AuditAction::Logout, String::new(), self.clock.now()),
        )
        .await;
        Ok(())
    }

    /// Account behind a caller; `NotFound` once the account is deleted.
    pub async fn whoami(&self, caller: &Caller) -> Result<(Uuid, String, Role), ServiceError> {
        let u = bounded("whoami", self.cfg.storage_timeout, self.repo.find_by_id(caller.user_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        Ok((u.id, u.username, u.role))
    }
}
