use argon2::{
    Argon2, Params,
    password_hash::{
        Error, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::api::Backend;
use crate::common::{AuthError, FieldErrors, PasswordValidator, StoreError, validate_email};
use crate::db::{
    AdminUserKey, Database, IsAdminAuthenticatedKey, SEED_ADMIN_USERNAME, SapphireUserKey,
    SessionId,
};
use crate::models::{AdminAccount, AdminRole, AdminSession, NewUser, SessionUser, UserUpdate};

pub struct PasswordManager;

static INSTANCE: OnceLock<Argon2> = OnceLock::new();

// Same parameters as the hashes written at seed time.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=65536,t=3,p=4$dW5rbm93bl9zYWx0X2R1bW15$E2LvWPx3FxvDaJxEMpLLBfWbLkPXfYHrF8z9CGCX3eI";

impl PasswordManager {
    fn engine() -> &'static Argon2<'static> {
        INSTANCE.get_or_init(|| {
            match Params::new(
                64 * 1024, // 64MB Memory (m)
                3,         // 3 Iterations (t)
                4,         // 4 Parallelism lanes (p)
                None,      // Default hash length (32 bytes)
            ) {
                Ok(params) => {
                    Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
                }
                Err(e) => {
                    log::error!("Invalid Argon2 parameters, using defaults: {}", e);
                    Argon2::default()
                }
            }
        })
    }

    pub fn hash_password(password: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::engine().hash_password(password.as_bytes(), &salt)?;

        Ok(hash.to_string())
    }

    pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, Error> {
        let parsed_hash = PasswordHash::new(stored_hash)?;

        let result = Self::engine().verify_password(password.as_bytes(), &parsed_hash);

        match result {
            Ok(_) => Ok(true),
            Err(Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Where to send the visitor after logout: pages that need a user go
/// home, anything else goes back where it was.
pub fn logout_redirect(current_path: &str) -> &str {
    let path = current_path.trim();
    let local = path.starts_with('/') && !path.starts_with("//") && !path.contains('\\');
    if !local || path.starts_with("/profile") || path.starts_with("/booking") {
        "/"
    } else {
        path
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name", "Name is required");
        }
        if !validate_email(&self.email) {
            errors.insert("email", "Enter a valid email address");
        }
        if self.phone.trim().is_empty() {
            errors.insert("phone", "Phone number is required");
        }
        if let Err(message) = PasswordValidator::validate(&self.password) {
            errors.insert("password", message);
        } else if self.password != self.confirm_password {
            errors.insert("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

/// Site visitors: credentials checked by the REST server, the returned user
/// object kept in the session scope.
pub struct UserAuth<'a> {
    backend: &'a dyn Backend,
    db: &'a Database,
}

impl<'a> UserAuth<'a> {
    pub fn new(backend: &'a dyn Backend, db: &'a Database) -> Self {
        Self { backend, db }
    }

    pub async fn current_user(&self, sid: SessionId) -> Result<Option<SessionUser>, StoreError> {
        self.db.get_session::<SapphireUserKey>(sid).await
    }

    /// Nothing is written unless the server accepts the credentials.
    pub async fn login(&self, sid: SessionId, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidRequest(
                "Email and password are required".to_string(),
            ));
        }

        let user = self.backend.login(email, password).await?;
        self.db.set_session::<SapphireUserKey>(sid, &user).await?;
        log::info!("User {} signed in", user.id);
        Ok(user)
    }

    pub async fn signup(&self, sid: SessionId, form: &SignupForm) -> Result<SessionUser, AuthError> {
        form.validate()
            .map_err(|errors| AuthError::InvalidRequest(errors.to_string()))?;

        let new_user = NewUser {
            id: Uuid::new_v4().to_string(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            password: form.password.clone(),
            user_type: "user".to_string(),
        };
        self.backend.create_user(&new_user).await?;

        let mut extra = Map::new();
        extra.insert("user_type".to_string(), Value::from(new_user.user_type.clone()));
        let user = SessionUser {
            id: new_user.id,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            extra,
        };
        self.db.set_session::<SapphireUserKey>(sid, &user).await?;
        log::info!("User {} signed up", user.id);
        Ok(user)
    }

    /// Clears the whole session scope and returns the redirect target.
    pub async fn logout<'p>(&self, sid: SessionId, current_path: &'p str) -> Result<&'p str, StoreError> {
        self.db.clear_session(sid).await?;
        Ok(logout_redirect(current_path))
    }

    /// Sends the changed fields and refreshes the stored user on success.
    pub async fn update_profile(
        &self,
        sid: SessionId,
        user: &SessionUser,
        update: UserUpdate,
    ) -> Result<SessionUser, AuthError> {
        if update.is_empty() {
            return Ok(user.clone());
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AuthError::InvalidRequest("Name cannot be empty".to_string()));
        }

        self.backend.update_user(&user.id, &update).await?;

        let mut refreshed = user.clone();
        if let Some(name) = update.name {
            refreshed.name = name;
        }
        if let Some(phone) = update.phone {
            refreshed.phone = phone;
        }
        self.db.set_session::<SapphireUserKey>(sid, &refreshed).await?;
        Ok(refreshed)
    }
}

/// Local admin list row as shown in the admin UI (no hash).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminListing {
    pub username: String,
    pub role: AdminRole,
    pub created_at: String,
    pub protected: bool,
}

/// Admin panel accounts, checked against the locally seeded list.
pub struct AdminAuth<'a> {
    db: &'a Database,
}

impl<'a> AdminAuth<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Writes the seed superadmin when no admin exists yet.
    pub async fn ensure_seeded(&self) -> Result<bool, StoreError> {
        let seeded = self
            .db
            .seed_admins(|password| {
                PasswordManager::hash_password(password)
                    .inspect_err(|e| log::error!("Password hashing error: {}", e))
                    .ok()
            })
            .await?;
        if seeded {
            log::info!("Seeded superadmin '{}'", SEED_ADMIN_USERNAME);
        }
        Ok(seeded)
    }

    pub async fn login(&self, sid: SessionId, username: &str, password: &str) -> Result<AdminSession, AuthError> {
        let account = self.db.find_admin(username).await?;

        // Always verify so unknown usernames take as long as wrong passwords.
        let stored_hash = account
            .as_ref()
            .map(|a| a.password_hash.as_str())
            .unwrap_or(DUMMY_HASH);
        let password_valid = PasswordManager::verify_password(password, stored_hash).unwrap_or(false);

        let account = match account {
            Some(account) if password_valid => account,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let session = AdminSession::from(&account);
        self.db.set_session::<AdminUserKey>(sid, &session).await?;
        self.db
            .set_session::<IsAdminAuthenticatedKey>(sid, &true)
            .await?;
        log::info!("Admin '{}' signed in", session.username);
        Ok(session)
    }

    pub async fn logout(&self, sid: SessionId) -> Result<(), StoreError> {
        self.db.remove_session::<AdminUserKey>(sid).await?;
        self.db.remove_session::<IsAdminAuthenticatedKey>(sid).await?;
        Ok(())
    }

    /// Signed-in admin, if both session keys agree.
    pub async fn current(&self, sid: SessionId) -> Result<Option<AdminSession>, StoreError> {
        let authenticated = self
            .db
            .get_session::<IsAdminAuthenticatedKey>(sid)
            .await?
            .unwrap_or(false);
        if !authenticated {
            return Ok(None);
        }
        self.db.get_session::<AdminUserKey>(sid).await
    }

    pub async fn list(&self) -> Result<Vec<AdminListing>, StoreError> {
        Ok(self
            .db
            .list_admins()
            .await?
            .into_iter()
            .map(|a| AdminListing {
                protected: a.username.eq_ignore_ascii_case(SEED_ADMIN_USERNAME),
                created_at: a.created_at.format("%Y-%m-%d").to_string(),
                username: a.username,
                role: a.role,
            })
            .collect())
    }

    pub async fn add_admin(
        &self,
        actor: &AdminSession,
        username: &str,
        password: &str,
        role: AdminRole,
    ) -> Result<AdminListing, AuthError> {
        if !actor.is_superadmin() {
            return Err(AuthError::Forbidden);
        }

        let username = username.trim();
        if username.len() < 3
            || !username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
        {
            return Err(AuthError::InvalidRequest(
                "Username must be at least 3 characters of letters, digits, '.', '_' or '-'"
                    .to_string(),
            ));
        }
        PasswordValidator::validate(password).map_err(AuthError::InvalidRequest)?;

        let password_hash = PasswordManager::hash_password(password).map_err(|e| {
            log::error!("Password hashing error: {}", e);
            AuthError::Hashing
        })?;

        let account = AdminAccount {
            username: username.to_string(),
            password_hash,
            role,
            created_at: Utc::now(),
        };
        if !self.db.insert_admin(account).await? {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        log::info!("Admin '{}' added by '{}'", username, actor.username);
        Ok(AdminListing {
            username: username.to_string(),
            role,
            created_at: Utc::now().format("%Y-%m-%d").to_string(),
            protected: false,
        })
    }

    pub async fn remove_admin(&self, actor: &AdminSession, username: &str) -> Result<(), AuthError> {
        if !actor.is_superadmin() {
            return Err(AuthError::Forbidden);
        }
        let username = username.trim();
        if username.eq_ignore_ascii_case(SEED_ADMIN_USERNAME) {
            return Err(AuthError::ProtectedAccount);
        }
        if !self.db.remove_admin(username).await? {
            return Err(AuthError::NotFound(username.to_string()));
        }

        log::info!("Admin '{}' removed by '{}'", username, actor.username);
        Ok(())
    }
}
