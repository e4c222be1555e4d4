use std::sync::Arc;
use tracing::info;

use crate::database::models::{Role, User};
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, EngineError, EngineResult};
use crate::services::recompute::{RecomputeJob, RecomputeQueue};
use crate::utils::datetime::SharedClock;
use crate::utils::validation::{validate_first_name, validate_telegram_chat_id};

/// Identity and role of whoever issued the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
}

impl Caller {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Proof of the admin capability, required by every administrative operation.
    pub fn admin(&self) -> EngineResult<AdminGrant> {
        if self.is_admin() {
            Ok(AdminGrant { _sealed: () })
        } else {
            Err(EngineError::Forbidden)
        }
    }
}

/// Admin capability token. Only obtainable from an admin [`Caller`] or for start-up
/// maintenance through [`AdminGrant::system`].
#[derive(Debug)]
pub struct AdminGrant {
    _sealed: (),
}

impl AdminGrant {
    pub fn system() -> Self {
        Self { _sealed: () }
    }
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseManager>,
    clock: SharedClock,
    queue: RecomputeQueue,
}

impl UserService {
    pub fn new(db: Arc<DatabaseManager>, clock: SharedClock, queue: RecomputeQueue) -> Self {
        Self { db, clock, queue }
    }

    /// Creates a client profile and queues statistics seeding for it.
    pub async fn register(
        &self,
        chat_id: i64,
        username: Option<&str>,
        first_name: &str,
        last_name: Option<&str>,
    ) -> EngineResult<User> {
        validate_telegram_chat_id(chat_id)?;
        validate_first_name(first_name)?;

        let now = self.clock.now();
        let _write = self.db.write_lock().await;
        let mut tx = self.db.pool.begin().await?;

        if User::find_by_chat_id(&mut *tx, chat_id).await?.is_some() {
            return Err(EngineError::AlreadyRegistered { chat_id });
        }

        let user = User::insert(
            &mut *tx,
            chat_id,
            username.filter(|name| !name.is_empty()),
            first_name.trim(),
            last_name.map(str::trim).filter(|name| !name.is_empty()),
            now,
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                EngineError::AlreadyRegistered { chat_id }
            } else {
                EngineError::from(e)
            }
        })?;

        let job = RecomputeJob::NewUser { user_id: user.id };
        let marker_id = job.record(&mut *tx, now).await?;
        tx.commit().await?;
        self.queue.dispatch(marker_id, job);

        info!(user_id = user.id, chat_id, "Registered user");
        Ok(user)
    }

    pub async fn find_by_chat_id(&self, chat_id: i64) -> EngineResult<Option<User>> {
        Ok(User::find_by_chat_id(&self.db.pool, chat_id).await?)
    }

    pub async fn get(&self, user_id: i64) -> EngineResult<User> {
        User::find_by_id(&self.db.pool, user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("user", user_id))
    }

    /// Resolves the caller of a chat; unregistered chats are `NotFound`.
    pub async fn caller_for_chat(&self, chat_id: i64) -> EngineResult<Caller> {
        self.find_by_chat_id(chat_id)
            .await?
            .map(|user| Caller::from_user(&user))
            .ok_or_else(|| EngineError::not_found("user", chat_id))
    }

    pub async fn set_role(&self, _grant: &AdminGrant, chat_id: i64, role: Role) -> EngineResult<User> {
        let _write = self.db.write_lock().await;
        let user = User::set_role(&self.db.pool, chat_id, role)
            .await?
            .ok_or_else(|| EngineError::not_found("user", chat_id))?;
        info!(chat_id, ?role, "Changed user role");
        Ok(user)
    }

    pub async fn list_users(&self, _grant: &AdminGrant) -> EngineResult<Vec<User>> {
        Ok(User::list_all(&self.db.pool).await?)
    }

    /// Promotes the configured base admin if the profile exists. Returns whether the role
    /// changed.
    pub async fn ensure_admin(&self, chat_id: i64) -> EngineResult<bool> {
        match self.find_by_chat_id(chat_id).await? {
            Some(user) if user.is_admin() => Ok(false),
            Some(_) => {
                self.set_role(&AdminGrant::system(), chat_id, Role::Admin).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
