use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Client,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

const USER_COLUMNS: &str = "id, chat_id, username, first_name, last_name, role, created_at";

impl User {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub async fn insert<'e, E>(
        executor: E,
        chat_id: i64,
        username: Option<&str>,
        first_name: &str,
        last_name: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO users (chat_id, username, first_name, last_name, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(chat_id)
            .bind(username)
            .bind(first_name)
            .bind(last_name)
            .bind(Role::Client)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_chat_id<'e, E>(
        executor: E,
        chat_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE chat_id = ?");
        sqlx::query_as::<_, User>(&query)
            .bind(chat_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        sqlx::query_as::<_, User>(&query).fetch_all(executor).await
    }

    pub async fn set_role<'e, E>(
        executor: E,
        chat_id: i64,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!("UPDATE users SET role = ? WHERE chat_id = ? RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(role)
            .bind(chat_id)
            .fetch_optional(executor)
            .await
    }
}
