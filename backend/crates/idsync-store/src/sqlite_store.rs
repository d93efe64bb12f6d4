use crate::{IdentityStore, Result, StoreError, StoredGroup, StoredUser, UserBasics};

use std::collections::BTreeMap;
use std::panic::Location;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use error_location::ErrorLocation;
use log::debug;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

const MAX_CONNECTIONS: u32 = 5;

/// [`IdentityStore`] backed by SQLite.
///
/// Uniqueness rules live in the schema (`users.username`, sibling group names,
/// `user_attribute_claims`) so concurrent writers surface as `Conflict`.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap a pool whose schema is already migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database file and run migrations.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Migration {
                    message: format!("Failed to create database directory: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Self::migrate(&pool).await?;
        debug!("Opened identity store at {}", path.display());

        Ok(Self::new(pool))
    }

    pub async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| StoreError::Migration {
                message: format!("Migration failed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn require_user(&self, user_id: Uuid) -> Result<()> {
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        exists
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("user", user_id.to_string()))
    }

    async fn require_group(&self, group_id: Uuid) -> Result<()> {
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM groups WHERE id = ?")
            .bind(group_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        exists
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("group", group_id.to_string()))
    }

    async fn replace_values(
        tx: &mut Transaction<'_, Sqlite>,
        table: &'static str,
        owner_column: &'static str,
        owner_id: Uuid,
        name: &str,
        values: &[String],
    ) -> Result<()> {
        let owner = owner_id.to_string();

        sqlx::query(&format!(
            "DELETE FROM {table} WHERE {owner_column} = ? AND name = ?"
        ))
        .bind(&owner)
        .bind(name)
        .execute(&mut **tx)
        .await?;

        let insert = format!(
            "INSERT INTO {table} ({owner_column}, name, position, value) VALUES (?, ?, ?, ?)"
        );
        for (position, value) in values.iter().enumerate() {
            sqlx::query(&insert)
                .bind(&owner)
                .bind(name)
                .bind(position as i64)
                .bind(value)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    async fn release_claims(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: Uuid,
        name: &str,
    ) -> Result<()> {
        sqlx::query("DELETE FROM user_attribute_claims WHERE user_id = ? AND name = ?")
            .bind(user_id.to_string())
            .bind(name)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

fn parse_uuid(raw: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::corrupt(format!("Invalid UUID in {column}: {e}")))
}

fn user_from_row(row: &SqliteRow) -> Result<StoredUser> {
    let id: String = row.try_get("id")?;
    Ok(StoredUser {
        id: parse_uuid(&id, "users.id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        enabled: row.try_get::<i64, _>("enabled")? != 0,
    })
}

fn group_from_row(row: &SqliteRow) -> Result<StoredGroup> {
    let id: String = row.try_get("id")?;
    let parent_id: Option<String> = row.try_get("parent_id")?;
    Ok(StoredGroup {
        id: parse_uuid(&id, "groups.id")?,
        name: row.try_get("name")?,
        parent_id: parent_id
            .as_deref()
            .map(|p| parse_uuid(p, "groups.parent_id"))
            .transpose()?,
    })
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn create_user(&self, username: &str) -> Result<StoredUser> {
        let id = Uuid::new_v4();
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
                INSERT INTO users (id, username, enabled, created_at, updated_at)
                VALUES (?, ?, 1, ?, ?)
                "#,
        )
        .bind(id.to_string())
        .bind(username)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict { .. } => StoreError::conflict("user", username),
            other => other,
        })?;

        Ok(StoredUser {
            id,
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: None,
            enabled: true,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<StoredUser>> {
        let row = sqlx::query(
            r#"
                SELECT id, username, first_name, last_name, email, enabled
                FROM users
                WHERE username = ?
                "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user_basics(&self, user_id: Uuid, basics: &UserBasics) -> Result<()> {
        let result = sqlx::query(
            r#"
                UPDATE users
                SET first_name = ?, last_name = ?, email = ?, updated_at = ?
                WHERE id = ?
                "#,
        )
        .bind(&basics.first_name)
        .bind(&basics.last_name)
        .bind(&basics.email)
        .bind(Utc::now().timestamp())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user_id.to_string()));
        }
        Ok(())
    }

    async fn get_user_attribute(&self, user_id: Uuid, name: &str) -> Result<Vec<String>> {
        self.require_user(user_id).await?;

        let values = sqlx::query_scalar(
            r#"
                SELECT value FROM user_attributes
                WHERE user_id = ? AND name = ?
                ORDER BY position
                "#,
        )
        .bind(user_id.to_string())
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    async fn list_user_attributes(&self, user_id: Uuid) -> Result<BTreeMap<String, Vec<String>>> {
        self.require_user(user_id).await?;

        let rows = sqlx::query(
            r#"
                SELECT name, value FROM user_attributes
                WHERE user_id = ?
                ORDER BY name, position
                "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut attributes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get("name")?;
            let value: String = row.try_get("value")?;
            attributes.entry(name).or_default().push(value);
        }
        Ok(attributes)
    }

    async fn set_user_attribute(
        &self,
        user_id: Uuid,
        name: &str,
        values: &[String],
    ) -> Result<()> {
        self.require_user(user_id).await?;

        let mut tx = self.pool.begin().await?;
        Self::release_claims(&mut tx, user_id, name).await?;
        Self::replace_values(&mut tx, "user_attributes", "user_id", user_id, name, values).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn remove_user_attribute(&self, user_id: Uuid, name: &str) -> Result<()> {
        self.set_user_attribute(user_id, name, &[]).await
    }

    async fn claim_unique_user_attribute(
        &self,
        user_id: Uuid,
        name: &str,
        value: &str,
    ) -> Result<()> {
        self.require_user(user_id).await?;

        let mut tx = self.pool.begin().await?;

        let holder: Option<String> = sqlx::query_scalar(
            "SELECT user_id FROM user_attribute_claims WHERE name = ? AND value = ?",
        )
        .bind(name)
        .bind(value)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(holder) = holder
            && holder != user_id.to_string()
        {
            return Err(StoreError::conflict(
                "user_attribute_claim",
                format!("{name}={value}"),
            ));
        }

        Self::release_claims(&mut tx, user_id, name).await?;

        sqlx::query(
            r#"
                INSERT INTO user_attribute_claims (name, value, user_id, claimed_at)
                VALUES (?, ?, ?, ?)
                "#,
        )
        .bind(name)
        .bind(value)
        .bind(user_id.to_string())
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict { .. } => {
                StoreError::conflict("user_attribute_claim", format!("{name}={value}"))
            }
            other => other,
        })?;

        Self::replace_values(
            &mut tx,
            "user_attributes",
            "user_id",
            user_id,
            name,
            &[value.to_string()],
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn is_attribute_value_taken(
        &self,
        name: &str,
        value: &str,
        except_user: Uuid,
    ) -> Result<bool> {
        let except = except_user.to_string();

        let taken: i64 = sqlx::query_scalar(
            r#"
                SELECT EXISTS (
                    SELECT 1 FROM user_attributes
                    WHERE name = ? AND value = ? AND user_id <> ?
                    UNION ALL
                    SELECT 1 FROM user_attribute_claims
                    WHERE name = ? AND value = ? AND user_id <> ?
                )
                "#,
        )
        .bind(name)
        .bind(value)
        .bind(&except)
        .bind(name)
        .bind(value)
        .bind(&except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken != 0)
    }

    async fn create_group(&self, name: &str, parent_id: Option<Uuid>) -> Result<StoredGroup> {
        if let Some(parent_id) = parent_id {
            self.require_group(parent_id).await?;
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
                INSERT INTO groups (id, parent_id, name, created_at)
                VALUES (?, ?, ?, ?)
                "#,
        )
        .bind(id.to_string())
        .bind(parent_id.map(|p| p.to_string()))
        .bind(name)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict { .. } => StoreError::conflict("group", name),
            other => other,
        })?;

        Ok(StoredGroup {
            id,
            name: name.to_string(),
            parent_id,
        })
    }

    async fn find_root_group(&self, name: &str) -> Result<Option<StoredGroup>> {
        let row = sqlx::query(
            "SELECT id, parent_id, name FROM groups WHERE parent_id IS NULL AND name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(group_from_row).transpose()
    }

    async fn find_subgroup(&self, parent_id: Uuid, name: &str) -> Result<Option<StoredGroup>> {
        let row =
            sqlx::query("SELECT id, parent_id, name FROM groups WHERE parent_id = ? AND name = ?")
                .bind(parent_id.to_string())
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(group_from_row).transpose()
    }

    async fn list_subgroups(&self, parent_id: Uuid) -> Result<Vec<StoredGroup>> {
        let rows = sqlx::query(
            "SELECT id, parent_id, name FROM groups WHERE parent_id = ? ORDER BY name",
        )
        .bind(parent_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(group_from_row).collect()
    }

    async fn get_group_attribute(&self, group_id: Uuid, name: &str) -> Result<Vec<String>> {
        self.require_group(group_id).await?;

        let values = sqlx::query_scalar(
            r#"
                SELECT value FROM group_attributes
                WHERE group_id = ? AND name = ?
                ORDER BY position
                "#,
        )
        .bind(group_id.to_string())
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    async fn set_group_attribute(
        &self,
        group_id: Uuid,
        name: &str,
        values: &[String],
    ) -> Result<()> {
        self.require_group(group_id).await?;

        let mut tx = self.pool.begin().await?;
        Self::replace_values(&mut tx, "group_attributes", "group_id", group_id, name, values)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    async fn join_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
        self.require_user(user_id).await?;
        self.require_group(group_id).await?;

        sqlx::query(
            r#"
                INSERT INTO group_memberships (user_id, group_id, joined_at)
                VALUES (?, ?, ?)
                ON CONFLICT(user_id, group_id) DO NOTHING
                "#,
        )
        .bind(user_id.to_string())
        .bind(group_id.to_string())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn leave_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM group_memberships WHERE user_id = ? AND group_id = ?")
            .bind(user_id.to_string())
            .bind(group_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_user_groups(&self, user_id: Uuid) -> Result<Vec<StoredGroup>> {
        self.require_user(user_id).await?;

        let rows = sqlx::query(
            r#"
                SELECT g.id, g.parent_id, g.name
                FROM groups g
                JOIN group_memberships m ON m.group_id = g.id
                WHERE m.user_id = ?
                ORDER BY g.name
                "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(group_from_row).collect()
    }
}
