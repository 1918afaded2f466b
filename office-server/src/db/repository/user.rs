//! User Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::utils::time::now_ms;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all users, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(users)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let thing = parse_id(id, "user")?;
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_lowercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        let email = data.email.to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already registered",
                email
            )));
        }

        // Role must exist
        let role_exists: Option<crate::db::models::Role> =
            self.base.db().select(data.role.clone()).await?;
        if role_exists.is_none() {
            return Err(RepoError::Validation(format!(
                "Role {} not found",
                data.role
            )));
        }

        let hash_pass = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    first_name = $first_name,
                    last_name = $last_name,
                    email = $email,
                    phone_number = $phone_number,
                    address = $address,
                    hash_pass = $hash_pass,
                    role = $role,
                    is_active = true,
                    last_login = NONE,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("first_name", data.first_name))
            .bind(("last_name", data.last_name))
            .bind(("email", email))
            .bind(("phone_number", data.phone_number))
            .bind(("address", data.address))
            .bind(("hash_pass", hash_pass))
            .bind(("role", data.role))
            .bind(("created_at", now_ms()))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    pub async fn update(&self, id: &str, data: UserUpdate) -> RepoResult<User> {
        let thing = parse_id(id, "user")?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;

        let email = data.email.map(|e| e.to_lowercase());
        if let Some(ref new_email) = email
            && new_email != &existing.email
            && self.find_by_email(new_email).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already registered",
                new_email
            )));
        }

        let hash_pass = if let Some(ref password) = data.password {
            Some(
                User::hash_password(password)
                    .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?,
            )
        } else {
            None
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    first_name = $first_name OR first_name,
                    last_name = $last_name OR last_name,
                    email = $email OR email,
                    phone_number = $phone_number OR phone_number,
                    address = $address OR address,
                    hash_pass = $hash_pass OR hash_pass,
                    role = IF $has_role THEN $role ELSE role END,
                    is_active = IF $has_is_active THEN $is_active ELSE is_active END
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("first_name", data.first_name))
            .bind(("last_name", data.last_name))
            .bind(("email", email))
            .bind(("phone_number", data.phone_number))
            .bind(("address", data.address))
            .bind(("hash_pass", hash_pass))
            .bind(("has_role", data.role.is_some()))
            .bind(("role", data.role))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .await?;

        result
            .take::<Option<User>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Record a successful login
    pub async fn touch_last_login(&self, id: &str) -> RepoResult<()> {
        let thing = parse_id(id, "user")?;
        self.base
            .db()
            .query("UPDATE $thing SET last_login = $now")
            .bind(("thing", thing))
            .bind(("now", now_ms()))
            .await?;
        Ok(())
    }

    /// Replace the password hash (change-password flow, old password is
    /// verified by the caller)
    pub async fn set_password(&self, id: &str, password: &str) -> RepoResult<()> {
        let thing = parse_id(id, "user")?;
        let hash_pass = User::hash_password(password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;
        self.base
            .db()
            .query("UPDATE $thing SET hash_pass = $hash_pass")
            .bind(("thing", thing))
            .bind(("hash_pass", hash_pass))
            .await?;
        Ok(())
    }

    /// Soft delete: deactivate the account
    pub async fn deactivate(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id, "user")?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;
        self.base
            .db()
            .query("UPDATE $thing SET is_active = false")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
