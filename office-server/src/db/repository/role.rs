//! Role Repository

use super::{BaseRepository, RepoError, RepoResult, capitalize, parse_id};
use crate::db::models::{Role, RoleCreate, RoleUpdate};
use crate::utils::time::now_ms;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct RoleRepository {
    base: BaseRepository,
}

impl RoleRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Role>> {
        let roles: Vec<Role> = self
            .base
            .db()
            .query("SELECT * FROM role ORDER BY name")
            .await?
            .take(0)?;
        Ok(roles)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Role>> {
        let thing = parse_id(id, "role")?;
        let role: Option<Role> = self.base.db().select(thing).await?;
        Ok(role)
    }

    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let name_owned = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM role WHERE name = $name LIMIT 1")
            .bind(("name", name_owned))
            .await?;
        let roles: Vec<Role> = result.take(0)?;
        Ok(roles.into_iter().next())
    }

    pub async fn create(&self, data: RoleCreate) -> RepoResult<Role> {
        let name = capitalize(&data.name);
        if self.find_by_name(&name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Role '{}' already exists",
                name
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE role SET
                    name = $name,
                    description = $description,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", name))
            .bind(("description", data.description))
            .bind(("created_at", now_ms()))
            .await?;

        let created: Option<Role> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create role".to_string()))
    }

    pub async fn update(&self, id: &str, data: RoleUpdate) -> RepoResult<Role> {
        let thing = parse_id(id, "role")?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Role {} not found", id)))?;

        let name = data.name.map(|n| capitalize(&n));
        if let Some(ref new_name) = name
            && new_name != &existing.name
            && self.find_by_name(new_name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Role '{}' already exists",
                new_name
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name OR name,
                    description = $description OR description
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", name))
            .bind(("description", data.description))
            .await?;

        result
            .take::<Option<Role>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Role {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id, "role")?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Role {} not found", id)))?;

        // Roles referenced by users cannot be removed
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS c FROM user WHERE role = $thing GROUP ALL")
            .bind(("thing", thing.clone()))
            .await?;
        let counts: Vec<serde_json::Value> = result.take(0)?;
        let in_use = counts
            .first()
            .and_then(|v| v.get("c"))
            .and_then(|c| c.as_i64())
            .unwrap_or(0)
            > 0;
        if in_use {
            return Err(RepoError::Conflict(
                "Role is assigned to one or more users".to_string(),
            ));
        }

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
