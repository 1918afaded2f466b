//! Zone Repository

use super::{BaseRepository, RepoError, RepoResult, capitalize, parse_id};
use crate::db::models::{Zone, ZoneCreate, ZoneUpdate};
use crate::utils::time::now_ms;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct ZoneRepository {
    base: BaseRepository,
}

impl ZoneRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Zone>> {
        let zones: Vec<Zone> = self
            .base
            .db()
            .query("SELECT * FROM zone ORDER BY name")
            .await?
            .take(0)?;
        Ok(zones)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Zone>> {
        let thing = parse_id(id, "zone")?;
        let zone: Option<Zone> = self.base.db().select(thing).await?;
        Ok(zone)
    }

    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Zone>> {
        let name_owned = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM zone WHERE name = $name LIMIT 1")
            .bind(("name", name_owned))
            .await?;
        let zones: Vec<Zone> = result.take(0)?;
        Ok(zones.into_iter().next())
    }

    pub async fn create(&self, data: ZoneCreate) -> RepoResult<Zone> {
        let name = capitalize(&data.name);
        if self.find_by_name(&name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Zone '{}' already exists",
                name
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE zone SET
                    name = $name,
                    description = $description,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", name))
            .bind(("description", data.description))
            .bind(("created_at", now_ms()))
            .await?;

        let created: Option<Zone> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create zone".to_string()))
    }

    pub async fn update(&self, id: &str, data: ZoneUpdate) -> RepoResult<Zone> {
        let thing = parse_id(id, "zone")?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Zone {} not found", id)))?;

        let name = data.name.map(|n| capitalize(&n));
        if let Some(ref new_name) = name
            && new_name != &existing.name
            && self.find_by_name(new_name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Zone '{}' already exists",
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
            .take::<Option<Zone>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Zone {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id, "zone")?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Zone {} not found", id)))?;

        let mut result = self
            .base
            .db()
            .query("SELECT count() AS c FROM customer WHERE zone = $thing GROUP ALL")
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
            return Err(RepoError::Conflict("Zone has customers".to_string()));
        }

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
