//! Service Repository

use super::{BaseRepository, RepoError, RepoResult, capitalize, parse_id};
use crate::db::models::{Service, ServiceCreate, ServiceUpdate};
use crate::utils::time::now_ms;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct ServiceRepository {
    base: BaseRepository,
}

impl ServiceRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Service>> {
        let services: Vec<Service> = self
            .base
            .db()
            .query("SELECT * FROM service ORDER BY name")
            .await?
            .take(0)?;
        Ok(services)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Service>> {
        let thing = parse_id(id, "service")?;
        let service: Option<Service> = self.base.db().select(thing).await?;
        Ok(service)
    }

    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Service>> {
        let name_owned = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM service WHERE name = $name LIMIT 1")
            .bind(("name", name_owned))
            .await?;
        let services: Vec<Service> = result.take(0)?;
        Ok(services.into_iter().next())
    }

    pub async fn create(&self, data: ServiceCreate) -> RepoResult<Service> {
        let name = capitalize(&data.name);
        if self.find_by_name(&name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Service '{}' already exists",
                name
            )));
        }
        if !data.price.is_finite() || data.price <= 0.0 {
            return Err(RepoError::Validation(
                "Price must be a positive number".to_string(),
            ));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE service SET
                    name = $name,
                    price = $price,
                    description = $description,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", name))
            .bind(("price", data.price))
            .bind(("description", data.description))
            .bind(("created_at", now_ms()))
            .await?;

        let created: Option<Service> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create service".to_string()))
    }

    pub async fn update(&self, id: &str, data: ServiceUpdate) -> RepoResult<Service> {
        let thing = parse_id(id, "service")?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Service {} not found", id)))?;

        let name = data.name.map(|n| capitalize(&n));
        if let Some(ref new_name) = name
            && new_name != &existing.name
            && self.find_by_name(new_name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Service '{}' already exists",
                new_name
            )));
        }
        if let Some(price) = data.price
            && (!price.is_finite() || price <= 0.0)
        {
            return Err(RepoError::Validation(
                "Price must be a positive number".to_string(),
            ));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name OR name,
                    price = IF $has_price THEN $price ELSE price END,
                    description = $description OR description
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", name))
            .bind(("has_price", data.price.is_some()))
            .bind(("price", data.price))
            .bind(("description", data.description))
            .await?;

        result
            .take::<Option<Service>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Service {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id, "service")?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Service {} not found", id)))?;

        let mut result = self
            .base
            .db()
            .query("SELECT count() AS c FROM customer WHERE service = $thing GROUP ALL")
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
                "Service has active subscribers".to_string(),
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
