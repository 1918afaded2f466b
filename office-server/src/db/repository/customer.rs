//! Customer Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Customer, CustomerCreate, CustomerUpdate};
use crate::utils::time::now_ms;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct CustomerRepository {
    base: BaseRepository,
}

impl CustomerRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Customer>> {
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer ORDER BY name")
            .await?
            .take(0)?;
        Ok(customers)
    }

    /// Active subscribers only (the monthly billing population)
    pub async fn find_active(&self) -> RepoResult<Vec<Customer>> {
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE is_active = true ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(customers)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Customer>> {
        let thing = parse_id(id, "customer")?;
        let customer: Option<Customer> = self.base.db().select(thing).await?;
        Ok(customer)
    }

    pub async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Customer>> {
        let phone_owned = phone.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE phone_number = $phone LIMIT 1")
            .bind(("phone", phone_owned))
            .await?;
        let customers: Vec<Customer> = result.take(0)?;
        Ok(customers.into_iter().next())
    }

    pub async fn create(&self, data: CustomerCreate) -> RepoResult<Customer> {
        if self.find_by_phone(&data.phone_number).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Phone number '{}' already registered",
                data.phone_number
            )));
        }

        // Referenced zone and service must exist
        let zone: Option<crate::db::models::Zone> =
            self.base.db().select(data.zone.clone()).await?;
        if zone.is_none() {
            return Err(RepoError::Validation(format!(
                "Zone {} not found",
                data.zone
            )));
        }
        let service: Option<crate::db::models::Service> =
            self.base.db().select(data.service.clone()).await?;
        if service.is_none() {
            return Err(RepoError::Validation(format!(
                "Service {} not found",
                data.service
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE customer SET
                    name = $name,
                    phone_number = $phone_number,
                    location = $location,
                    zone = $zone,
                    service = $service,
                    is_active = true,
                    notes = $notes,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("phone_number", data.phone_number))
            .bind(("location", data.location))
            .bind(("zone", data.zone))
            .bind(("service", data.service))
            .bind(("notes", data.notes))
            .bind(("created_at", now_ms()))
            .await?;

        let created: Option<Customer> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create customer".to_string()))
    }

    pub async fn update(&self, id: &str, data: CustomerUpdate) -> RepoResult<Customer> {
        let thing = parse_id(id, "customer")?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Customer {} not found", id)))?;

        if let Some(ref new_phone) = data.phone_number
            && new_phone != &existing.phone_number
            && self.find_by_phone(new_phone).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Phone number '{}' already registered",
                new_phone
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name OR name,
                    phone_number = $phone_number OR phone_number,
                    location = $location OR location,
                    zone = IF $has_zone THEN $zone ELSE zone END,
                    service = IF $has_service THEN $service ELSE service END,
                    is_active = IF $has_is_active THEN $is_active ELSE is_active END,
                    notes = $notes OR notes
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", data.name))
            .bind(("phone_number", data.phone_number))
            .bind(("location", data.location))
            .bind(("has_zone", data.zone.is_some()))
            .bind(("zone", data.zone))
            .bind(("has_service", data.service.is_some()))
            .bind(("service", data.service))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .bind(("notes", data.notes))
            .await?;

        result
            .take::<Option<Customer>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Customer {} not found", id)))
    }

    /// Soft delete: customers with billing history are never removed
    pub async fn deactivate(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id, "customer")?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Customer {} not found", id)))?;
        self.base
            .db()
            .query("UPDATE $thing SET is_active = false")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
