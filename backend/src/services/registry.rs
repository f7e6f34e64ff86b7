//! Master-data registry: read-through lookups for grains, warehouses,
//! and contacts
//!
//! The ledger core references master records by id only. Administration
//! of these rows happens outside this service; everything here is
//! read-only and hits current rows on every call.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{Contact, Grain, Warehouse};

use crate::error::{AppError, AppResult};

/// Read-only lookup service over the master tables
#[derive(Clone)]
pub struct MasterRegistry {
    db: PgPool,
}

impl MasterRegistry {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch a grain by id.
    pub async fn get_grain(&self, grain_id: Uuid) -> AppResult<Grain> {
        let grain = sqlx::query_as::<_, Grain>(
            "SELECT id, name, hindi_name, standard_bag_weight_kg, created_at FROM grains WHERE id = $1"
        )
        .bind(grain_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Grain".to_string()))?;

        Ok(grain)
    }

    /// Fetch a warehouse by id.
    pub async fn get_warehouse(&self, warehouse_id: Uuid) -> AppResult<Warehouse> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            "SELECT id, name, location, created_at FROM warehouses WHERE id = $1",
        )
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        Ok(warehouse)
    }

    /// Fetch a contact by id.
    pub async fn get_contact(&self, contact_id: Uuid) -> AppResult<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            "SELECT id, name, contact_type, phone, gst_number, created_at FROM contacts WHERE id = $1"
        )
        .bind(contact_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact".to_string()))?;

        Ok(contact)
    }

    /// Validate that the referenced grain, contact, and warehouse all
    /// exist. Called by every write path before anything is persisted.
    pub async fn validate_references(
        &self,
        grain_id: Uuid,
        contact_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<()> {
        self.get_grain(grain_id).await?;
        self.get_contact(contact_id).await?;
        self.get_warehouse(warehouse_id).await?;
        Ok(())
    }

    /// All grains keyed by id, for projection and report joins.
    pub async fn grain_map(&self) -> AppResult<HashMap<Uuid, Grain>> {
        let grains = sqlx::query_as::<_, Grain>(
            "SELECT id, name, hindi_name, standard_bag_weight_kg, created_at FROM grains",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(grains.into_iter().map(|g| (g.id, g)).collect())
    }

    /// All warehouses keyed by id.
    pub async fn warehouse_map(&self) -> AppResult<HashMap<Uuid, Warehouse>> {
        let warehouses =
            sqlx::query_as::<_, Warehouse>("SELECT id, name, location, created_at FROM warehouses")
                .fetch_all(&self.db)
                .await?;

        Ok(warehouses.into_iter().map(|w| (w.id, w)).collect())
    }
}
