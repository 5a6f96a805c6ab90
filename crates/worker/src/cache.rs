//! Per-mission lookups from producer ids to earlier registrations.
//!
//! Both caches are cleared when a new mission starts. Registration handlers
//! write; every other handler only reads.

use std::collections::HashMap;

use tokio::sync::RwLock;

use ocap_core::model::{EntityRef, Soldier, Vehicle};
use ocap_core::types::{MarkerId, ObjectId};

// ---------------------------------------------------------------------------
// EntityCache
// ---------------------------------------------------------------------------

/// Soldiers and vehicles by object id. The two id spaces are separate maps.
#[derive(Default)]
pub struct EntityCache {
    soldiers: RwLock<HashMap<ObjectId, Soldier>>,
    vehicles: RwLock<HashMap<ObjectId, Vehicle>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by object id.
    pub async fn add_soldier(&self, soldier: Soldier) {
        self.soldiers
            .write()
            .await
            .insert(soldier.object_id, soldier);
    }

    pub async fn add_vehicle(&self, vehicle: Vehicle) {
        self.vehicles
            .write()
            .await
            .insert(vehicle.object_id, vehicle);
    }

    pub async fn soldier(&self, id: ObjectId) -> Option<Soldier> {
        self.soldiers.read().await.get(&id).cloned()
    }

    pub async fn vehicle(&self, id: ObjectId) -> Option<Vehicle> {
        self.vehicles.read().await.get(&id).cloned()
    }

    pub async fn has_soldier(&self, id: ObjectId) -> bool {
        self.soldiers.read().await.contains_key(&id)
    }

    pub async fn has_vehicle(&self, id: ObjectId) -> bool {
        self.vehicles.read().await.contains_key(&id)
    }

    /// Soldier first, then vehicle. `None` when the id is unknown to both.
    pub async fn classify(&self, id: ObjectId) -> Option<EntityRef> {
        if self.has_soldier(id).await {
            Some(EntityRef::Soldier(id))
        } else if self.has_vehicle(id).await {
            Some(EntityRef::Vehicle(id))
        } else {
            None
        }
    }

    pub async fn reset(&self) {
        self.soldiers.write().await.clear();
        self.vehicles.write().await.clear();
    }

    /// `(soldiers, vehicles)` currently cached.
    pub async fn len(&self) -> (usize, usize) {
        (
            self.soldiers.read().await.len(),
            self.vehicles.read().await.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// MarkerCache
// ---------------------------------------------------------------------------

/// Producer marker names to backend-assigned marker ids.
#[derive(Default)]
pub struct MarkerCache {
    ids: RwLock<HashMap<String, MarkerId>>,
}

impl MarkerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, name: impl Into<String>, id: MarkerId) {
        self.ids.write().await.insert(name.into(), id);
    }

    pub async fn get(&self, name: &str) -> Option<MarkerId> {
        self.ids.read().await.get(name).copied()
    }

    pub async fn reset(&self) {
        self.ids.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.ids.read().await.len()
    }
}
