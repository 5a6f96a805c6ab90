//! In-memory backend: one mission at a time, exported as a JSON artifact.
//!
//! All mutations take a single write lock on [`MissionData`]; reads take
//! the read lock. Records whose parent registration is unknown are dropped
//! silently (the worker has already warned about them).

mod export;
mod writer;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ocap_core::model::{
    Ace3DeathEvent, Ace3UnconsciousEvent, ChatEvent, FiredEvent, GeneralEvent, HitEvent,
    KillEvent, Marker, MarkerState, Mission, ProjectileEvent, RadioEvent, ServerFpsEvent, Soldier,
    SoldierState, TimeState, Vehicle, VehicleState, World,
};
use ocap_core::types::{Frame, MarkerId, ObjectId};

use crate::backend::Backend;
use crate::error::StorageError;

pub use export::{build_export, EntityExport, EntitySlot, Export, TimeExport};
pub use writer::artifact_file_name;

/// Where and how artifacts are written.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub output_dir: PathBuf,
    /// Write `.json.gz` instead of `.json`.
    pub compress_output: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./recordings"),
            compress_output: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Mission data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SoldierRecord {
    pub soldier: Soldier,
    pub states: Vec<SoldierState>,
    pub fired_events: Vec<FiredEvent>,
}

#[derive(Debug, Clone)]
pub struct VehicleRecord {
    pub vehicle: Vehicle,
    pub states: Vec<VehicleState>,
}

#[derive(Debug, Clone)]
pub struct MarkerRecord {
    pub marker: Marker,
    pub states: Vec<MarkerState>,
}

/// Everything recorded for the active mission.
#[derive(Debug, Default)]
pub struct MissionData {
    pub mission: Option<(Mission, World)>,
    pub soldiers: HashMap<ObjectId, SoldierRecord>,
    pub vehicles: HashMap<ObjectId, VehicleRecord>,
    pub markers: HashMap<String, MarkerRecord>,
    /// Backend id → marker name, for resolving marker states.
    pub marker_names: HashMap<MarkerId, String>,
    pub next_marker_id: MarkerId,

    pub general_events: Vec<GeneralEvent>,
    pub hit_events: Vec<HitEvent>,
    pub kill_events: Vec<KillEvent>,
    pub chat_events: Vec<ChatEvent>,
    pub radio_events: Vec<RadioEvent>,
    pub server_fps_events: Vec<ServerFpsEvent>,
    pub time_states: Vec<TimeState>,
    pub ace3_death_events: Vec<Ace3DeathEvent>,
    pub ace3_unconscious_events: Vec<Ace3UnconsciousEvent>,
    pub projectile_events: Vec<ProjectileEvent>,
}

impl MissionData {
    /// Largest capture frame over all soldier and vehicle states; 0 when none.
    pub fn end_frame(&self) -> Frame {
        let soldiers = self
            .soldiers
            .values()
            .flat_map(|r| r.states.iter().map(|s| s.capture_frame));
        let vehicles = self
            .vehicles
            .values()
            .flat_map(|r| r.states.iter().map(|s| s.capture_frame));
        soldiers.chain(vehicles).max().unwrap_or(0)
    }
}

/// Record counts for the active mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissionSnapshot {
    pub active: bool,
    pub soldiers: usize,
    pub vehicles: usize,
    pub markers: usize,
    pub soldier_states: usize,
    pub vehicle_states: usize,
    pub marker_states: usize,
    pub fired_events: usize,
    pub projectile_events: usize,
    pub hit_events: usize,
    pub kill_events: usize,
    pub chat_events: usize,
    pub radio_events: usize,
    pub server_fps_events: usize,
    pub time_states: usize,
    pub general_events: usize,
    pub ace3_death_events: usize,
    pub ace3_unconscious_events: usize,
    pub end_frame: Frame,
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

pub struct MemoryBackend {
    config: MemoryConfig,
    data: RwLock<MissionData>,
    last_export_path: RwLock<Option<PathBuf>>,
}

impl MemoryBackend {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            data: RwLock::new(MissionData::default()),
            last_export_path: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Path of the most recent artifact written by [`Backend::end_mission`].
    pub async fn last_export_path(&self) -> Option<PathBuf> {
        self.last_export_path.read().await.clone()
    }

    /// Assemble the artifact for the active mission without writing it.
    pub async fn build_export(&self) -> Result<Export, StorageError> {
        let data = self.data.read().await;
        let (mission, world) = data.mission.as_ref().ok_or(StorageError::NoActiveMission)?;
        Ok(build_export(mission, world, &data))
    }

    /// Run `f` against the recorded data under the read lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&MissionData) -> R) -> R {
        f(&*self.data.read().await)
    }

    pub async fn snapshot(&self) -> MissionSnapshot {
        self.inspect(|d| MissionSnapshot {
            active: d.mission.is_some(),
            soldiers: d.soldiers.len(),
            vehicles: d.vehicles.len(),
            markers: d.markers.len(),
            soldier_states: d.soldiers.values().map(|r| r.states.len()).sum(),
            vehicle_states: d.vehicles.values().map(|r| r.states.len()).sum(),
            marker_states: d.markers.values().map(|r| r.states.len()).sum(),
            fired_events: d.soldiers.values().map(|r| r.fired_events.len()).sum(),
            projectile_events: d.projectile_events.len(),
            hit_events: d.hit_events.len(),
            kill_events: d.kill_events.len(),
            chat_events: d.chat_events.len(),
            radio_events: d.radio_events.len(),
            server_fps_events: d.server_fps_events.len(),
            time_states: d.time_states.len(),
            general_events: d.general_events.len(),
            ace3_death_events: d.ace3_death_events.len(),
            ace3_unconscious_events: d.ace3_unconscious_events.len(),
            end_frame: d.end_frame(),
        })
        .await
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn init(&self) -> Result<(), StorageError> {
        tracing::info!(
            output_dir = %self.config.output_dir.display(),
            compress = self.config.compress_output,
            "Memory backend ready"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn start_mission(&self, mission: Mission, world: World) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        tracing::info!(
            mission_name = %mission.mission_name,
            world_name = %world.world_name,
            "Mission started"
        );
        *data = MissionData {
            mission: Some((mission, world)),
            ..MissionData::default()
        };
        *self.last_export_path.write().await = None;
        Ok(())
    }

    async fn end_mission(&self) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        let (mission, world) = data.mission.as_ref().ok_or(StorageError::NoActiveMission)?;

        let export = build_export(mission, world, &data);
        let path = writer::write_artifact(&self.config, &mission.mission_name, &export).await?;

        tracing::info!(
            path = %path.display(),
            end_frame = export.end_frame,
            entities = export.entities.len(),
            "Mission exported"
        );

        *self.last_export_path.write().await = Some(path);
        *data = MissionData::default();
        Ok(())
    }

    async fn add_soldier(&self, soldier: Soldier) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.soldiers.insert(
            soldier.object_id,
            SoldierRecord {
                soldier,
                states: Vec::new(),
                fired_events: Vec::new(),
            },
        );
        Ok(())
    }

    async fn add_vehicle(&self, vehicle: Vehicle) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.vehicles.insert(
            vehicle.object_id,
            VehicleRecord {
                vehicle,
                states: Vec::new(),
            },
        );
        Ok(())
    }

    async fn add_marker(&self, mut marker: Marker) -> Result<MarkerId, StorageError> {
        let mut data = self.data.write().await;
        data.next_marker_id += 1;
        let id = data.next_marker_id;
        marker.id = id;
        data.marker_names.insert(id, marker.marker_name.clone());
        data.markers.insert(
            marker.marker_name.clone(),
            MarkerRecord {
                marker,
                states: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn record_soldier_state(&self, state: SoldierState) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        if let Some(record) = data.soldiers.get_mut(&state.soldier_id) {
            record.states.push(state);
        }
        Ok(())
    }

    async fn record_vehicle_state(&self, state: VehicleState) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        if let Some(record) = data.vehicles.get_mut(&state.vehicle_id) {
            record.states.push(state);
        }
        Ok(())
    }

    async fn record_marker_state(&self, state: MarkerState) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        let MissionData {
            markers,
            marker_names,
            ..
        } = &mut *data;
        if let Some(record) = marker_names
            .get(&state.marker_id)
            .and_then(|name| markers.get_mut(name))
        {
            record.states.push(state);
        }
        Ok(())
    }

    async fn record_fired_event(&self, event: FiredEvent) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        if let Some(record) = data.soldiers.get_mut(&event.soldier_id) {
            record.fired_events.push(event);
        }
        Ok(())
    }

    async fn record_projectile_event(&self, event: ProjectileEvent) -> Result<(), StorageError> {
        self.data.write().await.projectile_events.push(event);
        Ok(())
    }

    async fn record_hit_event(&self, event: HitEvent) -> Result<(), StorageError> {
        self.data.write().await.hit_events.push(event);
        Ok(())
    }

    async fn record_kill_event(&self, event: KillEvent) -> Result<(), StorageError> {
        self.data.write().await.kill_events.push(event);
        Ok(())
    }

    async fn record_chat_event(&self, event: ChatEvent) -> Result<(), StorageError> {
        self.data.write().await.chat_events.push(event);
        Ok(())
    }

    async fn record_radio_event(&self, event: RadioEvent) -> Result<(), StorageError> {
        self.data.write().await.radio_events.push(event);
        Ok(())
    }

    async fn record_server_fps_event(&self, event: ServerFpsEvent) -> Result<(), StorageError> {
        self.data.write().await.server_fps_events.push(event);
        Ok(())
    }

    async fn record_time_state(&self, state: TimeState) -> Result<(), StorageError> {
        self.data.write().await.time_states.push(state);
        Ok(())
    }

    async fn record_general_event(&self, event: GeneralEvent) -> Result<(), StorageError> {
        self.data.write().await.general_events.push(event);
        Ok(())
    }

    async fn record_ace3_death_event(&self, event: Ace3DeathEvent) -> Result<(), StorageError> {
        self.data.write().await.ace3_death_events.push(event);
        Ok(())
    }

    async fn record_ace3_unconscious_event(
        &self,
        event: Ace3UnconsciousEvent,
    ) -> Result<(), StorageError> {
        self.data.write().await.ace3_unconscious_events.push(event);
        Ok(())
    }

    async fn delete_marker(&self, name: &str, end_frame: Frame) {
        let mut data = self.data.write().await;
        if let Some(record) = data.markers.get_mut(name) {
            record.marker.end_frame = Some(end_frame);
        }
    }

    async fn get_soldier_by_object_id(&self, id: ObjectId) -> Option<Soldier> {
        self.inspect(|d| d.soldiers.get(&id).map(|r| r.soldier.clone()))
            .await
    }

    async fn get_vehicle_by_object_id(&self, id: ObjectId) -> Option<Vehicle> {
        self.inspect(|d| d.vehicles.get(&id).map(|r| r.vehicle.clone()))
            .await
    }

    async fn get_marker_by_name(&self, name: &str) -> Option<Marker> {
        self.inspect(|d| d.markers.get(name).map(|r| r.marker.clone()))
            .await
    }
}
