use async_trait::async_trait;

use ocap_core::model::{
    Ace3DeathEvent, Ace3UnconsciousEvent, ChatEvent, FiredEvent, GeneralEvent, HitEvent,
    KillEvent, Marker, MarkerState, Mission, ProjectileEvent, RadioEvent, ServerFpsEvent, Soldier,
    SoldierState, TimeState, Vehicle, VehicleState, World,
};
use ocap_core::types::{Frame, MarkerId, ObjectId};

use crate::error::StorageError;

/// Contract between the worker and a storage implementation.
///
/// Records arrive already validated: every state or event refers to a
/// registration the worker has seen in the current mission. A backend that
/// cannot find the parent of a record may ignore it.
///
/// Implementations must tolerate concurrent calls for unrelated records:
/// buffered commands are drained in parallel across command tags.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn init(&self) -> Result<(), StorageError>;
    async fn close(&self) -> Result<(), StorageError>;

    /// Begin a mission. Any data of a previous mission is discarded.
    async fn start_mission(&self, mission: Mission, world: World) -> Result<(), StorageError>;

    /// Finish the active mission and persist it.
    async fn end_mission(&self) -> Result<(), StorageError>;

    async fn add_soldier(&self, soldier: Soldier) -> Result<(), StorageError>;
    async fn add_vehicle(&self, vehicle: Vehicle) -> Result<(), StorageError>;

    /// Insert a marker and return the id assigned to it.
    async fn add_marker(&self, marker: Marker) -> Result<MarkerId, StorageError>;

    async fn record_soldier_state(&self, state: SoldierState) -> Result<(), StorageError>;
    async fn record_vehicle_state(&self, state: VehicleState) -> Result<(), StorageError>;
    async fn record_marker_state(&self, state: MarkerState) -> Result<(), StorageError>;
    async fn record_fired_event(&self, event: FiredEvent) -> Result<(), StorageError>;
    async fn record_projectile_event(&self, event: ProjectileEvent) -> Result<(), StorageError>;
    async fn record_hit_event(&self, event: HitEvent) -> Result<(), StorageError>;
    async fn record_kill_event(&self, event: KillEvent) -> Result<(), StorageError>;
    async fn record_chat_event(&self, event: ChatEvent) -> Result<(), StorageError>;
    async fn record_radio_event(&self, event: RadioEvent) -> Result<(), StorageError>;
    async fn record_server_fps_event(&self, event: ServerFpsEvent) -> Result<(), StorageError>;
    async fn record_time_state(&self, state: TimeState) -> Result<(), StorageError>;
    async fn record_general_event(&self, event: GeneralEvent) -> Result<(), StorageError>;
    async fn record_ace3_death_event(&self, event: Ace3DeathEvent) -> Result<(), StorageError>;
    async fn record_ace3_unconscious_event(
        &self,
        event: Ace3UnconsciousEvent,
    ) -> Result<(), StorageError>;

    /// Mark the named marker as removed at `end_frame`. Unknown names are ignored.
    async fn delete_marker(&self, name: &str, end_frame: Frame);

    async fn get_soldier_by_object_id(&self, id: ObjectId) -> Option<Soldier>;
    async fn get_vehicle_by_object_id(&self, id: ObjectId) -> Option<Vehicle>;
    async fn get_marker_by_name(&self, name: &str) -> Option<Marker>;
}
