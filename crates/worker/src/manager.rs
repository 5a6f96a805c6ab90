//! Command handlers.
//!
//! Every handler follows the same shape: parse the arguments, resolve any
//! object id or marker name against the caches, then forward the record to
//! the backend. [`Manager::register_handlers`] installs one handler per
//! [`Command`] with the discipline the command table assigns it.

use std::sync::Arc;

use tokio::sync::RwLock;

use ocap_core::model::{Ace3DeathEvent, EntityRef, HitEvent, KillEvent, ProjectileHit, RawCombatEvent};
use ocap_core::parser;
use ocap_core::types::ObjectId;
use ocap_core::wire::{clean_args, require_fields};
use ocap_core::ParseError;
use ocap_events::{handler, Discipline, Dispatcher, Event, HandlerResult};
use ocap_storage::Backend;

use crate::cache::{EntityCache, MarkerCache};
use crate::command::Command;
use crate::config::RecorderConfig;
use crate::error::WorkerError;

/// Arguments longer than this are truncated in log lines.
const ARG_PREVIEW_LIMIT: usize = 256;

/// Response of lifecycle commands that succeed without a value.
const OK: &str = "ok";

pub struct Manager {
    backend: Arc<dyn Backend>,
    entities: Arc<EntityCache>,
    markers: Arc<MarkerCache>,
    extension_version: String,
    extension_build: String,
    /// Reported by the addon; stamped onto the next mission.
    addon_version: RwLock<String>,
}

impl Manager {
    pub fn new(
        backend: Arc<dyn Backend>,
        entities: Arc<EntityCache>,
        markers: Arc<MarkerCache>,
        extension_version: impl Into<String>,
        extension_build: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            entities,
            markers,
            extension_version: extension_version.into(),
            extension_build: extension_build.into(),
            addon_version: RwLock::new(String::new()),
        }
    }

    pub fn entities(&self) -> &Arc<EntityCache> {
        &self.entities
    }

    pub fn markers(&self) -> &Arc<MarkerCache> {
        &self.markers
    }

    /// Install a handler for every [`Command`] on `dispatcher`.
    pub async fn register_handlers(self: &Arc<Self>, dispatcher: &Dispatcher, config: &RecorderConfig) {
        for command in Command::ALL {
            let discipline = command.discipline(config);
            let manager = Arc::clone(self);
            let handle = handler(move |event: Event| {
                let manager = Arc::clone(&manager);
                async move { manager.run(command, discipline, event.args).await }
            });
            dispatcher.register(command.tag(), handle, discipline).await;
        }

        tracing::info!(commands = Command::ALL.len(), "Command handlers registered");
    }

    /// Run one command and turn its failure into what the dispatcher sees.
    ///
    /// Missing references are dropped with a warning. Other failures are
    /// returned to synchronous callers; buffered ones are logged here and
    /// reported as handled so the queue keeps flowing.
    async fn run(&self, command: Command, discipline: Discipline, args: Vec<String>) -> HandlerResult {
        let error = match self.handle(command, &args).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        match &error {
            WorkerError::MissingReference { kind, id, .. } => {
                tracing::warn!(
                    command = %command,
                    kind = %kind,
                    id = %id,
                    "Reference not registered, dropping record"
                );
                return Ok(String::new());
            }
            WorkerError::Parse { source, .. } => {
                tracing::warn!(
                    command = %command,
                    error = %source,
                    args = ?preview_args(&args),
                    "Failed to parse arguments"
                );
            }
            WorkerError::Backend(e) => {
                tracing::error!(command = %command, error = %e, "Backend rejected record");
            }
        }

        match discipline {
            Discipline::Sync => Err(error.into()),
            Discipline::Buffered { .. } => Ok(String::new()),
        }
    }

    /// Execute `command` against `args`.
    pub async fn handle(&self, command: Command, args: &[String]) -> Result<String, WorkerError> {
        match command {
            Command::Version => Ok(self.extension_version.clone()),
            Command::AddonVersion => self.addon_version(args).await,
            Command::NewMission => self.new_mission(args).await,
            Command::Save => self.save().await,
            Command::NewSoldier => self.new_soldier(args).await,
            Command::NewVehicle => self.new_vehicle(args).await,
            Command::NewMarker => self.new_marker(args).await,
            Command::SoldierState => self.soldier_state(args).await,
            Command::VehicleState => self.vehicle_state(args).await,
            Command::MarkerState => self.marker_state(args).await,
            Command::TimeState => self.time_state(args).await,
            Command::Projectile => self.projectile(args).await,
            Command::Kill => self.kill(args).await,
            Command::Hit => self.hit(args).await,
            Command::Fired => self.fired(args).await,
            Command::Event => self.general_event(args).await,
            Command::Chat => self.chat(args).await,
            Command::Radio => self.radio(args).await,
            Command::Fps => self.fps(args).await,
            Command::Ace3Death => self.ace3_death(args).await,
            Command::Ace3Unconscious => self.ace3_unconscious(args).await,
            Command::DeleteMarker => self.delete_marker(args).await,
        }
    }

    // ---- lifecycle ----

    async fn addon_version(&self, args: &[String]) -> Result<String, WorkerError> {
        parsed(Command::AddonVersion, require_fields(args, 1))?;
        let version = clean_args(&args[..1]).remove(0);
        tracing::info!(addon_version = %version, "Addon version reported");
        *self.addon_version.write().await = version;
        Ok(OK.to_string())
    }

    async fn new_mission(&self, args: &[String]) -> Result<String, WorkerError> {
        let (mut mission, world) = parsed(Command::NewMission, parser::parse_mission(args))?;
        mission.addon_version = self.addon_version.read().await.clone();
        mission.extension_version = self.extension_version.clone();
        mission.extension_build = self.extension_build.clone();

        // Cleared before the backend starts so nothing from the previous
        // mission can satisfy a lookup in this one.
        self.entities.reset().await;
        self.markers.reset().await;

        tracing::info!(
            mission_name = %mission.mission_name,
            world_name = %world.world_name,
            author = %mission.author,
            capture_delay = mission.capture_delay,
            "New mission"
        );
        self.backend.start_mission(mission, world).await?;
        Ok(OK.to_string())
    }

    /// Close the mission and write its artifact.
    ///
    /// Buffered queues are not drained here. The addon stops sending state
    /// and event commands before `:SAVE:`; records still queued when the
    /// mission closes are not part of its artifact.
    async fn save(&self) -> Result<String, WorkerError> {
        self.backend.end_mission().await?;
        Ok(OK.to_string())
    }

    // ---- registrations ----

    async fn new_soldier(&self, args: &[String]) -> Result<String, WorkerError> {
        let soldier = parsed(Command::NewSoldier, parser::parse_soldier(args))?;
        tracing::debug!(object_id = soldier.object_id, unit_name = %soldier.unit_name, "New soldier");
        self.entities.add_soldier(soldier.clone()).await;
        self.backend.add_soldier(soldier).await?;
        Ok(String::new())
    }

    async fn new_vehicle(&self, args: &[String]) -> Result<String, WorkerError> {
        let vehicle = parsed(Command::NewVehicle, parser::parse_vehicle(args))?;
        tracing::debug!(object_id = vehicle.object_id, class_name = %vehicle.class_name, "New vehicle");
        self.entities.add_vehicle(vehicle.clone()).await;
        self.backend.add_vehicle(vehicle).await?;
        Ok(String::new())
    }

    /// Responds with the marker id the backend assigned.
    async fn new_marker(&self, args: &[String]) -> Result<String, WorkerError> {
        let marker = parsed(Command::NewMarker, parser::parse_marker_create(args))?;
        let name = marker.marker_name.clone();
        let id = self.backend.add_marker(marker).await?;
        self.markers.set(name, id).await;
        Ok(id.to_string())
    }

    // ---- states ----

    async fn soldier_state(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::SoldierState;
        let mut state = parsed(command, parser::parse_soldier_state(args))?;
        let soldier = self
            .entities
            .soldier(state.soldier_id)
            .await
            .ok_or_else(|| WorkerError::missing(command.tag(), "soldier", state.soldier_id))?;

        // Short-form states carry no group or side.
        if state.group_id.is_empty() {
            state.group_id = soldier.group_id;
        }
        if state.side.is_empty() {
            state.side = soldier.side;
        }

        self.backend.record_soldier_state(state).await?;
        Ok(String::new())
    }

    async fn vehicle_state(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::VehicleState;
        let state = parsed(command, parser::parse_vehicle_state(args))?;
        self.require_vehicle(command, state.vehicle_id).await?;
        self.backend.record_vehicle_state(state).await?;
        Ok(String::new())
    }

    async fn marker_state(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::MarkerState;
        let parser::ParsedMarkerMove {
            marker_name,
            mut state,
        } = parsed(command, parser::parse_marker_move(args))?;

        let Some(marker_id) = self.markers.get(&marker_name).await else {
            return Err(WorkerError::MissingReference {
                command: command.tag(),
                kind: "marker",
                id: marker_name,
            });
        };
        state.marker_id = marker_id;

        self.backend.record_marker_state(state).await?;
        Ok(String::new())
    }

    async fn delete_marker(&self, args: &[String]) -> Result<String, WorkerError> {
        let (name, frame) = parsed(Command::DeleteMarker, parser::parse_marker_delete(args))?;
        self.backend.delete_marker(&name, frame).await;
        Ok(String::new())
    }

    async fn time_state(&self, args: &[String]) -> Result<String, WorkerError> {
        let state = parsed(Command::TimeState, parser::parse_time_state(args))?;
        self.backend.record_time_state(state).await?;
        Ok(String::new())
    }

    // ---- combat ----

    async fn projectile(&self, args: &[String]) -> Result<String, WorkerError> {
        let parser::ParsedProjectile {
            mut event,
            raw_hits,
        } = parsed(Command::Projectile, parser::parse_projectile(args))?;

        for raw in raw_hits {
            match self.entities.classify(raw.entity_id).await {
                Some(target) => event.hits.push(ProjectileHit {
                    target,
                    components: raw.components,
                    position: raw.position,
                    capture_frame: raw.capture_frame,
                }),
                None => tracing::warn!(
                    command = %Command::Projectile,
                    id = raw.entity_id,
                    "Hit entity not registered, skipping hit"
                ),
            }
        }

        self.backend.record_projectile_event(event).await?;
        Ok(String::new())
    }

    async fn kill(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::Kill;
        let raw = parsed(command, parser::parse_kill(args))?;
        let (victim, killer) = self.classify_combat(command, &raw).await?;

        self.backend
            .record_kill_event(KillEvent {
                capture_frame: raw.capture_frame,
                victim,
                killer,
                weapon: raw.weapon,
                event_text: raw.event_text,
                distance: raw.distance,
            })
            .await?;
        Ok(String::new())
    }

    async fn hit(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::Hit;
        let raw = parsed(command, parser::parse_hit(args))?;
        let (victim, shooter) = self.classify_combat(command, &raw).await?;

        self.backend
            .record_hit_event(HitEvent {
                capture_frame: raw.capture_frame,
                victim,
                shooter,
                weapon: raw.weapon,
                event_text: raw.event_text,
                distance: raw.distance,
            })
            .await?;
        Ok(String::new())
    }

    /// The victim must resolve; an unknown attacker is recorded as `None`.
    async fn classify_combat(
        &self,
        command: Command,
        raw: &RawCombatEvent,
    ) -> Result<(EntityRef, Option<EntityRef>), WorkerError> {
        let victim = self
            .entities
            .classify(raw.victim_id)
            .await
            .ok_or_else(|| WorkerError::missing(command.tag(), "victim", raw.victim_id))?;

        let attacker = self.entities.classify(raw.attacker_id).await;
        if attacker.is_none() {
            tracing::warn!(
                command = %command,
                id = raw.attacker_id,
                "Attacker not registered, recording without attacker"
            );
        }

        Ok((victim, attacker))
    }

    async fn fired(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::Fired;
        let event = parsed(command, parser::parse_fired(args))?;
        self.require_soldier(command, event.soldier_id).await?;
        self.backend.record_fired_event(event).await?;
        Ok(String::new())
    }

    // ---- events ----

    async fn general_event(&self, args: &[String]) -> Result<String, WorkerError> {
        let event = parsed(Command::Event, parser::parse_general_event(args))?;
        self.backend.record_general_event(event).await?;
        Ok(String::new())
    }

    async fn chat(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::Chat;
        let event = parsed(command, parser::parse_chat(args))?;
        if let Some(sender) = event.sender_id {
            self.require_soldier(command, sender).await?;
        }
        self.backend.record_chat_event(event).await?;
        Ok(String::new())
    }

    async fn radio(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::Radio;
        let event = parsed(command, parser::parse_radio(args))?;
        if let Some(sender) = event.sender_id {
            self.require_soldier(command, sender).await?;
        }
        self.backend.record_radio_event(event).await?;
        Ok(String::new())
    }

    async fn fps(&self, args: &[String]) -> Result<String, WorkerError> {
        let event = parsed(Command::Fps, parser::parse_fps(args))?;
        self.backend.record_server_fps_event(event).await?;
        Ok(String::new())
    }

    async fn ace3_death(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::Ace3Death;
        let raw = parsed(command, parser::parse_ace3_death(args))?;
        self.require_soldier(command, raw.soldier_id).await?;

        let last_damage_source = match raw.last_damage_source_id {
            None => None,
            Some(id) => {
                let source = self.entities.classify(id).await;
                if source.is_none() {
                    tracing::warn!(
                        command = %command,
                        id,
                        "Damage source not registered, recording without it"
                    );
                }
                source
            }
        };

        self.backend
            .record_ace3_death_event(Ace3DeathEvent {
                capture_frame: raw.capture_frame,
                soldier_id: raw.soldier_id,
                reason: raw.reason,
                last_damage_source,
            })
            .await?;
        Ok(String::new())
    }

    async fn ace3_unconscious(&self, args: &[String]) -> Result<String, WorkerError> {
        let command = Command::Ace3Unconscious;
        let event = parsed(command, parser::parse_ace3_unconscious(args))?;
        self.require_soldier(command, event.soldier_id).await?;
        self.backend.record_ace3_unconscious_event(event).await?;
        Ok(String::new())
    }

    // ---- private helpers ----

    async fn require_soldier(&self, command: Command, id: ObjectId) -> Result<(), WorkerError> {
        if self.entities.has_soldier(id).await {
            Ok(())
        } else {
            Err(WorkerError::missing(command.tag(), "soldier", id))
        }
    }

    async fn require_vehicle(&self, command: Command, id: ObjectId) -> Result<(), WorkerError> {
        if self.entities.has_vehicle(id).await {
            Ok(())
        } else {
            Err(WorkerError::missing(command.tag(), "vehicle", id))
        }
    }
}

fn parsed<T>(command: Command, result: Result<T, ParseError>) -> Result<T, WorkerError> {
    result.map_err(|source| WorkerError::Parse {
        command: command.tag(),
        source,
    })
}

/// Arguments as logged: long blobs are cut and annotated with their length.
pub(crate) fn preview_args(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let len = arg.chars().count();
            if len > ARG_PREVIEW_LIMIT {
                let head: String = arg.chars().take(ARG_PREVIEW_LIMIT).collect();
                format!("{head}... ({len} chars)")
            } else {
                arg.clone()
            }
        })
        .collect()
}
