//! The fixed set of command tags and how each one is dispatched.

use std::fmt;

use ocap_events::Discipline;

use crate::config::RecorderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Version,
    AddonVersion,
    NewMission,
    Save,
    NewSoldier,
    NewVehicle,
    NewMarker,
    SoldierState,
    VehicleState,
    MarkerState,
    TimeState,
    Projectile,
    Kill,
    Hit,
    Fired,
    Event,
    Chat,
    Radio,
    Fps,
    Ace3Death,
    Ace3Unconscious,
    DeleteMarker,
}

impl Command {
    pub const ALL: [Command; 22] = [
        Command::Version,
        Command::AddonVersion,
        Command::NewMission,
        Command::Save,
        Command::NewSoldier,
        Command::NewVehicle,
        Command::NewMarker,
        Command::SoldierState,
        Command::VehicleState,
        Command::MarkerState,
        Command::TimeState,
        Command::Projectile,
        Command::Kill,
        Command::Hit,
        Command::Fired,
        Command::Event,
        Command::Chat,
        Command::Radio,
        Command::Fps,
        Command::Ace3Death,
        Command::Ace3Unconscious,
        Command::DeleteMarker,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Version => ":VERSION:",
            Self::AddonVersion => ":ADDON:VERSION:",
            Self::NewMission => ":NEW:MISSION:",
            Self::Save => ":SAVE:",
            Self::NewSoldier => ":NEW:SOLDIER:",
            Self::NewVehicle => ":NEW:VEHICLE:",
            Self::NewMarker => ":NEW:MARKER:",
            Self::SoldierState => ":NEW:SOLDIER:STATE:",
            Self::VehicleState => ":NEW:VEHICLE:STATE:",
            Self::MarkerState => ":NEW:MARKER:STATE:",
            Self::TimeState => ":NEW:TIME:STATE:",
            Self::Projectile => ":PROJECTILE:",
            Self::Kill => ":KILL:",
            Self::Hit => ":HIT:",
            Self::Fired => ":FIRED:",
            Self::Event => ":EVENT:",
            Self::Chat => ":CHAT:",
            Self::Radio => ":RADIO:",
            Self::Fps => ":FPS:",
            Self::Ace3Death => ":ACE3:DEATH:",
            Self::Ace3Unconscious => ":ACE3:UNCONSCIOUS:",
            Self::DeleteMarker => ":DELETE:MARKER:",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }

    /// Registrations and lifecycle commands run on the caller's task so the
    /// next dispatch already sees their effect. Everything else is queued.
    pub fn discipline(self, config: &RecorderConfig) -> Discipline {
        match self {
            Self::Version
            | Self::AddonVersion
            | Self::NewMission
            | Self::Save
            | Self::NewSoldier
            | Self::NewVehicle
            | Self::NewMarker => Discipline::Sync,

            Self::SoldierState
            | Self::VehicleState
            | Self::MarkerState
            | Self::TimeState
            | Self::Projectile => Discipline::blocking(config.state_queue_depth),

            Self::Fps if config.drop_telemetry => Discipline::dropping(config.event_queue_depth),

            Self::Kill
            | Self::Hit
            | Self::Fired
            | Self::Event
            | Self::Chat
            | Self::Radio
            | Self::Fps
            | Self::Ace3Death
            | Self::Ace3Unconscious => Discipline::blocking(config.event_queue_depth),

            Self::DeleteMarker => Discipline::blocking(config.delete_queue_depth),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
