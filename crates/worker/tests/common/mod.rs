#![allow(dead_code)]

use std::path::Path;

use ocap_worker::{Recorder, RecorderConfig};

pub const WORLD_JSON: &str = r#"{"worldName":"Altis","displayName":"Altis","worldSize":30720,"latitude":-40.0,"longitude":30.0,"author":"Bohemia Interactive","workshopID":0}"#;

pub const MISSION_JSON: &str = r#"{"missionName":"Op Thunder","missionNameSource":"file","briefingName":"Thunder","serverName":"Test Server","serverProfile":"server","onLoadName":"Loading","author":"Zeus","tag":"COOP","captureDelay":1.0,"addons":[["ace","463939057"]],"playableSlots":[10,10,5,0,2],"sideFriendly":[false,false,true]}"#;

pub fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Recorder writing uncompressed artifacts under `dir`.
pub async fn recorder(dir: &Path) -> Recorder {
    let config = RecorderConfig {
        output_dir: dir.to_path_buf(),
        compress_output: false,
        extension_version: "5.0.0-test".to_string(),
        extension_build: "test-build".to_string(),
        ..RecorderConfig::default()
    };
    Recorder::start(config).await.expect("recorder should start")
}

/// Recorder with a mission already started.
pub async fn recording(dir: &Path) -> Recorder {
    let recorder = recorder(dir).await;
    let response = recorder
        .dispatch(":NEW:MISSION:", args(&[WORLD_JSON, MISSION_JSON]))
        .await
        .expect("mission should start");
    assert_eq!(response, "ok");
    recorder
}

pub fn soldier_args(id: u16, group: &str) -> Vec<String> {
    let id = id.to_string();
    args(&[
        "0", &id, "Alpha", group, "WEST", "true", "Rifleman", "O_F", "Rifle", "", "\"[]\"",
    ])
}

pub fn vehicle_args(id: u16) -> Vec<String> {
    let id = id.to_string();
    args(&["0", &id, "car", "Hunter", "B_MRAP_01_F", "[]"])
}

/// Short-form soldier state (no group or side).
pub fn soldier_state_args(id: u16, frame: u32) -> Vec<String> {
    let id = id.to_string();
    let frame = frame.to_string();
    args(&[
        &id,
        "[100,200,10]",
        "90",
        "1",
        "false",
        "Alpha",
        "true",
        "rifle",
        &frame,
        "true",
        "false",
        "1,2,3,4,5,100",
        "",
        "-1",
        "STAND",
    ])
}

pub fn vehicle_state_args(id: u16, frame: u32) -> Vec<String> {
    let id = id.to_string();
    let frame = frame.to_string();
    args(&[
        &id,
        "[10,20,0]",
        "180",
        "true",
        "[[1,\"driver\"]]",
        &frame,
        "0.8",
        "0.1",
        "true",
        "false",
        "WEST",
        "[0,1,0]",
        "[0,0,1]",
        "0",
        "0",
    ])
}

pub fn marker_args(name: &str, frame: u32) -> Vec<String> {
    let frame = frame.to_string();
    args(&[
        name,
        "0",
        "mil_dot",
        "Alpha",
        &frame,
        "-1",
        "0",
        "#800000",
        "[1,1]",
        "WEST",
        "[1,2,0]",
        "ICON",
        "1",
        "Solid",
    ])
}

/// Drain every queue so buffered records are visible in the backend.
pub async fn settle(recorder: &Recorder) {
    recorder.shutdown().await.expect("shutdown should succeed");
}
