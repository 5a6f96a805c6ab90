use crate::error::ParseError;
use crate::model::{
    Ace3UnconsciousEvent, ChatChannel, ChatEvent, GeneralEvent, RadioEvent, RawAce3DeathEvent,
    ServerFpsEvent, TimeState,
};
use crate::wire::{
    clean_args, parse_bool, parse_f32, parse_frame, parse_int, parse_object_id,
    parse_optional_object_id, require_fields,
};

/// `:CHAT:` [frame, senderId, channel, fromName, senderName, message, playerUID].
pub fn parse_chat(args: &[String]) -> Result<ChatEvent, ParseError> {
    require_fields(args, 7)?;
    let data = clean_args(args);

    Ok(ChatEvent {
        capture_frame: parse_frame(&data[0])?,
        sender_id: parse_optional_object_id("senderId", &data[1])?,
        channel: ChatChannel::from_index(parse_int("channel", &data[2])?),
        from_name: data[3].clone(),
        sender_name: data[4].clone(),
        message: data[5].clone(),
        player_uid: data[6].clone(),
    })
}

/// `:RADIO:` [frame, senderId, radio, radioType, startEnd, channel,
/// isAdditional, frequency, code].
pub fn parse_radio(args: &[String]) -> Result<RadioEvent, ParseError> {
    require_fields(args, 9)?;
    let data = clean_args(args);

    let channel = parse_int("channel", &data[5])?;
    let channel = i8::try_from(channel).map_err(|_| ParseError::InvalidNumber {
        field: "channel",
        value: data[5].clone(),
    })?;

    Ok(RadioEvent {
        capture_frame: parse_frame(&data[0])?,
        sender_id: parse_optional_object_id("senderId", &data[1])?,
        radio: data[2].clone(),
        radio_type: data[3].clone(),
        start_end: data[4].clone(),
        channel,
        is_additional: parse_bool("isAdditional", &data[6])?,
        frequency: parse_f32("frequency", &data[7])?,
        code: data[8].clone(),
    })
}

/// `:EVENT:` [frame, name, message, optional extraData JSON].
pub fn parse_general_event(args: &[String]) -> Result<GeneralEvent, ParseError> {
    require_fields(args, 3)?;
    let data = clean_args(args);

    let extra_data = match data.get(3) {
        Some(raw) => Some(serde_json::from_str(raw).map_err(|source| {
            ParseError::InvalidJson {
                field: "extraData",
                source,
            }
        })?),
        None => None,
    };

    Ok(GeneralEvent {
        capture_frame: parse_frame(&data[0])?,
        name: data[1].clone(),
        message: data[2].clone(),
        extra_data,
    })
}

/// `:FPS:` [frame, fpsAverage, fpsMin].
pub fn parse_fps(args: &[String]) -> Result<ServerFpsEvent, ParseError> {
    require_fields(args, 3)?;
    let data = clean_args(args);

    Ok(ServerFpsEvent {
        capture_frame: parse_frame(&data[0])?,
        fps_average: parse_f32("fpsAverage", &data[1])?,
        fps_min: parse_f32("fpsMin", &data[2])?,
    })
}

/// `:NEW:TIME:STATE:` [frame, systemTimeUTC, missionDateTime, timeMultiplier, missionTime].
pub fn parse_time_state(args: &[String]) -> Result<TimeState, ParseError> {
    require_fields(args, 5)?;
    let data = clean_args(args);

    Ok(TimeState {
        capture_frame: parse_frame(&data[0])?,
        system_time_utc: data[1].clone(),
        mission_date: data[2].clone(),
        time_multiplier: parse_f32("timeMultiplier", &data[3])?,
        mission_time: parse_f32("missionTime", &data[4])?,
    })
}

/// `:ACE3:DEATH:` [frame, soldierId, reason, lastDamageSourceId or -1].
pub fn parse_ace3_death(args: &[String]) -> Result<RawAce3DeathEvent, ParseError> {
    require_fields(args, 4)?;
    let data = clean_args(args);

    Ok(RawAce3DeathEvent {
        capture_frame: parse_frame(&data[0])?,
        soldier_id: parse_object_id("soldierId", &data[1])?,
        reason: data[2].clone(),
        last_damage_source_id: parse_optional_object_id("lastDamageSourceId", &data[3])?,
    })
}

/// `:ACE3:UNCONSCIOUS:` [frame, soldierId, isUnconscious].
pub fn parse_ace3_unconscious(args: &[String]) -> Result<Ace3UnconsciousEvent, ParseError> {
    require_fields(args, 3)?;
    let data = clean_args(args);

    Ok(Ace3UnconsciousEvent {
        capture_frame: parse_frame(&data[0])?,
        soldier_id: parse_object_id("soldierId", &data[1])?,
        is_unconscious: parse_bool("isUnconscious", &data[2])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::args;
    use assert_matches::assert_matches;

    #[test]
    fn chat_custom_channel_and_system_sender() {
        let ev = parse_chat(&args(&["12", "-1", "10", "", "", "hello", ""])).unwrap();
        assert_eq!(ev.channel, ChatChannel::Custom);
        assert_eq!(ev.sender_id, None);
        assert_eq!(ev.message, "hello");
    }

    #[test]
    fn chat_named_channels() {
        let ev = parse_chat(&args(&["1", "4", "1.0", "Bob", "Bob", "hi", "765611"])).unwrap();
        assert_eq!(ev.channel, ChatChannel::Side);
        assert_eq!(ev.sender_id, Some(4));

        let ev = parse_chat(&args(&["1", "4", "42", "", "", "", ""])).unwrap();
        assert_eq!(ev.channel, ChatChannel::System);
    }

    #[test]
    fn radio_event() {
        let ev = parse_radio(&args(&[
            "50", "3", "ACRE_PRC152", "SW", "start", "2", "false", "43.1", "",
        ]))
        .unwrap();
        assert_eq!(ev.sender_id, Some(3));
        assert_eq!(ev.channel, 2);
        assert!(!ev.is_additional);
        assert!((ev.frequency - 43.1).abs() < 1e-4);
    }

    #[test]
    fn radio_channel_out_of_range() {
        assert_matches!(
            parse_radio(&args(&["1", "3", "r", "SW", "start", "300", "false", "1", ""])),
            Err(ParseError::InvalidNumber { field: "channel", .. })
        );
    }

    #[test]
    fn general_event_extra_data() {
        let ev = parse_general_event(&args(&[
            "9",
            "connected",
            "Bob",
            r#"{""uid"":""765611""}"#,
        ]))
        .unwrap();
        assert_eq!(ev.name, "connected");
        assert_eq!(ev.extra_data, Some(serde_json::json!({"uid": "765611"})));

        let ev = parse_general_event(&args(&["9", "endMission", "BLUFOR wins"])).unwrap();
        assert_eq!(ev.extra_data, None);

        assert_matches!(
            parse_general_event(&args(&["9", "x", "y", "{"])),
            Err(ParseError::InvalidJson { field: "extraData", .. })
        );
    }

    #[test]
    fn fps_and_time_state() {
        let fps = parse_fps(&args(&["30", "48.5", "22"])).unwrap();
        assert_eq!(fps.capture_frame, 30);
        assert_eq!(fps.fps_min, 22.0);

        let ts = parse_time_state(&args(&[
            "30",
            "2035-06-01T12:00:00.000Z",
            "2035-06-01T06:00:00",
            "1",
            "60.5",
        ]))
        .unwrap();
        assert_eq!(ts.mission_time, 60.5);
        assert_eq!(ts.mission_date, "2035-06-01T06:00:00");
        assert_matches!(
            parse_time_state(&args(&["30", "", "", "fast", "1"])),
            Err(ParseError::InvalidNumber { field: "timeMultiplier", .. })
        );
    }

    #[test]
    fn ace3_events() {
        let d = parse_ace3_death(&args(&["70", "5", "bleedout", "-1"])).unwrap();
        assert_eq!(d.soldier_id, 5);
        assert_eq!(d.last_damage_source_id, None);
        let d = parse_ace3_death(&args(&["70", "5", "shot", "9"])).unwrap();
        assert_eq!(d.last_damage_source_id, Some(9));

        let u = parse_ace3_unconscious(&args(&["71", "5", "true"])).unwrap();
        assert!(u.is_unconscious);
        assert_matches!(
            parse_ace3_unconscious(&args(&["71", "5", "maybe"])),
            Err(ParseError::InvalidBool { .. })
        );
    }
}
