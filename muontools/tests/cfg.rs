use muontools::cfg::{Analysis, DecayConfig, VelocityConfig};
use muontools::Channel;
use std::path::PathBuf;

mod common;

fn serialize_config(config: &Analysis) -> String {
    let ser = serde_json::to_string(config).unwrap();
    return ser;
}

fn deserialize_config(config: &str) -> Analysis {
    let de: Analysis = serde_json::from_str(config).unwrap();
    return de;
}

#[test]
fn serde_roundtrip() {
    let config = Analysis {
        name: String::from("test_settings_serde"),
        velocity: Some(VelocityConfig {
            upper: Channel::Ch2,
            lower: Channel::Ch3,
        }),
        decay: Some(DecayConfig {
            veto: None,
            min_decay_time: 400.0,
            ..DecayConfig::default()
        }),
        pulse_file: Some(PathBuf::from("pulses.tsv")),
        write_pulses: true,
    };
    let serconfig = serialize_config(&config);
    let deconfig = deserialize_config(&serconfig);
    assert_eq!(config, deconfig);
}

#[test]
fn defaults_fill_gaps() {
    let config = deserialize_config(r#"{ "velocity": {}, "decay": { "single": "Ch0" } }"#);
    assert_eq!("", config.name);
    assert_eq!(Some(VelocityConfig { upper: Channel::Ch0, lower: Channel::Ch1 }), config.velocity);
    let decay = config.decay.unwrap();
    assert_eq!(Channel::Ch0, decay.single);
    assert_eq!(Channel::Ch2, decay.double);
    assert_eq!(Some(Channel::Ch3), decay.veto);
    assert_eq!(12000.0, decay.max_double_pulse_width);
    assert_eq!(None, config.pulse_file);
    assert!(!config.write_pulses);
}

#[test]
fn empty_config_has_no_triggers() {
    let config = deserialize_config("{}");
    assert_eq!(Analysis::default(), config);
    assert!(config.velocity_trigger().is_none());
    assert!(config.decay_trigger().is_none());
}

#[test]
fn load_file() {
    let config = Analysis::load(common::resource("analysis.json")).unwrap();
    assert_eq!("rooftop", config.name);
    assert!(config.velocity_trigger().is_some());
    assert_eq!(None, config.decay.unwrap().veto);
    assert!(Analysis::load(common::resource("missing.json")).is_err());
    assert!(Analysis::load(common::resource("session.txt")).is_err());
}
