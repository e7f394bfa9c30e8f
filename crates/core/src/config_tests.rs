// SPDX-License-Identifier: MIT

use super::test_support::MapConfigLoader;
use super::*;

#[test]
fn require_str_missing_is_error() {
    let cfg = ConfigMap::new();
    assert!(matches!(
        cfg.require_str("Threads"),
        Err(ConfigError::MissingKey(k)) if k == "Threads"
    ));
}

#[test]
fn typed_getters_round_trip() {
    let mut cfg = ConfigMap::new();
    cfg.insert("Threads", "4").insert("Priority", "-1").insert("Start", "true");
    assert_eq!(cfg.require_u64("Threads").unwrap(), 4);
    assert_eq!(cfg.get_i64("Priority").unwrap(), Some(-1));
    assert_eq!(cfg.get_bool("Start").unwrap(), Some(true));
}

#[test]
fn invalid_value_is_error() {
    let mut cfg = ConfigMap::new();
    cfg.insert("Threads", "not-a-number");
    assert!(matches!(
        cfg.get_u64("Threads"),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn map_config_loader_round_trips() {
    let loader = MapConfigLoader::new().with("pool", "Threads=4");
    assert_eq!(loader.load("pool", "mem://config").as_deref(), Some("Threads=4"));
    assert_eq!(loader.load("missing", "mem://config"), None);
}
