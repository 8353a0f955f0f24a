// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use pretty_assertions::assert_eq;
use validator_system::config::Config;
use validator_system::genesis::GenesisConfig;
use validator_system::SystemStateTrait;

#[test]
fn genesis_config_survives_a_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genesis.yaml");
    let config = GenesisConfig::generate(4, 11);
    config.save(&path).unwrap();

    let loaded = GenesisConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let state = loaded.build().unwrap().system_state;
    assert_eq!(state.active_validator_addresses().len(), 4);
    assert_eq!(
        state.to_bytes().unwrap(),
        config.build().unwrap().system_state.to_bytes().unwrap()
    );
}

#[test]
fn config_uses_kebab_case_keys() {
    let yaml = serde_yaml::to_string(&GenesisConfig::generate(1, 0)).unwrap();
    assert!(yaml.contains("max-committee-size"));
    assert!(yaml.contains("storage-fund-amount"));
    assert!(yaml.contains("authority-pubkey-bytes"));
}

#[test]
fn missing_config_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = GenesisConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.yaml"));
}
