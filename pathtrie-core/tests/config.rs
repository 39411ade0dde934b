use std::collections::HashMap;

use pathtrie_core::{RegistrationPolicy, ServerConfig};

#[test]
fn defaults() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.addr(), "127.0.0.1:8000");
    assert_eq!(cfg.policy, RegistrationPolicy::Lenient);
}

#[test]
fn env_overrides_defaults() {
    let env: HashMap<&str, &str> =
        [("HOST", "0.0.0.0"), ("PORT", "9000"), ("PATHTRIE_POLICY", "strict")].into();
    let cfg = ServerConfig::default()
        .apply_env(|k| env.get(k).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(cfg.addr(), "0.0.0.0:9000");
    assert_eq!(cfg.policy, RegistrationPolicy::Strict);
}

#[test]
fn missing_env_keeps_defaults() {
    let cfg = ServerConfig::default().apply_env(|_| None).unwrap();
    assert_eq!(cfg, ServerConfig::default());
}

#[test]
fn bad_env_values_are_errors() {
    assert!(ServerConfig::default()
        .apply_env(|k| (k == "PORT").then(|| "99999".to_string()))
        .is_err());
    assert!(ServerConfig::default()
        .apply_env(|k| (k == "PATHTRIE_POLICY").then(|| "loose".to_string()))
        .is_err());
}
