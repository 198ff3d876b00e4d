use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use textframe_auth::{
    ClientConfig, ConfigError, ENV_API_URL, ENV_STORE_PATH, ENV_TIMEOUT_SECS,
};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults() {
    let cfg = ClientConfig::default();
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:8000");
    assert_eq!(cfg.store_path, None);
    assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    assert!(cfg.validate().is_ok());
}

#[test]
fn lookup_overrides() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        (ENV_API_URL, "https://api.example.com/"),
        (ENV_STORE_PATH, "/tmp/textframe/keys.json"),
        (ENV_TIMEOUT_SECS, "5"),
    ]))
    .unwrap();

    assert_eq!(cfg.api_base_url, "https://api.example.com/");
    assert_eq!(cfg.store_path, Some(PathBuf::from("/tmp/textframe/keys.json")));
    assert_eq!(cfg.request_timeout_secs, 5);
    assert_eq!(
        cfg.resolved_store_path().unwrap(),
        PathBuf::from("/tmp/textframe/keys.json")
    );
}

#[test]
fn empty_lookup_is_default() {
    let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, ClientConfig::default());
}

#[test]
fn invalid_timeout_is_rejected() {
    let err = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { name, .. } if name == ENV_TIMEOUT_SECS));

    let err = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn invalid_urls_are_rejected() {
    for url in ["", "api.example.com", "ftp://example.com", "https://", "http:///"] {
        let cfg = ClientConfig::with_api_base_url(url);
        assert!(
            matches!(cfg.validate(), Err(ConfigError::InvalidUrl(_))),
            "{url:?} should be rejected"
        );
    }
}

#[test]
fn endpoint_joins_without_double_slash() {
    let cfg = ClientConfig::with_api_base_url("https://api.example.com/");
    assert_eq!(cfg.endpoint("/get_nonce"), "https://api.example.com/get_nonce");
    assert_eq!(cfg.endpoint("search"), "https://api.example.com/search");

    let cfg = ClientConfig::with_api_base_url("http://localhost:8000/v1");
    assert_eq!(cfg.endpoint("/register_public_key"), "http://localhost:8000/v1/register_public_key");
}

#[test]
fn serde_fills_missing_fields() {
    let cfg: ClientConfig =
        serde_json::from_str(r#"{"api_base_url":"https://api.example.com"}"#).unwrap();
    assert_eq!(cfg.api_base_url, "https://api.example.com");
    assert_eq!(cfg.request_timeout_secs, 30);
}
