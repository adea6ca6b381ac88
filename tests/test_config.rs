use devproxy::config::Config;

#[test]
fn test_default_listen_address() {
    let cfg = Config::default();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5173");
}

#[test]
fn test_default_origin_without_override() {
    // No override: the resolved target is exactly the local default
    let mut cfg = Config::default();
    cfg.apply_origin_override(None);
    assert_eq!(cfg.upstream.origin, "http://localhost:8002");
}

#[test]
fn test_origin_override_applied() {
    let mut cfg = Config::default();
    cfg.apply_origin_override(Some("https://backend.example.com"));
    assert_eq!(cfg.upstream.origin, "https://backend.example.com");
}

#[test]
fn test_empty_override_keeps_default() {
    let mut cfg = Config::default();
    cfg.apply_origin_override(Some(""));
    assert_eq!(cfg.upstream.origin, "http://localhost:8002");

    cfg.apply_origin_override(Some("   "));
    assert_eq!(cfg.upstream.origin, "http://localhost:8002");
}

#[test]
fn test_default_route_prefixes() {
    let cfg = Config::default();
    assert_eq!(cfg.upstream.routes, vec!["/api", "/admin", "/auth", "/media"]);
}

#[test]
fn test_default_config_validates() {
    let cfg = Config::default();
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_validate_rejects_overlapping_prefixes() {
    let mut cfg = Config::default();
    cfg.upstream.routes = vec!["/api".to_string(), "/api/v2".to_string()];
    assert!(cfg.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_origin() {
    let mut cfg = Config::default();
    cfg.upstream.origin = "not a url".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_listen_addr() {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "nowhere".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_yaml_config_parsing() {
    let yaml = r#"
server:
  listen_addr: "127.0.0.1:4000"
upstream:
  origin: "http://localhost:9000"
  routes: ["/api", "/auth"]
static_files:
  root: "public"
  index: "index.html"
  spa_fallback: false
resolve:
  alias:
    - symbol: "@"
      path: "./src"
"#;

    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:4000");
    assert_eq!(cfg.upstream.origin, "http://localhost:9000");
    assert_eq!(cfg.upstream.routes, vec!["/api", "/auth"]);
    assert_eq!(cfg.static_files.root.to_str().unwrap(), "public");
    assert!(!cfg.static_files.spa_fallback);
    assert_eq!(cfg.resolve.alias.len(), 1);
    assert_eq!(cfg.resolve.alias[0].symbol, "@");
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_partial_yaml_falls_back_to_defaults() {
    let yaml = r#"
upstream:
  origin: "http://localhost:9000"
"#;

    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5173");
    assert_eq!(cfg.upstream.origin, "http://localhost:9000");
    assert_eq!(cfg.upstream.routes, vec!["/api", "/admin", "/auth", "/media"]);
}
