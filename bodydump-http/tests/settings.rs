use bodydump_http::settings::{FilterSettings, HeaderSettings, OneOrMany};
use bodydump_http::{ConfigError, DumpPlan, DumpSettings};
use http::Request;
use http::request::Parts;
use pretty_assertions::assert_eq;

fn parts(method: &str, path: &str) -> Parts {
    Request::builder()
        .method(method)
        .uri(path)
        .body(())
        .unwrap()
        .into_parts()
        .0
}

#[test]
fn test_deserialize_full_settings() {
    let yaml = r#"
request: true
response: false
skip:
  - Path: "/health"
  - Path:
      in:
        - "/static/{tail}*"
        - "/favicon.ico"
  - Method: OPTIONS
  - Header:
      name: x-no-dump
pool:
  buffer_capacity: 16384
  max_idle: 64
"#;
    let settings: DumpSettings = serde_saphyr::from_str(yaml).expect("failed to deserialize");

    assert!(settings.request);
    assert!(!settings.response);
    assert_eq!(settings.pool.buffer_capacity, 16384);
    assert_eq!(settings.pool.max_idle, 64);
    assert_eq!(
        settings.skip,
        vec![
            FilterSettings::Path(OneOrMany::One("/health".to_string())),
            FilterSettings::Path(OneOrMany::In {
                r#in: vec!["/static/{tail}*".to_string(), "/favicon.ico".to_string()],
            }),
            FilterSettings::Method(OneOrMany::One("OPTIONS".to_string())),
            FilterSettings::Header(HeaderSettings {
                name: "x-no-dump".to_string(),
                value: None,
            }),
        ]
    );
}

#[test]
fn test_empty_document_uses_defaults() {
    let settings: DumpSettings = serde_saphyr::from_str("{}").expect("failed to deserialize");
    assert_eq!(settings, DumpSettings::default());
    assert!(settings.request);
    assert!(settings.response);
}

#[test]
fn test_settings_build_working_filters() {
    let yaml = r#"
skip:
  - Path:
      in:
        - "/static/{tail}*"
        - "/health"
  - Method: OPTIONS
  - Header:
      name: content-type
      value: multipart/form-data
"#;
    let settings: DumpSettings = serde_saphyr::from_str(yaml).expect("failed to deserialize");
    let config = settings
        .into_config_builder()
        .expect("valid settings")
        .on_request(|_, _| {})
        .build();

    assert_eq!(config.filters().len(), 3);
    assert_eq!(config.plan(&parts("GET", "/health")), DumpPlan::Filtered);
    assert_eq!(
        config.plan(&parts("GET", "/static/css/site.css")),
        DumpPlan::Filtered
    );
    assert_eq!(config.plan(&parts("OPTIONS", "/api")), DumpPlan::Filtered);

    let (multipart, _) = Request::post("/upload")
        .header("content-type", "multipart/form-data")
        .body(())
        .unwrap()
        .into_parts();
    assert_eq!(config.plan(&multipart), DumpPlan::Filtered);

    assert_eq!(
        config.plan(&parts("POST", "/api")),
        DumpPlan::Capture {
            request: true,
            response: false
        }
    );
}

#[test]
fn test_toggle_off_in_settings_wins_over_callback() {
    let settings: DumpSettings =
        serde_saphyr::from_str("request: false").expect("failed to deserialize");
    let config = settings
        .into_config_builder()
        .expect("valid settings")
        .on_request(|_, _| {})
        .build();

    assert!(config.is_bypass());
    assert_eq!(config.plan(&parts("POST", "/api")), DumpPlan::Bypass);
}

#[test]
fn test_pool_settings_are_applied() {
    let settings: DumpSettings =
        serde_saphyr::from_str("pool:\n  buffer_capacity: 1024\n  max_idle: 2\n")
            .expect("failed to deserialize");
    let config = settings.into_config_builder().unwrap().build();

    assert_eq!(config.pool().settings().buffer_capacity, 1024);
    assert_eq!(config.pool().settings().max_idle, 2);
}

#[test]
fn test_invalid_method_is_rejected() {
    let settings = DumpSettings {
        skip: vec![FilterSettings::Method(OneOrMany::One("GE T".to_string()))],
        ..DumpSettings::default()
    };
    let error = settings.into_config_builder().unwrap_err();
    assert!(matches!(error, ConfigError::InvalidMethod(ref method) if method == "GE T"));
}

#[test]
fn test_invalid_header_name_is_rejected() {
    let settings = DumpSettings {
        skip: vec![FilterSettings::Header(HeaderSettings {
            name: "bad header".to_string(),
            value: None,
        })],
        ..DumpSettings::default()
    };
    let error = settings.into_config_builder().unwrap_err();
    assert!(matches!(error, ConfigError::InvalidHeaderName(_)));
    assert_eq!(error.to_string(), "invalid header name: bad header");
}

#[test]
fn test_invalid_header_value_is_rejected() {
    let settings = DumpSettings {
        skip: vec![FilterSettings::Header(HeaderSettings {
            name: "x-trace".to_string(),
            value: Some("line\nbreak".to_string()),
        })],
        ..DumpSettings::default()
    };
    assert!(matches!(
        settings.into_config_builder().unwrap_err(),
        ConfigError::InvalidHeaderValue { .. }
    ));
}

#[test]
fn test_empty_list_is_rejected() {
    let settings = DumpSettings {
        skip: vec![FilterSettings::Path(OneOrMany::In { r#in: Vec::new() })],
        ..DumpSettings::default()
    };
    assert!(matches!(
        settings.into_config_builder().unwrap_err(),
        ConfigError::EmptyList("Path")
    ));
}

#[test]
fn test_malformed_path_pattern_is_rejected() {
    let yaml = r#"
skip:
  - Path: "/users/{id"
"#;
    let settings: DumpSettings = serde_saphyr::from_str(yaml).unwrap();
    let error = settings.into_config_builder().unwrap_err();

    assert!(matches!(
        error,
        ConfigError::InvalidPath { ref pattern, .. } if pattern == "/users/{id"
    ));
}

#[test]
fn test_path_list_with_one_bad_regex_is_rejected() {
    let settings = DumpSettings {
        skip: vec![FilterSettings::Path(OneOrMany::In {
            r#in: vec!["/health".to_string(), "/items/{id:(}".to_string()],
        })],
        ..DumpSettings::default()
    };

    assert!(matches!(
        settings.into_config_builder().unwrap_err(),
        ConfigError::InvalidPath { ref pattern, .. } if pattern == "/items/{id:(}"
    ));
}
