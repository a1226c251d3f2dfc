//! Integration tests for mailit-config

use mailit_config::*;
use std::io::Write;

fn write_settings(ext: &str, body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{}", ext))
        .tempfile()
        .unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn test_settings_from_toml_file() {
    let file = write_settings(
        "toml",
        r#"
            api_key = "toml-key"
            default_template = "base"
            site_name = "Example"
            site_domain = "example.org"
            admins = [["Ops", "ops@example.org"]]
            smtp_port = 587
            smtp_security = "starttls"
        "#,
    );

    let settings = MailSettings::from_file(file.path()).unwrap();

    assert_eq!(settings.default_template.as_deref(), Some("base"));
    assert_eq!(settings.site(), Site::new("Example", "example.org"));
    assert_eq!(settings.admin_emails(), vec!["ops@example.org"]);
    assert_eq!(settings.smtp_port, 587);
}

#[test]
fn test_settings_from_json_file() {
    let file = write_settings(
        "json",
        r#"{"api_key": "json-key", "managers": "a@example.org, B <b@example.org>"}"#,
    );

    let settings = MailSettings::from_file(file.path()).unwrap();

    assert_eq!(settings.manager_emails(), vec!["a@example.org", "b@example.org"]);
}

#[test]
fn test_settings_file_missing_api_key() {
    let file = write_settings("json", r#"{"site_domain": "example.org"}"#);

    let err = MailSettings::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed(_)));
}

#[test]
fn test_settings_file_unknown_extension() {
    let file = write_settings("yaml", "api_key: nope");

    assert!(matches!(
        MailSettings::from_file(file.path()),
        Err(ConfigError::Load(_))
    ));
}

#[test]
fn test_env_file_layering() {
    let file = write_settings("env", "API_KEY=from-file\nSITE_NAME=\"Env Site\"\n");

    let overrides = write_settings("json", r#"{"api_key": "override"}"#);

    let manager = ConfigManager::new();
    manager.load_file(file.path(), FileFormat::Env).unwrap();
    manager.load_file(overrides.path(), FileFormat::Json).unwrap();

    let settings: MailSettings = manager.load_validated().unwrap();
    assert_eq!(settings.api_key, "override");
    assert_eq!(settings.site_name, "Env Site");
}

#[test]
fn test_settings_file_invalid_sender() {
    let file = write_settings("toml", r#"
        api_key = "k"
        default_from_email = "nobody"
    "#);

    let err = MailSettings::from_file(file.path()).unwrap_err();
    assert_eq!(err.field(), Some("default_from_email"));
    assert!(err.to_string().contains("nobody"));
}
