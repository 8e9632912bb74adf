use std::io::Write;

use s3conf::harness::{CONFIG_ENV, HarnessError, S3TestConfig};
use s3conf::{Document, ParseError, ParseMode};
use tempfile::NamedTempFile;

const CONFIG: &str = "\
[DEFAULT]
host = localhost
port = 8000
is_secure = no

[s3 main]
display_name = main
email = main@example.com
access_key = {{ MAIN_ACCESS_KEY }}
secret_key = {{ MAIN_SECRET_KEY }}

[s3 alt]
display_name = alt
email = alt@example.com
access_key = ALT
secret_key = ALTSECRET

[s3 tenant]
display_name = tenant
email = tenant@example.com
access_key = TENANT
secret_key = TENANTSECRET

[iam]
display_name = iam
email = iam@example.com
access_key = IAM
secret_key = IAMSECRET
";

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(text.as_bytes())
        .expect("failed to write temp file");
    file
}

#[test]
fn load_from_path() {
    let file = write_config(CONFIG);
    let doc = Document::load(file.path(), ParseMode::Strict).expect("failed to load config");

    assert_eq!(doc.get("s3 alt", "access_key"), Ok("ALT"));
    assert_eq!(
        doc.placeholders().into_iter().collect::<Vec<_>>(),
        vec!["MAIN_ACCESS_KEY", "MAIN_SECRET_KEY"]
    );
}

#[test]
fn load_missing_file() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let result = Document::load(dir.path().join("absent.conf"), ParseMode::Strict);

    assert!(matches!(result, Err(ParseError::ReadFailure(_))));
}

#[test]
fn harness_from_env() {
    let file = write_config(CONFIG);

    temp_env::with_var(CONFIG_ENV, Some(file.path()), || {
        let config = S3TestConfig::from_env(ParseMode::Strict).expect("failed to load config");

        assert_eq!(config.endpoint.to_string(), "http://localhost:8000");
        assert_eq!(config.iam.as_ref().map(|iam| iam.user_id()), Some("iam"));
        assert_eq!(config.tenant.access_key, "TENANT");
    });
}

#[test]
fn harness_env_unset() {
    temp_env::with_var_unset(CONFIG_ENV, || {
        assert!(matches!(
            S3TestConfig::from_env(ParseMode::Strict),
            Err(HarnessError::ConfigPathUnset)
        ));
    });
}

#[test]
fn harness_after_expansion() {
    let doc = Document::parse(CONFIG).expect("failed to parse config");
    let doc = doc
        .expand(|name| match name {
            "MAIN_ACCESS_KEY" => Some("AKIDMAIN"),
            "MAIN_SECRET_KEY" => Some("SECRETMAIN"),
            _ => None,
        })
        .expect("failed to expand placeholders");

    let config = S3TestConfig::from_document(&doc).expect("invalid config");

    assert_eq!(config.main.access_key, "AKIDMAIN");
    assert_eq!(config.main.secret_key, "SECRETMAIN");
    assert!(doc.placeholders().is_empty());
}
