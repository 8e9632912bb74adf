//! Typed settings for the S3 compatibility test suite.
//!
//! The parser itself knows nothing about which sections exist. This module layers the test
//! suite's expectations on top of a [`Document`]: the required `DEFAULT`, `s3 main`, `s3 alt`
//! and `s3 tenant` sections, the optional `fixtures`, `iam`, `webidentity` and `s3 cloud`
//! sections, and the defaults applied when optional keys are absent. Lookups fall back to
//! `[DEFAULT]` the same way [`Document::lookup`] does.

use std::fmt;
use std::path::Path;

use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;

use crate::{DEFAULT_SECTION, Document, LookupError, ParseError, ParseMode};

/// Environment variable holding the path of the configuration file.
pub const CONFIG_ENV: &str = "S3TEST_CONF";

pub const DEFAULT_BUCKET_PREFIX: &str = "test-{random}-";

/// Longest bucket prefix [`choose_bucket_prefix`] will produce by default.
pub const MAX_BUCKET_PREFIX_LEN: usize = 30;

const RANDOM_FILLER_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("to run tests, point environment variable {CONFIG_ENV} to a config file")]
    ConfigPathUnset,
    #[error("your config file is missing the {0:?} section")]
    MissingSection(&'static str),
    #[error("bucket prefix template is impossible to fulfill: {0:?}")]
    ImpossiblePrefix(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Where the server under test listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub is_secure: bool,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.is_secure { "https" } else { "http" };
        write!(f, "{scheme}://{}:{}", self.host, self.port)
    }
}

/// Credentials and identity of one test account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub access_key: String,
    pub secret_key: String,
    pub display_name: String,
    pub email: String,
}

impl User {
    /// The suite identifies accounts by display name.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.display_name
    }
}

/// Optional `s3 main` settings and their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainSettings {
    pub kms_keyid: String,
    pub kms_keyid2: String,
    pub api_name: String,
    pub storage_classes: String,
    pub lc_debug_interval: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebIdentity {
    pub thumbprint: String,
    pub aud: String,
    pub token: String,
    pub realm: String,
    pub sub: String,
    pub azp: String,
    pub user_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSettings {
    pub endpoint: Endpoint,
    pub access_key: String,
    pub secret_key: String,
    pub cloud_storage_class: Option<String>,
    pub retain_head_object: Option<String>,
    pub target_path: Option<String>,
    pub target_storage_class: String,
    pub regular_storage_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3TestConfig {
    pub endpoint: Endpoint,
    pub ssl_verify: bool,
    pub main: User,
    pub main_settings: MainSettings,
    pub alt: User,
    pub tenant: User,
    pub bucket_prefix_template: String,
    pub iam: Option<User>,
    pub webidentity: Option<WebIdentity>,
    pub cloud: Option<CloudSettings>,
}

impl S3TestConfig {
    /// Load the file named by [`CONFIG_ENV`].
    pub fn from_env(mode: ParseMode) -> Result<Self, HarnessError> {
        let path = std::env::var_os(CONFIG_ENV).ok_or(HarnessError::ConfigPathUnset)?;
        Self::load(path, mode)
    }

    pub fn load<P>(path: P, mode: ParseMode) -> Result<Self, HarnessError>
    where
        P: AsRef<Path>,
    {
        let document = Document::load(path, mode)?;
        Self::from_document(&document)
    }

    pub fn from_document(doc: &Document) -> Result<Self, HarnessError> {
        if doc.defaults().is_none_or(|defaults| defaults.entries().is_empty()) {
            return Err(HarnessError::MissingSection(DEFAULT_SECTION));
        }

        for name in ["s3 main", "s3 alt", "s3 tenant"] {
            if !doc.has_section(name) {
                return Err(HarnessError::MissingSection(name));
            }
        }

        let defaults = Reader::new(doc, DEFAULT_SECTION);
        let endpoint = defaults.endpoint()?;
        let ssl_verify = defaults.optional_bool("ssl_verify")?.unwrap_or(false);

        let main = Reader::new(doc, "s3 main");
        let main_settings = MainSettings {
            kms_keyid: main.optional_or("kms_keyid", "testkey-1"),
            kms_keyid2: main.optional_or("kms_keyid2", "testkey-2"),
            api_name: main.optional_or("api_name", ""),
            storage_classes: main.optional_or("storage_classes", ""),
            lc_debug_interval: main.optional_int("lc_debug_interval")?.unwrap_or(10),
        };

        let bucket_prefix_template =
            Reader::new(doc, "fixtures").optional_or("bucket prefix", DEFAULT_BUCKET_PREFIX);

        let config = Self {
            endpoint,
            ssl_verify,
            main: main.user()?,
            main_settings,
            alt: Reader::new(doc, "s3 alt").user()?,
            tenant: Reader::new(doc, "s3 tenant").user()?,
            bucket_prefix_template,
            iam: Reader::present(doc, "iam").map(|r| r.user()).transpose()?,
            webidentity: Reader::present(doc, "webidentity")
                .map(|r| r.webidentity())
                .transpose()?,
            cloud: Reader::present(doc, "s3 cloud")
                .map(|r| r.cloud())
                .transpose()?,
        };

        tracing::debug!(
            endpoint = %config.endpoint,
            ssl_verify,
            iam = config.iam.is_some(),
            webidentity = config.webidentity.is_some(),
            cloud = config.cloud.is_some(),
            "loaded test configuration"
        );

        Ok(config)
    }

    /// `STANDARD` followed by any extra classes listed under `s3 main`.
    #[must_use]
    pub fn storage_classes(&self) -> Vec<&str> {
        let extra = self
            .main_settings
            .storage_classes
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|class| !class.is_empty() && *class != "STANDARD");

        std::iter::once("STANDARD").chain(extra).collect()
    }

    /// Pick a bucket prefix from the configured template using fresh random filler.
    pub fn bucket_prefix(&self) -> Result<String, HarnessError> {
        choose_bucket_prefix(
            &self.bucket_prefix_template,
            &random_filler(),
            MAX_BUCKET_PREFIX_LEN,
        )
    }
}

/// Substitute `{random}` in `template` with the longest non-empty prefix of `filler` that keeps
/// the result within `max_len` bytes.
pub fn choose_bucket_prefix(
    template: &str,
    filler: &str,
    max_len: usize,
) -> Result<String, HarnessError> {
    let ends = filler
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev();

    for end in ends {
        let prefix = template.replace("{random}", &filler[..end]);
        if prefix.len() <= max_len {
            return Ok(prefix);
        }
    }

    Err(HarnessError::ImpossiblePrefix(template.to_owned()))
}

/// Lower-case letters and digits suitable for bucket names.
#[must_use]
pub fn random_filler() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_FILLER_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Reads one section, falling back to `[DEFAULT]` for missing keys.
struct Reader<'a> {
    doc: &'a Document,
    section: &'a str,
}

impl<'a> Reader<'a> {
    fn new(doc: &'a Document, section: &'a str) -> Self {
        Self { doc, section }
    }

    fn present(doc: &'a Document, section: &'a str) -> Option<Self> {
        doc.has_section(section).then(|| Self::new(doc, section))
    }

    fn required(&self, key: &str) -> Result<String, LookupError> {
        self.doc.lookup(self.section, key).map(str::to_owned)
    }

    fn optional(&self, key: &str) -> Result<Option<&'a str>, LookupError> {
        match self.doc.lookup(self.section, key) {
            Ok(value) => Ok(Some(value)),
            Err(LookupError::MissingSection(_) | LookupError::MissingKey { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn optional_or(&self, key: &str, default: &str) -> String {
        self.doc
            .lookup(self.section, key)
            .unwrap_or(default)
            .to_owned()
    }

    fn optional_owned(&self, key: &str) -> Result<Option<String>, LookupError> {
        Ok(self.optional(key)?.map(str::to_owned))
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>, LookupError> {
        self.optional(key)?
            .map(|value| {
                crate::parse_bool(value)
                    .ok_or_else(|| crate::invalid_value(self.section, key, value, "boolean"))
            })
            .transpose()
    }

    fn optional_int(&self, key: &str) -> Result<Option<i64>, LookupError> {
        self.optional(key)?
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| crate::invalid_value(self.section, key, value, "integer"))
            })
            .transpose()
    }

    fn endpoint(&self) -> Result<Endpoint, LookupError> {
        let host = self.required("host")?;
        let port = self.required("port")?;
        let port = port
            .parse()
            .map_err(|_| crate::invalid_value(self.section, "port", &port, "port number"))?;
        let is_secure = self.optional_bool("is_secure")?.ok_or_else(|| {
            LookupError::MissingKey {
                section: self.section.to_owned(),
                key: "is_secure".to_owned(),
            }
        })?;

        Ok(Endpoint {
            host,
            port,
            is_secure,
        })
    }

    fn user(&self) -> Result<User, LookupError> {
        Ok(User {
            access_key: self.required("access_key")?,
            secret_key: self.required("secret_key")?,
            display_name: self.required("display_name")?,
            email: self.required("email")?,
        })
    }

    fn webidentity(&self) -> Result<WebIdentity, LookupError> {
        Ok(WebIdentity {
            thumbprint: self.required("thumbprint")?,
            aud: self.required("aud")?,
            token: self.required("token")?,
            realm: self.required("KC_REALM")?,
            sub: self.required("sub")?,
            azp: self.required("azp")?,
            user_token: self.required("user_token")?,
        })
    }

    fn cloud(&self) -> Result<CloudSettings, LookupError> {
        Ok(CloudSettings {
            endpoint: self.endpoint()?,
            access_key: self.required("access_key")?,
            secret_key: self.required("secret_key")?,
            cloud_storage_class: self.optional_owned("cloud_storage_class")?,
            retain_head_object: self.optional_owned("retain_head_object")?,
            target_path: self.optional_owned("target_path")?,
            target_storage_class: self.optional_or("target_storage_class", "STANDARD"),
            regular_storage_class: self.optional_owned("storage_class")?,
        })
    }
}
