// Connection parameters and the XML namespace set shared by every service endpoint

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ConfigError;

pub const ENVELOPE_PREFIX: &str = "xmlns:env";
pub const ENVELOPE_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const CORE_PREFIX: &str = "xmlns:cor";
pub const CORE_URI: &str = "http://webservices.micros.com/og/4.3/Core/";

// Environment keys required at startup
pub const URL_KEY: &str = "URL";
pub const USERNAME_KEY: &str = "USERNAME";
pub const PASSWORD_KEY: &str = "PASSWORD";

// Ordered mapping of namespace declarations (`"xmlns:cor"`) to URIs.
//
// Always holds the SOAP envelope and OWS core namespaces. Merging only ever
// adds or overwrites entries, it never removes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Namespaces(IndexMap<String, String>);

impl Default for Namespaces {
    fn default() -> Self {
        Self::baseline()
    }
}

impl Namespaces {
    pub fn baseline() -> Self {
        let mut map = IndexMap::new();
        map.insert(ENVELOPE_PREFIX.to_string(), ENVELOPE_URI.to_string());
        map.insert(CORE_PREFIX.to_string(), CORE_URI.to_string());
        Namespaces(map)
    }

    // Union `extra` into the set, last write wins per prefix.
    pub fn merge<I, K, V>(&mut self, extra: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (prefix, uri) in extra {
            self.0.insert(prefix.into(), uri.into());
        }
        self
    }

    // Merge from loosely typed input. Anything but an object of strings is ignored.
    pub fn merge_json(&mut self, extra: &Value) -> &Self {
        if let Value::Object(map) = extra {
            for (prefix, uri) in map {
                if let Some(uri) = uri.as_str() {
                    self.0.insert(prefix.clone(), uri.to_string());
                }
            }
        }
        self
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.0.contains_key(prefix)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_superset_of(&self, other: &Namespaces) -> bool {
        other.iter().all(|(prefix, uri)| self.get(prefix) == Some(uri))
    }
}

impl<'a> IntoIterator for &'a Namespaces {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Loose shape accepted from callers and config files: every field may be absent
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectionOptions {
    #[serde(alias = "base_url")]
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    namespaces: IndexMap<String, String>,
}

impl From<ConnectionOptions> for ConnectionConfig {
    fn from(options: ConnectionOptions) -> Self {
        ConnectionConfig::new(
            options.url.unwrap_or_default(),
            options.username.unwrap_or_default(),
            options.password.unwrap_or_default(),
        )
        .with_namespaces(options.namespaces)
    }
}

// Base URL, credentials and namespace set for one logical OWS connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ConnectionOptions")]
pub struct ConnectionConfig {
    base_url: String,
    username: String,
    password: String,
    namespaces: Namespaces,
}

impl ConnectionConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            username: username.into(),
            password: password.into(),
            namespaces: Namespaces::baseline(),
        }
    }

    pub fn with_namespaces<I, K, V>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.namespaces.merge(extra);
        self
    }

    // Read `URL`, `USERNAME` and `PASSWORD` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Same as `ConnectionConfig::from_env` with a custom key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |key: &'static str| lookup(key).ok_or(ConfigError::MissingKey(key));

        Ok(Self::new(
            fetch(URL_KEY)?,
            fetch(USERNAME_KEY)?,
            fetch(PASSWORD_KEY)?,
        ))
    }

    pub fn merge_namespaces<I, K, V>(&mut self, extra: I) -> &Namespaces
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.namespaces.merge(extra);
        &self.namespaces
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    // WSDL location of a service, e.g. `{base}/HouseKeeping.asmx?WSDL`.
    pub fn wsdl_url(&self, service: &str) -> String {
        format!("{}/{}.asmx?WSDL", self.base_url, service)
    }

    // WSDL discovery is only attempted against absolute http(s) URLs
    pub fn has_http_url(&self) -> bool {
        match url::Url::parse(&self.base_url) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
            Err(_) => false,
        }
    }

    // SOAP header block carrying the credentials, sent with every call.
    pub fn auth_header(&self) -> Value {
        json!({
            "cor:OGHeader": {
                "cor:Authentication": {
                    "cor:UserCredentials": {
                        "cor:UserName": self.username,
                        "cor:UserPassword": self.password,
                    }
                }
            }
        })
    }
}
