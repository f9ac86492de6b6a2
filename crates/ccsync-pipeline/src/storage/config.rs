use crate::config::Settings;

/// Default endpoint: the interoperability API of the bucket service.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

pub const DEFAULT_STORAGE_REGION: &str = "auto";

#[derive(Clone)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    /// HMAC key pair. Without one the ambient credential chain is used.
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_STORAGE_ENDPOINT.to_string()),
            region: DEFAULT_STORAGE_REGION.to_string(),
            access_key: None,
            secret_key: None,
            path_style: true,
        }
    }
}

impl StorageConfig {
    /// Both halves of the key pair, or neither.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access, secret)),
            _ => None,
        }
    }

    pub(crate) fn from_settings<F>(settings: &mut Settings<F>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let access_key = settings.optional("STORAGE_ACCESS_KEY");
        let secret_key = settings.optional("STORAGE_SECRET_KEY");

        if access_key.is_some() != secret_key.is_some() {
            settings.invalid(
                "STORAGE_ACCESS_KEY and STORAGE_SECRET_KEY must be set together".to_string(),
            );
        }

        Self {
            endpoint: settings.optional("STORAGE_ENDPOINT").or(defaults.endpoint),
            region: settings
                .optional("STORAGE_REGION")
                .unwrap_or(defaults.region),
            access_key,
            secret_key,
            path_style: settings.parsed("STORAGE_PATH_STYLE", defaults.path_style),
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("path_style", &self.path_style)
            .finish()
    }
}
