//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Public base URL used in download/install links (e.g., "https://sign.example.com").
    /// Falls back to "http://<bind>" when unset.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Maximum size in bytes accepted per uploaded file.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Origins allowed for cross-origin requests.
    /// Empty disables CORS entirely; ["*"] allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> u64 {
    512 * 1024 * 1024 // 512 MiB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: None,
            max_upload_bytes: default_max_upload_bytes(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Public base URL with any trailing slashes trimmed.
    pub fn public_base(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind),
        }
    }
}

/// Filesystem layout configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-request upload session directories.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Directory holding produced artifacts, served under /output.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data/output")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// External signing tool configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Path to the zsign executable.
    #[serde(default = "default_zsign_path")]
    pub zsign_path: PathBuf,
    /// Maximum number of signing invocations running at once.
    #[serde(default = "default_max_concurrent_signs")]
    pub max_concurrent_signs: u32,
}

fn default_zsign_path() -> PathBuf {
    PathBuf::from("zsign")
}

fn default_max_concurrent_signs() -> u32 {
    4
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            zsign_path: default_zsign_path(),
            max_concurrent_signs: default_max_concurrent_signs(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Filesystem layout.
    #[serde(default)]
    pub storage: StorageConfig,
    /// External signing tool.
    #[serde(default)]
    pub signer: SignerConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses the default local directories and a fixed
    /// public URL so link assertions are deterministic.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                public_url: Some("http://localhost:8080".to_string()),
                ..Default::default()
            },
            storage: StorageConfig::default(),
            signer: SignerConfig::default(),
        }
    }

    /// Validate configuration invariants.
    ///
    /// Returns warnings for insecure-but-allowed settings and an error for
    /// settings that would break the server at runtime.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if self.signer.max_concurrent_signs == 0 {
            return Err(
                "signer.max_concurrent_signs cannot be 0; no signing request could ever run"
                    .to_string(),
            );
        }

        if self.server.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes cannot be 0".to_string());
        }

        if self.server.allowed_origins.iter().any(|o| o == "*") {
            warnings.push(
                "server.allowed_origins contains '*': any website can submit signing \
                 requests to this server"
                    .to_string(),
            );
        }

        if self.server.public_url.is_none() {
            warnings.push(format!(
                "server.public_url not set; download links will use http://{} which is \
                 unlikely to be reachable by devices",
                self.server.bind
            ));
        }

        Ok(warnings)
    }
}
