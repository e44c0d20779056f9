use std::env;
use std::path::PathBuf;

/// Transfer configuration for uploads and downloads
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum size of a single uploaded file in bytes (default: 1 GiB)
    pub max_upload_size: u64,

    /// Flat directory holding every stored file (default: "./cloud")
    pub storage_dir: PathBuf,

    /// Copy buffer size used while streaming uploads (default: 64 KiB)
    pub chunk_size: usize,

    /// Number of leading bytes probed for content-type sniffing (default: 512)
    pub probe_size: usize,

    /// Exclusive-create attempts before an upload gives up on a name (default: 16)
    pub create_attempts: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 1024 * 1024 * 1024, // 1 GiB
            storage_dir: PathBuf::from("./cloud"),
            chunk_size: 64 * 1024, // 64 KiB
            probe_size: 512,
            create_attempts: 16,
        }
    }
}

impl TransferConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            storage_dir: env::var("STORAGE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.storage_dir),

            chunk_size: env::var("CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(default.chunk_size),

            probe_size: env::var("PROBE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.probe_size),

            create_attempts: env::var("CREATE_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u32| *v > 0)
                .unwrap_or(default.create_attempts),
        }
    }

    /// Create config for development and tests (small chunks, same limits)
    pub fn development() -> Self {
        Self {
            chunk_size: 4 * 1024,
            ..Self::default()
        }
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }
}
