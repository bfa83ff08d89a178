pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7071;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_HOST: &str = "JCV_HOST";
pub const ENV_PORT: &str = "JCV_PORT";
pub const ENV_WORKERS: &str = "JCV_WORKERS";
pub const ENV_MAX_BODY_BYTES: &str = "JCV_MAX_BODY_BYTES";
pub const ENV_DRAFT: &str = "JCV_DRAFT";
pub const ENV_NULLABLE: &str = "JCV_NULLABLE";
pub const ENV_REMOTE_REFS: &str = "JCV_REMOTE_REFS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "JCV_FETCH_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "JCV_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "JCV_LOG_FILE";
pub const ENV_CONTACT_EMAIL: &str = "JCV_CONTACT_EMAIL";

/// Every variable read by [`super::Config::apply_env_overrides`].
pub const ALL_ENV_VARS: [&str; 11] = [
    ENV_HOST,
    ENV_PORT,
    ENV_WORKERS,
    ENV_MAX_BODY_BYTES,
    ENV_DRAFT,
    ENV_NULLABLE,
    ENV_REMOTE_REFS,
    ENV_FETCH_TIMEOUT_SECS,
    ENV_LOG_LEVEL,
    ENV_LOG_FILE,
    ENV_CONTACT_EMAIL,
];
