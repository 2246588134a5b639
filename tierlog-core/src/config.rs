use std::sync::LazyLock;

use derive_from_env::FromEnv;

/// Tuning knobs of the sink threads, read from `TIERLOG_*` environment variables.
#[derive(FromEnv)]
#[from_env(prefix = "TIERLOG")]
#[allow(non_snake_case)]
pub struct TierlogConfig {
    #[from_env(default = "100")]
    pub FLUSH_INTERVAL_MS: u64,
    #[from_env(default = "32")]
    pub BATCH_SIZE: usize,
}

impl Default for TierlogConfig {
    fn default() -> Self {
        Self {
            FLUSH_INTERVAL_MS: 100,
            BATCH_SIZE: 32,
        }
    }
}

pub static TIERLOG_CONFIG: LazyLock<TierlogConfig> =
    LazyLock::new(|| TierlogConfig::from_env().unwrap_or_default());
