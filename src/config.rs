//! Server configuration: command-line flags with environment fallbacks.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::translate::provider::DEFAULT_PROVIDER_URL;
use crate::translate::server_cache::{DEFAULT_HIGH_WATER, ServerCacheConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "medtour-i18n-server", about = "Caching translate endpoint")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "MEDTOUR_I18N_BIND", default_value = "127.0.0.1:8787")]
    pub bind: SocketAddr,

    /// Base URL of the translation provider.
    #[arg(long, env = "MEDTOUR_I18N_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,

    #[arg(long, env = "MEDTOUR_I18N_PROVIDER_TIMEOUT_SECS", default_value_t = 30)]
    pub provider_timeout_secs: u64,

    /// Age after which a cached translation is fetched again.
    #[arg(long, env = "MEDTOUR_I18N_CACHE_TTL_SECS", default_value_t = 24 * 3600)]
    pub cache_ttl_secs: u64,

    /// Cache size that triggers an expiry sweep on the next write.
    #[arg(long, env = "MEDTOUR_I18N_CACHE_HIGH_WATER", default_value_t = DEFAULT_HIGH_WATER)]
    pub cache_high_water: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = "MEDTOUR_I18N_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn cache(&self) -> ServerCacheConfig {
        ServerCacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            high_water: self.cache_high_water,
        }
    }
}
