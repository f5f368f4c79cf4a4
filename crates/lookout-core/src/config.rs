//! lookout configuration (TOML)
//!
//! ```toml
//! [context]
//! raise_on_noid = false
//!
//! [event_loop]
//! idle_timeout_ms = 5000
//!
//! [[zone]]
//! name = "mycomputer.local"
//! type = "A"
//! address = "192.0.2.51"
//!
//! [[fail]]
//! name = "broken.test"
//! status = "serv_fail"
//! ```

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ContextOptions;
use crate::domain::{EngineStatus, RecordClass, RecordType};
use crate::error::ResolverError;
use crate::impls::InMemoryEngine;

/// Main lookout configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookoutConfig {
    /// Options for the engine boundary
    pub context: ContextOptions,

    /// Event loop driver settings
    pub event_loop: EventLoopConfig,

    /// Static records served by the in-memory engine
    pub zone: Vec<ZoneEntry>,

    /// Names whose lookups fail
    pub fail: Vec<FailEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLoopConfig {
    /// Give up when the engine stays quiet this long
    pub idle_timeout_ms: u64,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 5000,
        }
    }
}

impl EventLoopConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// One zone record. Exactly one of `address` and `rdata` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub name: String,

    #[serde(rename = "type", default = "default_type")]
    pub rrtype: String,

    #[serde(default = "default_class")]
    pub class: String,

    /// Shorthand for A/AAAA records
    #[serde(default)]
    pub address: Option<IpAddr>,

    /// Raw rdata octets
    #[serde(default)]
    pub rdata: Option<Vec<u8>>,

    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_type() -> String {
    "A".to_string()
}

fn default_class() -> String {
    "IN".to_string()
}

fn default_ttl() -> u32 {
    3600
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailEntry {
    pub name: String,
    pub status: EngineStatus,
}

impl ZoneEntry {
    fn rdata(&self, rrtype: RecordType) -> Result<Vec<u8>, ResolverError> {
        match (&self.address, &self.rdata) {
            (Some(IpAddr::V4(addr)), None) if rrtype == RecordType::A => Ok(addr.octets().to_vec()),
            (Some(IpAddr::V6(addr)), None) if rrtype == RecordType::AAAA => {
                Ok(addr.octets().to_vec())
            }
            (Some(addr), None) => Err(ResolverError::Config(format!(
                "{}: address {addr} does not fit type {rrtype}",
                self.name
            ))),
            (None, Some(rdata)) => Ok(rdata.clone()),
            (None, None) => Err(ResolverError::Config(format!(
                "{}: either address or rdata is required",
                self.name
            ))),
            (Some(_), Some(_)) => Err(ResolverError::Config(format!(
                "{}: address and rdata are mutually exclusive",
                self.name
            ))),
        }
    }
}

impl LookoutConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ResolverError> {
        toml::from_str(contents).map_err(|e| ResolverError::Config(e.to_string()))
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ResolverError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), zone = config.zone.len(), "configuration loaded");
        Ok(config)
    }

    /// Builds an in-memory engine serving the configured zone.
    pub fn build_engine(&self) -> Result<InMemoryEngine, ResolverError> {
        let engine = InMemoryEngine::new()?;
        for entry in &self.zone {
            let rrtype: RecordType = entry.rrtype.parse()?;
            let rrclass: RecordClass = entry.class.parse()?;
            let rdata = entry.rdata(rrtype)?;
            engine.add_record(&entry.name, rrtype, rrclass, rdata, entry.ttl);
        }
        for fail in &self.fail {
            if fail.status.is_ok() {
                return Err(ResolverError::Config(format!(
                    "{}: a failure needs a non-success status",
                    fail.name
                )));
            }
            engine.fail_with(&fail.name, fail.status);
        }
        Ok(engine)
    }
}
