use crate::address::Address;
use crate::codec::DEFAULT_SHARD_WIDTH;
use serde::{Deserialize, Serialize};

/// Store settings as they appear in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub bucket: String,
    pub region: String,
    pub prefix: String,
    pub shard_width: usize,
    /// Read requests per second; `0` is unlimited.
    pub read_qps: u32,
    /// Write requests per second; `0` is unlimited.
    pub write_qps: u32,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    /// Create the bucket when opening the store.
    pub create_bucket: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: String::new(),
            prefix: String::new(),
            shard_width: DEFAULT_SHARD_WIDTH,
            read_qps: 0,
            write_qps: 0,
            endpoint_url: None,
            force_path_style: false,
            create_bucket: true,
        }
    }
}

impl StoreConfig {
    /// Replaces the location and rate settings with those of `address`.
    #[must_use]
    pub fn with_address(mut self, address: &Address) -> Self {
        self.bucket.clone_from(&address.bucket);
        self.region.clone_from(&address.region);
        self.prefix.clone_from(&address.prefix);
        self.read_qps = address.read_qps;
        self.write_qps = address.write_qps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{ "bucket": "reports" }"#).unwrap();
        assert_eq!(config.bucket, "reports");
        assert_eq!(config.shard_width, DEFAULT_SHARD_WIDTH);
        assert!(config.create_bucket);
        assert_eq!(config.endpoint_url, None);
    }

    #[test]
    fn address_overrides_location_and_rates() {
        let config = StoreConfig { shard_width: 2, read_qps: 9, ..StoreConfig::default() };
        let address: Address = "p@b:eu-west-1?write_qps=3".parse().unwrap();
        let merged = config.with_address(&address);
        assert_eq!((merged.prefix.as_str(), merged.bucket.as_str()), ("p", "b"));
        assert_eq!((merged.read_qps, merged.write_qps), (0, 3));
        assert_eq!(merged.shard_width, 2);
    }
}
