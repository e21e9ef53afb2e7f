use crate::builder::{StoreBuilder, WithBucket};
use crate::error::StoreError;
use std::fmt;
use std::str::FromStr;

/// A parsed store address: `[prefix@]bucket:region[?read_qps=N&write_qps=N]`.
///
/// Rates of zero or below mean unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub prefix: String,
    pub bucket: String,
    pub region: String,
    pub read_qps: u32,
    pub write_qps: u32,
}

impl Address {
    /// A builder for the store at this address, with every other setting at its default.
    #[must_use]
    pub fn builder(&self) -> StoreBuilder<WithBucket> {
        StoreBuilder::new()
            .bucket(&self.bucket)
            .region(&self.region)
            .prefix(&self.prefix)
            .read_qps(self.read_qps)
            .write_qps(self.write_qps)
    }
}

impl FromStr for Address {
    type Err = StoreError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let (location, query) = address.split_once('?').unwrap_or((address, ""));
        let (prefix, bucket_region) = location.split_once('@').unwrap_or(("", location));
        let (bucket, region) = bucket_region.split_once(':').ok_or_else(|| {
            StoreError::invalid_address(format!("'{address}' is not [prefix@]bucket:region"))
        })?;
        if bucket.is_empty() {
            return Err(StoreError::invalid_address(format!("'{address}' names no bucket")));
        }

        let mut parsed = Self {
            prefix: prefix.to_owned(),
            bucket: bucket.to_owned(),
            region: region.to_owned(),
            ..Self::default()
        };
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let rate = parse_rate(name, value)?;
            match name {
                "read_qps" => parsed.read_qps = rate,
                "write_qps" => parsed.write_qps = rate,
                _ => {
                    return Err(StoreError::invalid_address(format!("unknown option '{name}'")));
                },
            }
        }
        Ok(parsed)
    }
}

fn parse_rate(name: &str, value: &str) -> Result<u32, StoreError> {
    let rate: i64 = value
        .parse()
        .map_err(|_| StoreError::invalid_address(format!("{name} must be an integer, got '{value}'")))?;
    Ok(u32::try_from(rate.max(0)).unwrap_or(u32::MAX))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.prefix.is_empty() {
            write!(f, "{}@", self.prefix)?;
        }
        write!(f, "{}:{}", self.bucket, self.region)?;
        let mut separator = '?';
        for (name, rate) in [("read_qps", self.read_qps), ("write_qps", self.write_qps)] {
            if rate > 0 {
                write!(f, "{separator}{name}={rate}")?;
                separator = '&';
            }
        }
        Ok(())
    }
}
