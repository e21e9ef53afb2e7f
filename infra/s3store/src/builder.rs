use crate::backend::{ObjectBackend, S3Backend, S3ClientOptions};
use crate::codec::{DEFAULT_SHARD_WIDTH, KeyCodec, MAX_SHARD_WIDTH};
use crate::config::StoreConfig;
use crate::engine::S3Store;
use crate::error::{StoreError, StoreErrorExt};
use crate::keyspace::Shared;
use crate::waiter::limiter;
use private::Sealed;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
struct BuilderConfig {
    region: String,
    prefix: String,
    shard_width: usize,
    read_qps: u32,
    write_qps: u32,
    endpoint_url: Option<String>,
    force_path_style: bool,
    create_bucket: bool,
    backend: Option<Arc<dyn ObjectBackend>>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            prefix: String::new(),
            shard_width: DEFAULT_SHARD_WIDTH,
            read_qps: 0,
            write_qps: 0,
            endpoint_url: None,
            force_path_style: false,
            create_bucket: true,
            backend: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct NoBucket;
#[derive(Debug)]
pub struct WithBucket(String);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoBucket {}
impl Sealed for WithBucket {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct StoreBuilder<S: Sealed = NoBucket> {
    state: S,
    config: BuilderConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> StoreBuilder<S> {
    #[must_use = "Sets the region the bucket lives in"]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    #[must_use = "Sets the object-name prefix of the root namespace"]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    #[must_use = "Sets how many hex digits form the shard directory"]
    pub const fn shard_width(mut self, width: usize) -> Self {
        self.config.shard_width = width;
        self
    }

    #[must_use = "Sets the read request rate; 0 is unlimited"]
    pub const fn read_qps(mut self, qps: u32) -> Self {
        self.config.read_qps = qps;
        self
    }

    #[must_use = "Sets the write request rate; 0 is unlimited"]
    pub const fn write_qps(mut self, qps: u32) -> Self {
        self.config.write_qps = qps;
        self
    }

    #[must_use = "Points the S3 client at a custom endpoint"]
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint_url = Some(url.into());
        self
    }

    #[must_use = "Sets whether the S3 client uses path-style addressing"]
    pub const fn force_path_style(mut self, enable: bool) -> Self {
        self.config.force_path_style = enable;
        self
    }

    #[must_use = "Sets whether the bucket is created when the store opens"]
    pub const fn create_bucket(mut self, enable: bool) -> Self {
        self.config.create_bucket = enable;
        self
    }

    /// Uses `backend` instead of an S3 client built from the environment.
    #[must_use = "Sets the object backend"]
    pub fn backend(mut self, backend: Arc<dyn ObjectBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    fn transition<N: Sealed>(self, state: N) -> StoreBuilder<N> {
        StoreBuilder { state, config: self.config }
    }
}

impl StoreBuilder<NoBucket> {
    #[must_use = "Creates a new store builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the bucket holding the store"]
    pub fn bucket(self, bucket: impl Into<String>) -> StoreBuilder<WithBucket> {
        self.transition(WithBucket(bucket.into()))
    }

    /// Applies every setting of `config`, bucket included.
    ///
    /// # Errors
    /// [`StoreError::InvalidConfiguration`] if `config` names no bucket.
    pub fn config(self, config: &StoreConfig) -> Result<StoreBuilder<WithBucket>, StoreError> {
        if config.bucket.is_empty() {
            return Err(StoreError::invalid_configuration("no bucket configured"));
        }
        let mut builder = self
            .bucket(&config.bucket)
            .region(&config.region)
            .prefix(&config.prefix)
            .shard_width(config.shard_width)
            .read_qps(config.read_qps)
            .write_qps(config.write_qps)
            .force_path_style(config.force_path_style)
            .create_bucket(config.create_bucket);
        if let Some(url) = &config.endpoint_url {
            builder = builder.endpoint_url(url);
        }
        Ok(builder)
    }
}

impl StoreBuilder<WithBucket> {
    /// Connects to the object store and opens the root namespace.
    ///
    /// Without an explicit [`backend`](Self::backend), an S3 client is built from
    /// the ambient AWS configuration with the region and endpoint overrides
    /// applied. When `create_bucket` is set (the default) the bucket is created;
    /// one that already exists is reused.
    ///
    /// # Errors
    /// [`StoreError::InvalidConfiguration`] for an empty bucket name or a shard
    /// width above [`MAX_SHARD_WIDTH`], and
    /// [`StoreError::Bucket`] if creating the bucket fails.
    pub async fn connect(self) -> Result<S3Store, StoreError> {
        let bucket = self.state.0;
        let config = self.config;
        if bucket.is_empty() {
            return Err(StoreError::invalid_configuration("bucket name is empty"));
        }
        if config.shard_width > MAX_SHARD_WIDTH {
            return Err(StoreError::invalid_configuration(format!(
                "shard width {} is out of range 0..={MAX_SHARD_WIDTH}",
                config.shard_width
            )));
        }

        let backend = match config.backend {
            Some(backend) => backend,
            None => {
                let options = S3ClientOptions {
                    region: Some(config.region.clone()),
                    endpoint_url: config.endpoint_url.clone(),
                    force_path_style: config.force_path_style,
                };
                Arc::new(S3Backend::from_env(&options).await) as Arc<dyn ObjectBackend>
            },
        };

        if config.create_bucket {
            match backend.create_bucket(&bucket, &config.region).await {
                Ok(()) => info!(bucket = %bucket, region = %config.region, "Created bucket"),
                Err(e) if e.is_already_exists() => info!(bucket = %bucket, "Reusing existing bucket"),
                Err(e) => return Err(e).context(format!("Failed to create bucket {bucket}")),
            }
        }

        let shared = Shared {
            backend,
            bucket,
            read: limiter(config.read_qps),
            write: limiter(config.write_qps),
        };
        let codec = KeyCodec::new(&config.prefix, config.shard_width);
        info!(
            bucket = %shared.bucket,
            prefix = codec.prefix(),
            read_qps = config.read_qps,
            write_qps = config.write_qps,
            "Opened store"
        );
        Ok(S3Store::from_parts(Arc::new(shared), codec))
    }
}
