use super::{BackendError, ListPage, ListRequest, ObjectBackend, ObjectHead};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::debug;

/// The region S3 refuses as an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// How to build the SDK client; unset fields fall back to the standard AWS
/// environment and profile chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3ClientOptions {
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services.
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

/// [`ObjectBackend`] over the AWS SDK.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Arc<S3Client>,
}

impl S3Backend {
    #[must_use]
    pub fn new(client: S3Client) -> Self {
        Self { client: Arc::new(client) }
    }

    /// Loads credentials and settings from the environment, overridden by `options`.
    pub async fn from_env(options: &S3ClientOptions) -> Self {
        let region = match options.region.as_deref().filter(|r| !r.is_empty()) {
            Some(region) => RegionProviderChain::first_try(Region::new(region.to_owned())),
            None => RegionProviderChain::default_provider().or_else(DEFAULT_REGION),
        };
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(endpoint) = &options.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(options.force_path_style)
            .build();
        debug!(
            region = ?shared.region(),
            endpoint = options.endpoint_url.as_deref().unwrap_or("default"),
            "Configured S3 client"
        );
        Self::new(S3Client::from_conf(config))
    }
}

fn already_exists(err: &CreateBucketError) -> bool {
    err.is_bucket_already_owned_by_you() || err.is_bucket_already_exists()
}

/// Splits an SDK failure into "the thing is missing" and everything else.
fn classify<E, R>(err: SdkError<E, R>, missing: fn(&E) -> bool, what: String) -> BackendError
where
    SdkError<E, R>: StdError + Send + Sync + 'static,
{
    if err.as_service_error().is_some_and(missing) {
        BackendError::not_found(what)
    } else {
        BackendError::transport(err, what)
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if !region.is_empty() && region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().is_some_and(already_exists) => {
                Err(BackendError::AlreadyExists { message: bucket.to_owned().into(), context: None })
            },
            Err(err) => Err(BackendError::transport(err, format!("create bucket {bucket}"))),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, GetObjectError::is_no_such_key, format!("get object {key}")))?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BackendError::transport(e, format!("read body of {key}")))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), BackendError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| BackendError::transport(e, format!("put object {key}")))?;
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, BackendError> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, HeadObjectError::is_not_found, format!("head object {key}")))?;
        Ok(ObjectHead {
            size: output.content_length().and_then(|len| u64::try_from(len).ok()).unwrap_or_default(),
            delete_marker: output.delete_marker().unwrap_or(false),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BackendError::transport(e, format!("delete object {key}")))?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, request: ListRequest) -> Result<ListPage, BackendError> {
        let ListRequest { prefix, start_after, continuation } = request;
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix((!prefix.is_empty()).then_some(prefix))
            .set_start_after(start_after)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| BackendError::transport(e, format!("list objects in {bucket}")))?;

        let keys = output.contents.unwrap_or_default().into_iter().filter_map(|object| object.key).collect();
        Ok(ListPage { keys, next_continuation: output.next_continuation_token })
    }
}
