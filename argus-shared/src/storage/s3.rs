/// S3-compatible object store (MinIO, AWS S3)

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Credentials},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use tracing::{debug, info};

use super::{object_url, ObjectStore, StorageError};

/// Connection settings for the bucket
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// `host:port`, without scheme
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

pub struct S3ObjectStore {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "argus-static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(format!("http://{}", settings.endpoint))
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        // MinIO serves buckets under the path, not as subdomains
        let s3_config = S3ConfigBuilder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            endpoint: settings.endpoint.clone(),
            bucket: settings.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn backend<E>(op: &str, err: E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::Backend(format!("{op}: {}", DisplayErrorContext(&err)))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                debug!(bucket = %self.bucket, "Bucket exists");
                return Ok(());
            }
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if !missing {
                    return Err(backend("head_bucket", err));
                }
            }
        }

        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| backend("create_bucket", e))?;

        info!(bucket = %self.bucket, "Bucket created");
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| backend("put_object", e))?;

        debug!(bucket = %self.bucket, key = %key, size = size, "Object stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend("delete_object", e))?;

        debug!(bucket = %self.bucket, key = %key, "Object deleted");
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        object_url(&self.endpoint, &self.bucket, key)
    }
}
