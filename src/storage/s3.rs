// S3-compatible storage backend. Works against AWS proper or any
// S3-compatible service (MinIO, LocalStack) via a custom endpoint.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{FieldEncryptor, StorageBackend, StorageError};

/// Connection settings for an S3-compatible object store.
///
/// `access_key_id` and `secret_access_key` hold field-encrypted values as
/// stored by the platform; they are decrypted through the
/// [`FieldEncryptor`] when the client is first built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3StorageConfig {
    /// Target bucket.
    pub bucket: String,
    /// AWS region (or the region label of a compatible service).
    pub region: String,
    /// Prefix prepended to every object key.
    #[serde(default)]
    pub key_prefix: String,
    /// Custom endpoint for S3-compatible services.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Path-style addressing, required by most self-hosted services.
    #[serde(default)]
    pub force_path_style: bool,
    /// Field-encrypted access key id.
    pub access_key_id: String,
    /// Field-encrypted secret access key.
    pub secret_access_key: String,
}

/// [`StorageBackend`] over an S3-compatible object store.
pub struct S3Storage {
    config: S3StorageConfig,
    client: OnceCell<Client>,
}

impl S3Storage {
    /// Creates a backend from connection settings. The client is built
    /// lazily on first use.
    pub fn new(config: S3StorageConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self, encryptor: &dyn FieldEncryptor) -> Result<&Client, StorageError> {
        self.client
            .get_or_try_init(|| self.build_client(encryptor))
            .await
    }

    async fn build_client(&self, encryptor: &dyn FieldEncryptor) -> Result<Client, StorageError> {
        let access_key_id = encryptor.decrypt(&self.config.access_key_id)?;
        let secret_access_key = encryptor.decrypt(&self.config.secret_access_key)?;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "backup-retention",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(self.config.region.clone()))
            .credentials_provider(credentials);

        if let Some(ref endpoint) = self.config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if self.config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Client::from_conf(builder.build()))
    }

    fn object_key(&self, file_name: &str) -> String {
        format!("{}{}", self.config.key_prefix, file_name)
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn delete_file(
        &self,
        encryptor: &dyn FieldEncryptor,
        file_name: &str,
    ) -> Result<(), StorageError> {
        let client = self.client(encryptor).await?;

        // S3 DeleteObject succeeds on missing keys, which gives us the
        // idempotence the deletion pipeline relies on.
        client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(self.object_key(file_name))
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("failed to delete object {file_name}: {e}"))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_applies_prefix() {
        let storage = S3Storage::new(S3StorageConfig {
            bucket: "backups".to_string(),
            region: "us-east-1".to_string(),
            key_prefix: "prod/".to_string(),
            endpoint_url: None,
            force_path_style: false,
            access_key_id: "AKIA...".to_string(),
            secret_access_key: "secret".to_string(),
        });

        assert_eq!(storage.object_key("db.dump"), "prod/db.dump");
        assert_eq!(storage.object_key("db.dump.metadata"), "prod/db.dump.metadata");
    }
}
