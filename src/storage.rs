use async_trait::async_trait;
use aws_sdk_s3 as s3;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Public URL prefix under which stored objects are served (ServeDir mounts
/// the uploads directory here for the local backend).
pub const UPLOADS_PUBLIC_PREFIX: &str = "/static/uploads";

/// Image extensions the News upload accepts. Anything else is skipped without
/// failing the surrounding write.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// 1. ObjectStore Contract

/// ObjectStore
///
/// Abstract contract for the upload store. Route logic only ever talks to this
/// trait, so the uploads directory can be swapped for an S3 bucket (or the
/// in-memory mock during tests) without touching any handler.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL the record should
    /// reference.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, String>;

    /// Removes the object at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), String>;
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn ObjectStore>;

/// allowed_image
///
/// Extension allow-list check, case-insensitive, on the client-supplied filename.
pub fn allowed_image(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// unique_key
///
/// Builds a collision-resistant object key: a namespace prefix, a UUID, and
/// the sanitized original filename so downloads keep a recognizable name.
pub fn unique_key(namespace: &str, filename: &str) -> String {
    let mut safe_name = String::with_capacity(filename.len());
    for c in filename.chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        // Collapse dot runs so relative-path fragments never reach the store.
        if mapped == '.' && safe_name.ends_with('.') {
            continue;
        }
        safe_name.push(mapped);
    }
    format!("{}/{}_{}", namespace, Uuid::new_v4().simple(), safe_name)
}

/// key_from_url
///
/// Recovers the storage key from a stored public URL, used when an update
/// replaces an image and the old object has to be removed.
pub fn key_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(UPLOADS_PUBLIC_PREFIX)
        .map(|rest| rest.trim_start_matches('/'))
        .filter(|key| !key.is_empty())
}

/// sanitize_key
///
/// Prevents path traversal by removing directory navigation components
/// (`..`, `.`) from a user-influenced key.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 2. Local Disk Implementation (the uploads directory)

/// LocalDiskStore
///
/// The default backend: synchronous-per-request writes under the configured
/// uploads directory, served back by path at `/static/uploads`.
#[derive(Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl ObjectStore for LocalDiskStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, String> {
        let key = sanitize_key(key);
        if key.is_empty() {
            return Err("empty object key".to_string());
        }
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("{}/{}", UPLOADS_PUBLIC_PREFIX, key))
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        let key = sanitize_key(key);
        if key.is_empty() {
            return Ok(());
        }
        match tokio::fs::remove_file(self.root.join(&key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

// 3. S3-Compatible Implementation

/// S3ObjectStore
///
/// Object-storage backend using the AWS SDK. `force_path_style(true)` keeps it
/// compatible with MinIO-style gateways for local stacks.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: s3::Client,
    bucket_name: String,
}

impl S3ObjectStore {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }

    /// Idempotent bucket provisioning for local development stacks.
    pub async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, String> {
        let key = sanitize_key(key);
        if key.is_empty() {
            return Err("empty object key".to_string());
        }
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .body(s3::primitives::ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        // Served through the same public prefix; the reverse proxy maps it to
        // the bucket in deployments that use this backend.
        Ok(format!("{}/{}", UPLOADS_PUBLIC_PREFIX, key))
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        let key = sanitize_key(key);
        if key.is_empty() {
            return Ok(());
        }
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

// 4. The Mock Implementation (For Unit Tests)

/// MockObjectStore
///
/// In-memory store used in tests: records every put and delete so handler
/// tests can assert on upload behavior without touching the filesystem.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }
        let key = sanitize_key(key);
        self.objects.lock().unwrap().insert(key.clone(), bytes);
        Ok(format!("{}/{}", UPLOADS_PUBLIC_PREFIX, key))
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }
        let key = sanitize_key(key);
        self.objects.lock().unwrap().remove(&key);
        self.deleted.lock().unwrap().push(key);
        Ok(())
    }
}
