//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3sum-core.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::types::ObjectCannedAcl;
use futures::stream::{self, StreamExt};

use s3sum_core::{
    Error, ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore, PutOptions, PutReceipt,
    RemotePath, Result, Settings,
};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from resolved settings
    ///
    /// Static keys from the endpoint config take precedence; otherwise the
    /// SDK's credential chain is used, optionally for a named profile.
    pub async fn new(settings: &Settings) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()));

        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }

        let mut force_path_style = false;
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(&endpoint.url);
            force_path_style = endpoint.force_path_style;

            if let (Some(access_key), Some(secret_key)) =
                (&endpoint.access_key, &endpoint.secret_key)
            {
                let credentials = aws_credential_types::Credentials::new(
                    access_key,
                    secret_key,
                    None, // session token
                    None, // expiry
                    "s3sum-static-credentials",
                );
                loader = loader.credentials_provider(credentials);
            }
        }

        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(force_path_style)
            .build();

        tracing::debug!(
            region = %settings.region,
            endpoint = ?settings.endpoint.as_ref().map(|e| &e.url),
            "s3 client configured"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

/// Map an SDK failure onto the core error taxonomy
fn classify<E>(err: SdkError<E, HttpResponse>, subject: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    let status = err.raw_response().map(|r| r.status().as_u16());

    match (code.as_deref(), status) {
        (Some("NotFound" | "NoSuchKey" | "NoSuchBucket"), _) | (_, Some(404)) => {
            Error::NotFound(subject.to_string())
        }
        (Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"), _)
        | (_, Some(403)) => Error::Auth(format!("{subject}: {}", DisplayErrorContext(err))),
        _ => Error::Transport(DisplayErrorContext(err).to_string()),
    }
}

fn timestamp(dt: &DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

fn content_length(len: Option<i64>) -> Option<u64> {
    len.and_then(|n| u64::try_from(n).ok())
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify(e, "bucket list"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::dir(b.name().unwrap_or_default());
                info.last_modified = b.creation_date().and_then(timestamp);
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult> {
        let mut request = self.inner.list_objects_v2().bucket(&path.bucket);

        if !path.key.is_empty() {
            request = request.prefix(&path.key);
        }

        // Set delimiter (for non-recursive listing)
        if !options.recursive {
            request = request.delimiter(options.delimiter.as_deref().unwrap_or("/"));
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, &path.bucket))?;

        let mut items = Vec::new();

        // Common prefixes (directories) first
        for prefix in response.common_prefixes() {
            if let Some(p) = prefix.prefix() {
                items.push(ObjectInfo::dir(p));
            }
        }

        for object in response.contents() {
            let key = object.key().unwrap_or_default();
            let size = content_length(object.size()).unwrap_or(0);
            let mut info = ObjectInfo::file(key, size);
            info.last_modified = object.last_modified().and_then(timestamp);
            info.etag = object.e_tag().map(str::to_string);
            items.push(info);
        }

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn probe_object(&self, path: &RemotePath) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        let size = content_length(response.content_length()).unwrap_or(0);
        let mut info = ObjectInfo::file(&path.key, size);
        info.last_modified = response.last_modified().and_then(timestamp);
        info.etag = response.e_tag().map(str::to_string);
        info.content_type = response.content_type().map(str::to_string);

        Ok(info)
    }

    async fn get_object(&self, path: &RemotePath) -> Result<ObjectBody> {
        let response = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        let etag = response.e_tag().map(str::to_string);
        let size = content_length(response.content_length());

        let chunks = stream::try_unfold(response.body, |mut body| async move {
            match body.try_next().await {
                Ok(Some(bytes)) => Ok(Some((bytes.to_vec(), body))),
                Ok(None) => Ok(None),
                Err(e) => Err(Error::Transport(format!("reading object body: {e}"))),
            }
        })
        .boxed();

        Ok(ObjectBody { chunks, etag, size })
    }

    async fn put_object(
        &self,
        path: &RemotePath,
        body: tokio::fs::File,
        options: PutOptions,
    ) -> Result<PutReceipt> {
        let body = ByteStream::read_from()
            .file(body)
            .build()
            .await
            .map_err(|e| Error::General(format!("preparing upload body: {e}")))?;

        let mut request = self
            .inner
            .put_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .content_type(options.content_type)
            .acl(ObjectCannedAcl::from(options.acl.as_str()))
            .body(body);

        if let Some(md5) = options.content_md5 {
            request = request.content_md5(md5);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, &path.to_string()))?;

        Ok(PutReceipt {
            etag: response.e_tag().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::head_object::HeadObjectError;

    #[test]
    fn test_content_length() {
        assert_eq!(content_length(Some(5)), Some(5));
        assert_eq!(content_length(Some(-1)), None);
        assert_eq!(content_length(None), None);
    }

    #[test]
    fn test_classify_timeout_is_transport() {
        let err: SdkError<HeadObjectError, HttpResponse> = SdkError::timeout_error("too slow");
        assert!(matches!(
            classify(err, "bucket/key"),
            Error::Transport(_)
        ));
    }

    #[test]
    fn test_timestamp_conversion() {
        let dt = DateTime::from_secs(1_700_000_000);
        assert_eq!(
            timestamp(&dt).map(|t| t.as_second()),
            Some(1_700_000_000)
        );
    }
}
