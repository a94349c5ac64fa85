use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client as S3Client;
use aws_smithy_types::body::SdkBody;
use aws_smithy_types::byte_stream::ByteStream;
use lambda_runtime::Error;
use tracing::info;

use crate::config::Config;
use crate::context::RunContext;
use crate::events::EventPayload;

/// Updates the data layer event map object in the public bucket. The map is a
/// JavaScript file that the automated tag tests load at runtime, so it is
/// uploaded cache-disabled for fast propagation.
pub async fn process(
    payload: &EventPayload,
    ctx: &RunContext,
    s3: &S3Client,
    config: &Config,
) -> Result<(), Error> {
    info!(run_id = %ctx.run_id, "starting update_event_map");

    let Some(event_map) = payload.event_map.as_deref() else {
        return Err("eventMap field is missing from the payload".into());
    };

    let url = upload(
        s3,
        config,
        &config.event_map_bucket,
        &config.event_map_key,
        event_map,
        UploadOptions {
            content_type: "text/javascript",
            public: true,
            no_cache: true,
            encoding: TextEncoding::Utf8,
        },
    )
    .await?;

    info!(run_id = %ctx.run_id, url = %url, "event map was updated");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16,
}

pub struct UploadOptions {
    pub content_type: &'static str,
    pub public: bool,
    pub no_cache: bool,
    pub encoding: TextEncoding,
}

pub fn encode_text(data: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf8 => data.as_bytes().to_vec(),
        TextEncoding::Utf16 => data
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect(),
    }
}

/// Uploads a text object to a bucket and returns its URL. Public uploads must
/// name an explicit bucket: the default bucket is private.
pub async fn upload(
    s3: &S3Client,
    config: &Config,
    bucket: &str,
    key: &str,
    data: &str,
    options: UploadOptions,
) -> Result<String, Error> {
    if options.public && bucket == config.default_bucket {
        return Err(format!(
            "cannot upload publicly to the default bucket {} because it is private",
            config.default_bucket
        )
        .into());
    }

    info!(bucket, key, content_type = options.content_type, "uploading file to S3");

    let encoded = encode_text(data, options.encoding);
    let buffer = ByteStream::new(SdkBody::from(encoded));

    let mut request = s3
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(options.content_type)
        .body(buffer);
    if options.no_cache {
        request = request.cache_control("no-cache, max-age=0");
    }
    if options.public {
        request = request.acl(ObjectCannedAcl::PublicRead);
    }
    request.send().await.map_err(|e| {
        format!(
            "failed uploading file to bucket - {}",
            e.into_service_error()
        )
    })?;

    let url = format!("https://{}.s3.amazonaws.com/{}", bucket, key);
    info!(url = %url, "file uploaded successfully");
    Ok(url)
}
