use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use log::info;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use rusoto_core::{HttpClient, Region};
use rusoto_credential::ChainProvider;
use rusoto_s3::{PutObjectRequest, S3Client, S3};
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};
use url::Url;

/// nextflow writes its log here, relative to the launch directory
pub static NEXTFLOW_LOG: &str = ".nextflow.log";

/// Characters an execution name can't carry verbatim inside one path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Rendering context for the remote log path
#[derive(Serialize)]
struct LogPathContext {
    prefix: String,
    execution_name: String,
}

/// Remote location of the nextflow log for one execution
pub fn remote_log_url(prefix: &str, execution_name: &str) -> Result<Url> {
    /// included remote log path template
    static LOG_PATH: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/log_path.txt"));
    let mut tt = TinyTemplate::new();
    // paths, not HTML
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("log_path", LOG_PATH)?;

    let context = LogPathContext {
        prefix: prefix.trim_end_matches('/').to_string(),
        execution_name: utf8_percent_encode(execution_name.trim_matches('/'), SEGMENT).to_string(),
    };
    let rendered = tt.render("log_path", &context)?;
    Url::parse(rendered.trim()).with_context(|| format!("Remote log path {rendered} is not a URL"))
}

/// Remote storage the log file is shipped to
pub trait LogStore {
    async fn upload(&self, local: &Path, remote: &Url) -> Result<()>;
}

/// A store that could not be set up turns every upload into an error, not the run
impl<T: LogStore> LogStore for Option<T> {
    async fn upload(&self, local: &Path, remote: &Url) -> Result<()> {
        match self {
            Some(store) => store.upload(local, remote).await,
            None => Err(anyhow!("No log store configured")),
        }
    }
}

/// Object storage backed log store
///
/// `s3://bucket/key` destinations name their own bucket. Any other scheme (`latch:///...`) is
/// stored under the configured bucket with the URL path as key.
pub struct S3LogStore {
    client: S3Client,
    bucket: String,
}

impl S3LogStore {
    pub fn new(bucket: &str, region: &str, endpoint: Option<&str>) -> Result<S3LogStore> {
        let region = match endpoint {
            Some(endpoint) => Region::Custom { name: region.to_string(), endpoint: endpoint.to_string() },
            None => Region::from_str(region).with_context(|| format!("Unknown region {region}"))?,
        };
        let http = HttpClient::new().context("Can't create object storage HTTP client")?;
        let client = S3Client::new_with(http, ChainProvider::new(), region);
        Ok(S3LogStore { client, bucket: bucket.to_string() })
    }
}

/// Bucket and object key for a remote path, the key percent-decoded
fn locate(default_bucket: &str, remote: &Url) -> Result<(String, String)> {
    let key = percent_decode_str(remote.path().trim_start_matches('/'))
        .decode_utf8()
        .with_context(|| format!("Remote path {remote} is not UTF-8"))?
        .into_owned();
    if key.is_empty() {
        return Err(anyhow!("Remote path {remote} has no object key"));
    }
    let bucket = match (remote.scheme(), remote.host_str()) {
        ("s3", Some(bucket)) => bucket.to_string(),
        _ => default_bucket.to_string(),
    };
    Ok((bucket, key))
}

impl LogStore for S3LogStore {
    async fn upload(&self, local: &Path, remote: &Url) -> Result<()> {
        let (bucket, key) = locate(&self.bucket, remote)?;
        let body = tokio::fs::read(local)
            .await
            .with_context(|| format!("Can't read {}", local.display()))?;

        info!("Putting {} bytes to s3://{bucket}/{key}", body.len());
        let request = PutObjectRequest {
            bucket,
            key,
            body: Some(body.into()),
            content_type: Some("text/plain".to_string()),
            ..Default::default()
        };
        self.client.put_object(request).await?;
        Ok(())
    }
}
