//! Cloud Storage uploads and V4 signed download URLs.
//!
//! # Signing
//! ```text
//! canonical request  = GET, /<bucket>/<object>, sorted query, host header
//! string to sign     = GOOG4-RSA-SHA256, timestamp, scope, hex(sha256(canonical))
//! signature          = IAM signBlob(string to sign) as lowercase hex
//! ```
//! Signing goes through the IAM Credentials API, so no private key ever
//! needs to live in the process.

use std::fmt::Write as _;

use async_trait::async_trait;
use axum::body::Bytes;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::GoogleConfig;
use crate::integrations::google::auth::GoogleAuth;
use crate::integrations::types::{json_body, send, IntegrationError};
use crate::resilience::RetryPolicy;

const GCS: &str = "gcs";
const IAM: &str = "iam";
const ALGORITHM: &str = "GOOG4-RSA-SHA256";

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// `gs://<bucket>/<object>`.
    pub gs_path: String,
    /// Time-limited public download link.
    pub signed_url: String,
}

/// Blob storage for user uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under a fresh unique name derived from `filename` and
    /// return a signed download URL for it.
    async fn upload_and_sign(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<StoredObject, IntegrationError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignBlobResponse {
    signed_blob: String,
}

/// Google Cloud Storage over the JSON API.
pub struct GcsStore {
    client: reqwest::Client,
    auth: GoogleAuth,
    config: GoogleConfig,
    retry: RetryPolicy,
}

impl GcsStore {
    pub fn new(client: reqwest::Client, auth: GoogleAuth, config: GoogleConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            auth,
            config,
            retry,
        }
    }

    /// `<prefix>/<uuid>_<filename>`; an empty filename becomes `upload`.
    pub fn object_name(prefix: &str, filename: &str) -> String {
        let filename = if filename.is_empty() { "upload" } else { filename };
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}_{filename}", Uuid::new_v4())
        } else {
            format!("{prefix}/{}_{filename}", Uuid::new_v4())
        }
    }

    async fn upload_once(
        &self,
        bucket: &str,
        object: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), IntegrationError> {
        let token = self.auth.access_token().await?;
        let base = self.config.storage_base_url.trim_end_matches('/');
        let request = self
            .client
            .post(format!("{base}/upload/storage/v1/b/{bucket}/o"))
            .query(&[("uploadType", "media"), ("name", object)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data);
        send(GCS, request).await?;
        Ok(())
    }

    async fn sign(&self, bucket: &str, object: &str) -> Result<String, IntegrationError> {
        let signer = self
            .auth
            .service_account_email(self.config.signer_email.as_deref())
            .await?;
        let request = SignedUrlRequest {
            host: &self.config.signed_url_host,
            bucket,
            object,
            signer: &signer,
            timestamp: Utc::now(),
            expires_secs: self.config.signed_url_ttl_secs,
        };

        let token = self.auth.access_token().await?;
        let iam = self.config.iam_base_url.trim_end_matches('/');
        let payload = BASE64.encode(request.string_to_sign());
        let call = self
            .client
            .post(format!("{iam}/v1/projects/-/serviceAccounts/{signer}:signBlob"))
            .bearer_auth(token)
            .json(&json!({ "payload": payload }));
        let response = send(IAM, call).await?;
        let signed: SignBlobResponse = json_body(IAM, response).await?;
        let signature = BASE64
            .decode(signed.signed_blob)
            .map_err(|e| IntegrationError::decode(IAM, e.to_string()))?;

        Ok(request.url(&hex(&signature)))
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn upload_and_sign(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<StoredObject, IntegrationError> {
        let bucket = self
            .config
            .bucket_name
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("GCS_BUCKET_NAME"))?;
        let object = Self::object_name(&self.config.upload_prefix, filename);

        self.retry
            .retry_if(IntegrationError::is_transient)
            .run(|| self.upload_once(bucket, &object, data.clone(), content_type))
            .await?;
        let signed_url = self.sign(bucket, &object).await?;

        Ok(StoredObject {
            gs_path: format!("gs://{bucket}/{object}"),
            signed_url,
        })
    }
}

/// Inputs of a V4 signed GET URL.
#[derive(Debug, Clone)]
pub(crate) struct SignedUrlRequest<'a> {
    pub host: &'a str,
    pub bucket: &'a str,
    pub object: &'a str,
    pub signer: &'a str,
    pub timestamp: DateTime<Utc>,
    pub expires_secs: u64,
}

impl SignedUrlRequest<'_> {
    fn datestamp(&self) -> String {
        self.timestamp.format("%Y%m%d").to_string()
    }

    fn request_timestamp(&self) -> String {
        self.timestamp.format("%Y%m%dT%H%M%SZ").to_string()
    }

    fn scope(&self) -> String {
        format!("{}/auto/storage/goog4_request", self.datestamp())
    }

    fn path(&self) -> String {
        format!("/{}/{}", self.bucket, encode(self.object, true))
    }

    /// Query string without the signature, keys already in sorted order.
    pub fn canonical_query(&self) -> String {
        let credential = format!("{}/{}", self.signer, self.scope());
        [
            ("X-Goog-Algorithm", ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", self.request_timestamp()),
            ("X-Goog-Expires", self.expires_secs.to_string()),
            ("X-Goog-SignedHeaders", "host".to_string()),
        ]
        .iter()
        .map(|(k, v)| format!("{k}={}", encode(v, false)))
        .collect::<Vec<_>>()
        .join("&")
    }

    pub fn canonical_request(&self) -> String {
        format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            self.path(),
            self.canonical_query(),
            self.host
        )
    }

    pub fn string_to_sign(&self) -> String {
        let digest = Sha256::digest(self.canonical_request().as_bytes());
        format!(
            "{ALGORITHM}\n{}\n{}\n{}",
            self.request_timestamp(),
            self.scope(),
            hex(&digest)
        )
    }

    pub fn url(&self, signature_hex: &str) -> String {
        format!(
            "https://{}{}?{}&X-Goog-Signature={signature_hex}",
            self.host,
            self.path(),
            self.canonical_query()
        )
    }
}

/// RFC 3986 percent-encoding; `/` survives when `keep_slash` is set.
fn encode(value: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(timestamp: DateTime<Utc>) -> SignedUrlRequest<'static> {
        SignedUrlRequest {
            host: "storage.googleapis.com",
            bucket: "audits",
            object: "uploads/abc_my policy.pdf",
            signer: "signer@p.iam.gserviceaccount.com",
            timestamp,
            expires_secs: 604800,
        }
    }

    #[test]
    fn test_encoding() {
        assert_eq!(encode("a b/c~d", true), "a%20b/c~d");
        assert_eq!(encode("a b/c~d", false), "a%20b%2Fc~d");
        assert_eq!(encode("é", false), "%C3%A9");
    }

    #[test]
    fn test_canonical_request_layout() {
        let ts = Utc.with_ymd_and_hms(2025, 9, 1, 12, 30, 5).unwrap();
        let req = request(ts);

        assert_eq!(
            req.canonical_query(),
            "X-Goog-Algorithm=GOOG4-RSA-SHA256\
             &X-Goog-Credential=signer%40p.iam.gserviceaccount.com%2F20250901%2Fauto%2Fstorage%2Fgoog4_request\
             &X-Goog-Date=20250901T123005Z\
             &X-Goog-Expires=604800\
             &X-Goog-SignedHeaders=host"
        );

        let canonical = req.canonical_request();
        let lines: Vec<_> = canonical.split('\n').collect();
        assert_eq!(lines[0], "GET");
        assert_eq!(lines[1], "/audits/uploads/abc_my%20policy.pdf");
        assert_eq!(lines[3], "host:storage.googleapis.com");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "host");
        assert_eq!(lines[6], "UNSIGNED-PAYLOAD");

        let to_sign = req.string_to_sign();
        let lines: Vec<_> = to_sign.split('\n').collect();
        assert_eq!(lines[0], "GOOG4-RSA-SHA256");
        assert_eq!(lines[1], "20250901T123005Z");
        assert_eq!(lines[2], "20250901/auto/storage/goog4_request");
        assert_eq!(lines[3].len(), 64);
    }

    #[test]
    fn test_object_names_are_unique_and_prefixed() {
        let a = GcsStore::object_name("uploads", "policy.pdf");
        let b = GcsStore::object_name("uploads", "policy.pdf");
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with("_policy.pdf"));
        assert_ne!(a, b);
        assert!(GcsStore::object_name("", "").ends_with("_upload"));
        assert!(!GcsStore::object_name("", "x").contains('/'));
    }

    #[tokio::test]
    async fn test_upload_then_sign() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/audits/o"))
            .and(query_param("uploadType", "media"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(header("content-type", "application/pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/-/serviceAccounts/signer@p.iam.gserviceaccount.com:signBlob",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keyId": "k1",
                "signedBlob": BASE64.encode([0xde, 0xad, 0xbe, 0xef])
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = GoogleConfig {
            storage_base_url: server.uri(),
            iam_base_url: server.uri(),
            bucket_name: Some("audits".into()),
            signer_email: Some("signer@p.iam.gserviceaccount.com".into()),
            ..GoogleConfig::default()
        };
        let auth = GoogleAuth::new(reqwest::Client::new(), Some("ya29.test".into()), &server.uri());
        let store = GcsStore::new(reqwest::Client::new(), auth, config, RetryPolicy::new(3, 0.0, 2.0));

        let stored = store
            .upload_and_sign(Bytes::from_static(b"%PDF-1.4"), "policy.pdf", "application/pdf")
            .await
            .unwrap();
        assert!(stored.gs_path.starts_with("gs://audits/uploads/"));
        assert!(stored.gs_path.ends_with("_policy.pdf"));
        assert!(stored
            .signed_url
            .starts_with("https://storage.googleapis.com/audits/uploads/"));
        assert!(stored.signed_url.contains("X-Goog-Expires=604800"));
        assert!(stored.signed_url.ends_with("&X-Goog-Signature=deadbeef"));
    }

    #[tokio::test]
    async fn test_upload_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/audits/o"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let config = GoogleConfig {
            storage_base_url: server.uri(),
            bucket_name: Some("audits".into()),
            ..GoogleConfig::default()
        };
        let auth = GoogleAuth::new(reqwest::Client::new(), Some("t".into()), &server.uri());
        let store = GcsStore::new(reqwest::Client::new(), auth, config, RetryPolicy::new(2, 0.0, 2.0));

        let err = store
            .upload_and_sign(Bytes::from_static(b"x"), "a.txt", "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let auth = GoogleAuth::new(reqwest::Client::new(), Some("t".into()), "http://127.0.0.1:9");
        let store = GcsStore::new(
            reqwest::Client::new(),
            auth,
            GoogleConfig::default(),
            RetryPolicy::default(),
        );
        let err = store
            .upload_and_sign(Bytes::new(), "a.pdf", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured("GCS_BUCKET_NAME")));
    }
}
