//! AWS Signature Version 4 request signing
//!
//! Only what Bedrock runtime needs: header-based signing of a request with
//! a fully buffered body.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::config::AwsCredentials;
use crate::error::{IntelligenceError, IntelligenceResult};

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

type HmacSha256 = Hmac<Sha256>;

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> IntelligenceResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| IntelligenceError::Config(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// `kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`
pub fn derive_signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> IntelligenceResult<Vec<u8>> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a single path segment (RFC 3986 unreserved characters kept)
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// The canonical form of a request, as hashed into the string to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub method: String,
    pub canonical_uri: String,
    pub canonical_query: String,
    /// Lowercase header names with trimmed values
    pub headers: Vec<(String, String)>,
    pub payload_hash: String,
}

impl CanonicalRequest {
    pub fn new(method: &str, canonical_uri: &str, canonical_query: &str, payload: &[u8]) -> Self {
        Self {
            method: method.to_uppercase(),
            canonical_uri: canonical_uri.to_string(),
            canonical_query: canonical_query.to_string(),
            headers: Vec::new(),
            payload_hash: sha256_hex(payload),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((name.to_ascii_lowercase(), value.trim().to_string()));
        self
    }

    fn sorted_headers(&self) -> Vec<&(String, String)> {
        let mut headers: Vec<&(String, String)> = self.headers.iter().collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));
        headers
    }

    pub fn signed_headers(&self) -> String {
        self.sorted_headers()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn render(&self) -> String {
        let canonical_headers: String = self
            .sorted_headers()
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.canonical_uri,
            self.canonical_query,
            canonical_headers,
            self.signed_headers(),
            self.payload_hash
        )
    }
}

pub fn amz_date(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn credential_scope(time: &DateTime<Utc>, region: &str, service: &str) -> String {
    format!("{}/{}/{}/aws4_request", time.format("%Y%m%d"), region, service)
}

pub fn string_to_sign(time: &DateTime<Utc>, scope: &str, request: &CanonicalRequest) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date(time),
        scope,
        sha256_hex(request.render().as_bytes())
    )
}

/// Value of the `Authorization` header for `request`
pub fn authorization_header(
    credentials: &AwsCredentials,
    region: &str,
    service: &str,
    time: &DateTime<Utc>,
    request: &CanonicalRequest,
) -> IntelligenceResult<String> {
    let scope = credential_scope(time, region, service);
    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &time.format("%Y%m%d").to_string(),
        region,
        service,
    )?;
    let signature = hex::encode(hmac_sha256(
        &signing_key,
        string_to_sign(time, &scope, request).as_bytes(),
    )?);
    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM,
        credentials.access_key_id,
        scope,
        request.signed_headers(),
        signature
    ))
}

/// Headers to attach to a signed JSON POST
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
    pub session_token: Option<String>,
}

/// Sign a JSON POST to `host` + `request_path` (path already encoded once)
pub fn sign_json_post(
    credentials: &AwsCredentials,
    region: &str,
    service: &str,
    host: &str,
    request_path: &str,
    body: &[u8],
    time: DateTime<Utc>,
) -> IntelligenceResult<SignedHeaders> {
    // Non-S3 services expect each path segment encoded a second time
    let canonical_uri = request_path
        .split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/");
    let amz_date = amz_date(&time);

    let mut request = CanonicalRequest::new("POST", &canonical_uri, "", body)
        .header("content-type", "application/json")
        .header("host", host)
        .header("x-amz-date", &amz_date);
    if let Some(token) = &credentials.session_token {
        request = request.header("x-amz-security-token", token);
    }

    let authorization = authorization_header(credentials, region, service, &time, &request)?;
    Ok(SignedHeaders {
        amz_date,
        authorization,
        session_token: credentials.session_token.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn example_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    fn iam_list_users() -> CanonicalRequest {
        CanonicalRequest::new("GET", "/", "Action=ListUsers&Version=2010-05-08", b"")
            .header("Host", "iam.amazonaws.com")
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .header("X-Amz-Date", "20150830T123600Z")
    }

    #[test]
    fn test_derive_signing_key_reference_vector() {
        let key = derive_signing_key(EXAMPLE_SECRET, "20150830", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_canonical_request_reference_vector() {
        let request = iam_list_users();
        assert_eq!(request.signed_headers(), "content-type;host;x-amz-date");
        assert_eq!(
            sha256_hex(request.render().as_bytes()),
            "f536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59"
        );
    }

    #[test]
    fn test_authorization_header_reference_vector() {
        let credentials = AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: EXAMPLE_SECRET.to_string(),
            session_token: None,
        };
        let header = authorization_header(
            &credentials,
            "us-east-1",
            "iam",
            &example_time(),
            &iam_list_users(),
        )
        .unwrap();
        assert_eq!(
            header,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date, \
             Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        );
    }

    #[test]
    fn test_sign_json_post_double_encodes_model_id() {
        let credentials = AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: EXAMPLE_SECRET.to_string(),
            session_token: Some("session".to_string()),
        };
        let path = format!(
            "/model/{}/invoke",
            encode_segment("anthropic.claude-3-sonnet-20240229-v1:0")
        );
        assert_eq!(path, "/model/anthropic.claude-3-sonnet-20240229-v1%3A0/invoke");

        let signed = sign_json_post(
            &credentials,
            "ap-south-1",
            "bedrock",
            "bedrock-runtime.ap-south-1.amazonaws.com",
            &path,
            b"{}",
            example_time(),
        )
        .unwrap();
        assert_eq!(signed.amz_date, "20150830T123600Z");
        assert_eq!(signed.session_token.as_deref(), Some("session"));
        assert!(signed.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/ap-south-1/bedrock/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date;x-amz-security-token, Signature="
        ));
    }
}
