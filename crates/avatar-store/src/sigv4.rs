// SPDX-License-Identifier: Apache-2.0
//! A minimal AWS SigV4 signer, sufficient for DigitalOcean Spaces' S3-
//! compatible API: header-signed `PUT`/`HEAD`/`GET` requests and
//! query-string-presigned `GET` URLs.
//!
//! This is not a general-purpose SigV4 implementation (no chunked transfer,
//! no multipart) — it covers exactly the request shapes `avatar-store`
//! issues.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::StoreError;

type HmacSha256 = Hmac<Sha256>;

/// Static credentials for the object-store endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

fn hmac(key: &[u8], data: &str) -> Result<Vec<u8>, StoreError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| StoreError::Signing(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn signing_key(creds: &Credentials, date_stamp: &str) -> Result<Vec<u8>, StoreError> {
    let k_date = hmac(format!("AWS4{}", creds.secret_key).as_bytes(), date_stamp)?;
    let k_region = hmac(&k_date, &creds.region)?;
    let k_service = hmac(&k_region, "s3")?;
    hmac(&k_service, "aws4_request")
}

/// Build the `Authorization` header for a header-signed request (PUT/HEAD/GET
/// with the body hash known up front).
#[allow(clippy::too_many_arguments)]
pub fn sign_request(
    creds: &Credentials,
    method: &str,
    host: &str,
    canonical_uri: &str,
    payload_sha256: &str,
    now: DateTime<Utc>,
) -> Result<(String, String, String), StoreError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let canonical_headers = format!("host:{host}\nx-amz-content-sha256:{payload_sha256}\nx-amz-date:{amz_date}\n");
    let signed_headers = "host;x-amz-content-sha256;x-amz-date";

    let canonical_request =
        format!("{method}\n{canonical_uri}\n\n{canonical_headers}\n{signed_headers}\n{payload_sha256}");

    let credential_scope = format!("{date_stamp}/{}/s3/aws4_request", creds.region);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(creds, &date_stamp)?;
    let signature = hex::encode(hmac(&key, &string_to_sign)?);

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        creds.access_key
    );

    Ok((authorization, amz_date, payload_sha256.to_string()))
}

/// Build a presigned query string (`X-Amz-*` params) for a `GET` request
/// valid for `expires_secs` seconds from `now`.
pub fn presign_get_url(
    creds: &Credentials,
    host: &str,
    canonical_uri: &str,
    now: DateTime<Utc>,
    expires_secs: u64,
) -> Result<String, StoreError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let credential_scope = format!("{date_stamp}/{}/s3/aws4_request", creds.region);
    let credential = urlencoding::encode(&format!("{}/{credential_scope}", creds.access_key)).into_owned();

    let mut query_pairs = vec![
        ("X-Amz-Algorithm".to_string(), "AWS4-HMAC-SHA256".to_string()),
        ("X-Amz-Credential".to_string(), credential),
        ("X-Amz-Date".to_string(), amz_date.clone()),
        ("X-Amz-Expires".to_string(), expires_secs.to_string()),
        ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
    ];
    query_pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let canonical_query = query_pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_headers = format!("host:{host}\n");
    let canonical_request =
        format!("GET\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\nhost\nUNSIGNED-PAYLOAD");

    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(creds, &date_stamp)?;
    let signature = hex::encode(hmac(&key, &string_to_sign)?);

    Ok(format!("https://{host}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn creds() -> Credentials {
        Credentials { access_key: "AKIDEXAMPLE".into(), secret_key: "secret".into(), region: "nyc3".into() }
    }

    #[test]
    fn sign_request_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap();
        let a = sign_request(&creds(), "PUT", "bucket.nyc3.digitaloceanspaces.com", "/user-avatar/alice.webp", &sha256_hex(b"x"), now).unwrap();
        let b = sign_request(&creds(), "PUT", "bucket.nyc3.digitaloceanspaces.com", "/user-avatar/alice.webp", &sha256_hex(b"x"), now).unwrap();
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn presigned_url_contains_signature() {
        let now = Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap();
        let url = presign_get_url(&creds(), "bucket.nyc3.digitaloceanspaces.com", "/user-avatar/alice.webp", now, 300).unwrap();
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.starts_with("https://bucket.nyc3.digitaloceanspaces.com/user-avatar/alice.webp?"));
    }
}
