// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Authorization header construction
//!
//! Two schemes are supported: a static bearer token, and LMv1, where each
//! request is signed with HMAC-SHA256 over `GET<epoch ms><resource path>`.
//! The hex digest is base64 (URL alphabet) encoded and sent as
//! `LMv1 <access id>:<signature>:<epoch ms>`.

use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Credentials used by the transport client
#[derive(Clone)]
pub enum Credentials {
    Bearer { token: String },
    LmV1 { access_id: String, access_key: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer { .. } => f.write_str("Bearer(***)"),
            Credentials::LmV1 { access_id, .. } => write!(f, "LmV1({}, ***)", access_id),
        }
    }
}

impl Credentials {
    /// Value of the Authorization header for a request to `resource_path`
    pub fn authorization(&self, resource_path: &str) -> Result<String> {
        match self {
            Credentials::Bearer { token } => Ok(format!("Bearer {}", token)),
            Credentials::LmV1 {
                access_id,
                access_key,
            } => {
                let epoch = chrono::Utc::now().timestamp_millis();
                lmv1_signature(access_id, access_key, resource_path, epoch)
            }
        }
    }
}

/// Build an LMv1 Authorization header value for a GET request
pub fn lmv1_signature(
    access_id: &str,
    access_key: &str,
    resource_path: &str,
    epoch_ms: i64,
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(access_key.as_bytes())
        .map_err(|e| anyhow!("Invalid LMv1 access key: {}", e))?;
    mac.update(format!("GET{}{}", epoch_ms, resource_path).as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    let signature = URL_SAFE.encode(digest.as_bytes());

    Ok(format!("LMv1 {}:{}:{}", access_id, signature, epoch_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let creds = Credentials::Bearer {
            token: "abc".to_string(),
        };
        assert_eq!(creds.authorization("/device/devices").unwrap(), "Bearer abc");
    }

    #[test]
    fn test_lmv1_shape() {
        let header = lmv1_signature("id123", "secret", "/device/devices", 1_700_000_000_000).unwrap();
        let rest = header.strip_prefix("LMv1 ").unwrap();
        let parts: Vec<&str> = rest.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "id123");
        assert_eq!(parts[2], "1700000000000");

        // base64 of a 64-char hex digest
        let decoded = URL_SAFE.decode(parts[1]).unwrap();
        assert_eq!(decoded.len(), 64);
        assert!(decoded.iter().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_lmv1_deterministic_for_same_inputs() {
        let a = lmv1_signature("id", "key", "/a", 1).unwrap();
        let b = lmv1_signature("id", "key", "/a", 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lmv1_depends_on_path_and_key() {
        let base = lmv1_signature("id", "key", "/a", 1).unwrap();
        assert_ne!(base, lmv1_signature("id", "key", "/b", 1).unwrap());
        assert_ne!(base, lmv1_signature("id", "other", "/a", 1).unwrap());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = Credentials::LmV1 {
            access_id: "id".to_string(),
            access_key: "topsecret".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("id"));
    }
}
