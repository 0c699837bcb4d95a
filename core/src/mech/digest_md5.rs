/*
 * digest_md5.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Sigillo, a client-side SASL engine.
 *
 * Sigillo is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Sigillo is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Sigillo.  If not, see <http://www.gnu.org/licenses/>.
 */

//! DIGEST-MD5 (RFC 2831), qop=auth only. The rspauth line the server sends
//! after this response is answered by the driver with an empty turn.

use std::collections::HashMap;

use md5::{Digest, Md5};
use rand::RngCore;

use super::lower_hex;
use crate::error::SaslError;

const NONCE_COUNT: &str = "00000001";

pub(crate) fn is_supported() -> bool {
    true
}

/// Build the digest-response for a decoded server challenge.
pub fn message(
    challenge: &[u8],
    user: &str,
    passwd: &str,
    service: &str,
) -> Result<Vec<u8>, SaslError> {
    message_with_cnonce(challenge, user, passwd, service, &generate_cnonce())
}

/// Same as [`message`] with the client nonce supplied by the caller.
pub fn message_with_cnonce(
    challenge: &[u8],
    user: &str,
    passwd: &str,
    service: &str,
    cnonce: &str,
) -> Result<Vec<u8>, SaslError> {
    let params = parse_challenge(challenge)?;

    let nonce = params.get("nonce").ok_or(SaslError::BadServerEncoding)?;
    let realm = params.get("realm").map(String::as_str).unwrap_or("");
    // qop is a list; only authentication-without-protection is spoken here.
    if let Some(qop) = params.get("qop") {
        if !qop.split(',').any(|q| q.trim() == "auth") {
            return Err(SaslError::BadServerEncoding);
        }
    }

    let digest_uri = format!("{}/{}", service, realm);

    // A1 = H(user:realm:passwd) ":" nonce ":" cnonce  (md5-sess)
    let mut a1 = md5(format!("{}:{}:{}", user, realm, passwd).as_bytes()).to_vec();
    a1.extend_from_slice(format!(":{}:{}", nonce, cnonce).as_bytes());
    let ha1 = lower_hex(&md5(&a1));

    let a2 = format!("AUTHENTICATE:{}", digest_uri);
    let ha2 = lower_hex(&md5(a2.as_bytes()));

    let response = lower_hex(&md5(
        format!("{}:{}:{}:{}:auth:{}", ha1, nonce, NONCE_COUNT, cnonce, ha2).as_bytes(),
    ));

    Ok(format!(
        "username=\"{}\",realm=\"{}\",nonce=\"{}\",cnonce=\"{}\",nc=\"{}\",digest-uri=\"{}\",response={},qop=auth",
        user, realm, nonce, cnonce, NONCE_COUNT, digest_uri, response
    )
    .into_bytes())
}

fn md5(data: &[u8]) -> [u8; 16] {
    let mut h = Md5::new();
    h.update(data);
    h.finalize().into()
}

fn generate_cnonce() -> String {
    let mut raw = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut raw);
    lower_hex(&raw)
}

/// Split a challenge into `key=value` pairs. Values may be quoted; a quoted
/// value keeps embedded commas and strips backslash escapes.
fn parse_challenge(challenge: &[u8]) -> Result<HashMap<String, String>, SaslError> {
    let text = std::str::from_utf8(challenge).map_err(|_| SaslError::BadServerEncoding)?;
    let mut params = HashMap::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let eq = rest.find('=').ok_or(SaslError::BadServerEncoding)?;
        let key = rest[..eq].trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(SaslError::BadServerEncoding);
        }
        rest = &rest[eq + 1..];
        let value;
        if let Some(stripped) = rest.strip_prefix('"') {
            let mut out = String::new();
            let mut chars = stripped.char_indices();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '"' => {
                        end = Some(i);
                        break;
                    }
                    _ => out.push(c),
                }
            }
            let end = end.ok_or(SaslError::BadServerEncoding)?;
            value = out;
            rest = stripped[end + 1..].trim_start();
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
        } else {
            match rest.find(',') {
                Some(comma) => {
                    value = rest[..comma].trim().to_string();
                    rest = rest[comma + 1..].trim_start();
                }
                None => {
                    value = rest.trim().to_string();
                    rest = "";
                }
            }
        }
        params.insert(key, value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHALLENGE: &[u8] = b"realm=\"elwood.innosoft.com\",nonce=\"OA6MG9tEQGm2hh\",qop=\"auth\",algorithm=md5-sess,charset=utf-8";

    #[test]
    fn challenge_parsing() {
        let params = parse_challenge(CHALLENGE).unwrap();
        assert_eq!(params["realm"], "elwood.innosoft.com");
        assert_eq!(params["nonce"], "OA6MG9tEQGm2hh");
        assert_eq!(params["qop"], "auth");
        assert_eq!(params["algorithm"], "md5-sess");
    }

    #[test]
    fn rfc2831_vector() {
        // The worked example from RFC 2831 section 4.
        let reply = message_with_cnonce(
            CHALLENGE,
            "chris",
            "secret",
            "imap",
            "OA6MHXh6VqTrRk",
        )
        .unwrap();
        let text = String::from_utf8(reply).unwrap();
        assert!(text.contains("username=\"chris\""), "{}", text);
        assert!(text.contains("digest-uri=\"imap/elwood.innosoft.com\""), "{}", text);
        assert!(text.contains("response=d388dad90d4bbd760a152321f2143af7"), "{}", text);
        assert!(text.contains("nc=\"00000001\""), "{}", text);
    }

    #[test]
    fn missing_nonce_rejected() {
        assert!(matches!(
            message_with_cnonce(b"realm=\"x\"", "u", "p", "imap", "cn"),
            Err(SaslError::BadServerEncoding)
        ));
    }

    #[test]
    fn foreign_qop_rejected() {
        let ch = b"nonce=\"abc\",qop=\"auth-conf\"";
        assert!(matches!(
            message_with_cnonce(ch, "u", "p", "imap", "cn"),
            Err(SaslError::BadServerEncoding)
        ));
    }
}
