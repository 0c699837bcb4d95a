/*
 * scram.rs
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

//! SCRAM-SHA-1 (RFC 5802) and SCRAM-SHA-256 (RFC 7677) client exchange.
//!
//! The exchange object lives in the session across turns: client-first,
//! client-final with proof, then verification of the server signature. The
//! final verification turn yields an explicitly empty message.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::SaslError;

pub(crate) fn is_supported() -> bool {
    true
}

/// Hash family for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScramKind {
    Sha1,
    Sha256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    AwaitServerFirst,
    AwaitServerFinal,
    Done,
}

/// State carried between turns.
#[derive(Debug)]
pub struct ScramExchange {
    kind: ScramKind,
    phase: Phase,
    client_nonce: String,
    gs2_header: String,
    client_first_bare: String,
    server_signature: Vec<u8>,
}

impl ScramExchange {
    pub fn new(kind: ScramKind, authzid: Option<&str>, user: &str) -> Self {
        Self::with_nonce(kind, authzid, user, generate_nonce())
    }

    /// Exchange with a caller-chosen nonce.
    pub fn with_nonce(kind: ScramKind, authzid: Option<&str>, user: &str, nonce: String) -> Self {
        let gs2_header = match authzid {
            Some(a) if !a.is_empty() => format!("n,a={},", sasl_name(a)),
            _ => "n,,".to_string(),
        };
        let client_first_bare = format!("n={},r={}", sasl_name(user), nonce);
        ScramExchange {
            kind,
            phase: Phase::Initial,
            client_nonce: nonce,
            gs2_header,
            client_first_bare,

            server_signature: Vec::new(),
        }
    }

    /// Advance the exchange with the decoded server data for this turn.
    ///
    /// Returns the next client message; the empty message signals a finished
    /// exchange (the driver maps it to the explicit-empty wire form). The
    /// first turn ignores `serverdata` and emits client-first; this also
    /// covers the carrier having dropped an oversized initial response.
    pub fn step(&mut self, serverdata: &[u8], passwd: &str) -> Result<Option<Vec<u8>>, SaslError> {
        match self.phase {
            Phase::Initial => {
                self.phase = Phase::AwaitServerFirst;
                Ok(Some(self.client_first()))
            }
            Phase::AwaitServerFirst if serverdata.is_empty() => Ok(Some(self.client_first())),
            Phase::AwaitServerFirst => {
                self.phase = Phase::AwaitServerFinal;
                self.client_final(serverdata, passwd).map(Some)
            }
            Phase::AwaitServerFinal => {
                self.phase = Phase::Done;
                self.verify_server_final(serverdata)?;
                Ok(Some(Vec::new()))
            }
            Phase::Done => Ok(None),
        }
    }

    fn client_first(&self) -> Vec<u8> {
        format!("{}{}", self.gs2_header, self.client_first_bare).into_bytes()
    }

    fn client_final(&mut self, server_first: &[u8], passwd: &str) -> Result<Vec<u8>, SaslError> {
        let server_first =
            std::str::from_utf8(server_first).map_err(|_| SaslError::BadServerEncoding)?;
        let (nonce, salt_b64, iter_str) = parse_server_first(server_first)?;
        if !nonce.starts_with(&self.client_nonce) {
            return Err(SaslError::BadServerEncoding);
        }
        let salt = BASE64
            .decode(salt_b64)
            .map_err(|_| SaslError::BadServerEncoding)?;
        let iterations: u32 = iter_str.parse().map_err(|_| SaslError::BadServerEncoding)?;

        let salted_password = self.hi(passwd, &salt, iterations);
        let client_key = self.hmac(&salted_password, b"Client Key");
        let stored_key = self.h(&client_key);
        let server_key = self.hmac(&salted_password, b"Server Key");

        let channel_binding = BASE64.encode(self.gs2_header.as_bytes());
        let client_final_no_proof = format!("c={},r={}", channel_binding, nonce);
        let auth_message = format!(
            "{},{},{}",
            self.client_first_bare, server_first, client_final_no_proof
        );
        let client_signature = self.hmac(&stored_key, auth_message.as_bytes());
        let proof: Vec<u8> = client_key
            .iter()
            .zip(client_signature.iter())
            .map(|(k, s)| k ^ s)
            .collect();
        self.server_signature = self.hmac(&server_key, auth_message.as_bytes());

        Ok(format!("{},p={}", client_final_no_proof, BASE64.encode(proof)).into_bytes())
    }

    fn verify_server_final(&self, server_final: &[u8]) -> Result<(), SaslError> {
        let text = std::str::from_utf8(server_final).map_err(|_| SaslError::BadServerEncoding)?;
        for part in text.split(',') {
            if let Some(err) = part.strip_prefix("e=") {
                return Err(SaslError::MechanismFailed(format!("server error: {}", err)));
            }
            if let Some(sig) = part.strip_prefix("v=") {
                let sig = BASE64
                    .decode(sig.trim())
                    .map_err(|_| SaslError::BadServerEncoding)?;
                if sig != self.server_signature {
                    return Err(SaslError::MechanismFailed(
                        "server signature mismatch".to_string(),
                    ));
                }
                return Ok(());
            }
        }
        Err(SaslError::BadServerEncoding)
    }

    fn hi(&self, passwd: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
        match self.kind {
            ScramKind::Sha1 => {
                let mut out = [0u8; 20];
                pbkdf2_hmac::<Sha1>(passwd.as_bytes(), salt, iterations, &mut out);
                out.to_vec()
            }
            ScramKind::Sha256 => {
                let mut out = [0u8; 32];
                pbkdf2_hmac::<Sha256>(passwd.as_bytes(), salt, iterations, &mut out);
                out.to_vec()
            }
        }
    }

    fn hmac(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        match self.kind {
            ScramKind::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            ScramKind::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    fn h(&self, data: &[u8]) -> Vec<u8> {
        match self.kind {
            ScramKind::Sha1 => Sha1::digest(data).to_vec(),
            ScramKind::Sha256 => Sha256::digest(data).to_vec(),
        }
    }
}

fn generate_nonce() -> String {
    let mut raw = [0u8; 18];
    rand::thread_rng().fill_bytes(&mut raw);
    BASE64.encode(raw)
}

/// `=` and `,` are reserved in saslname (RFC 5802 section 5.1).
fn sasl_name(s: &str) -> String {
    s.replace('=', "=3D").replace(',', "=2C")
}

fn parse_server_first(input: &str) -> Result<(&str, &str, &str), SaslError> {
    let mut nonce = None;
    let mut salt = None;
    let mut iterations = None;
    for part in input.split(',') {
        if let Some(v) = part.strip_prefix("r=") {
            nonce = Some(v);
        } else if let Some(v) = part.strip_prefix("s=") {
            salt = Some(v);
        } else if let Some(v) = part.strip_prefix("i=") {
            iterations = Some(v);
        }
    }
    match (nonce, salt, iterations) {
        (Some(r), Some(s), Some(i)) => Ok((r, s, i)),
        _ => Err(SaslError::BadServerEncoding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc5802_sha1_exchange() {
        let mut ex = ScramExchange::with_nonce(
            ScramKind::Sha1,
            None,
            "user",
            "fyko+d2lbbFgONRv9qkxdawL".to_string(),
        );
        let first = ex.step(b"", "pencil").unwrap().unwrap();
        assert_eq!(first, b"n,,n=user,r=fyko+d2lbbFgONRv9qkxdawL".to_vec());

        let server_first =
            b"r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,s=QSXCR+Q6sek8bf92,i=4096";
        let final_msg = ex.step(server_first, "pencil").unwrap().unwrap();
        assert_eq!(
            final_msg,
            b"c=biws,r=fyko+d2lbbFgONRv9qkxdawL3rfcNHYJY1ZVvWVs7j,p=v0X8v3Bz2T0CJGbJQyF0X+HI4Ts="
                .to_vec()
        );

        let done = ex.step(b"v=rmF9pqV8S7suAoZWja4dJRkFsKQ=", "pencil").unwrap();
        assert_eq!(done, Some(Vec::new()));
    }

    #[test]
    fn rfc7677_sha256_exchange() {
        let mut ex = ScramExchange::with_nonce(
            ScramKind::Sha256,
            None,
            "user",
            "rOprNGfwEbeRWgbNEkqO".to_string(),
        );
        let first = ex.step(b"", "pencil").unwrap().unwrap();
        assert_eq!(first, b"n,,n=user,r=rOprNGfwEbeRWgbNEkqO".to_vec());

        let server_first = b"r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096";
        let final_msg = ex.step(server_first, "pencil").unwrap().unwrap();
        assert_eq!(
            final_msg,
            b"c=biws,r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,p=dHzbZapWIk4jUhN+Ute9ytag9zjfMHgsqmmiz7AndVQ="
                .to_vec()
        );

        let done = ex
            .step(b"v=6rriTRBi23WpRR/wtup+mMhUZUn/dB5nLTJRsjl95G4=", "pencil")
            .unwrap();
        assert_eq!(done, Some(Vec::new()));
    }

    #[test]
    fn server_nonce_must_extend_client_nonce() {
        let mut ex =
            ScramExchange::with_nonce(ScramKind::Sha256, None, "user", "abc".to_string());
        ex.step(b"", "pencil").unwrap();
        let err = ex.step(b"r=zzz,s=QSXCR+Q6sek8bf92,i=4096", "pencil");
        assert!(matches!(err, Err(SaslError::BadServerEncoding)));
    }

    #[test]
    fn server_error_is_fatal() {
        let mut ex =
            ScramExchange::with_nonce(ScramKind::Sha256, None, "user", "abc".to_string());
        ex.step(b"", "pencil").unwrap();
        ex.step(b"r=abcdef,s=QSXCR+Q6sek8bf92,i=4096", "pencil").unwrap();
        let err = ex.step(b"e=invalid-proof", "pencil");
        assert!(matches!(err, Err(SaslError::MechanismFailed(_))));
    }

    #[test]
    fn dropped_initial_response_is_replayed() {
        let mut ex =
            ScramExchange::with_nonce(ScramKind::Sha256, None, "user", "abc".to_string());
        let first = ex.step(b"", "pencil").unwrap().unwrap();
        // Server sent an empty challenge because no initial response arrived.
        let again = ex.step(b"", "pencil").unwrap().unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn reserved_characters_in_names_are_escaped() {
        let ex = ScramExchange::with_nonce(
            ScramKind::Sha256,
            Some("a,b=c"),
            "u=x,y",
            "n".to_string(),
        );
        assert_eq!(ex.gs2_header, "n,a=a=2Cb=3Dc,");
        assert_eq!(ex.client_first_bare, "n=u=3Dx=2Cy,r=n");
    }
}
