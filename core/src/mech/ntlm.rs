/*
 * ntlm.rs
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

//! NTLM over SASL, NTLMv2 responses only.
//!
//! Three messages: the client's type-1 negotiate, the server's type-2
//! challenge, the client's type-3 authenticate carrying the NTLMv2 and LMv2
//! proofs. The type-2 challenge is consumed in the same turn that produces
//! the type-3, so no context outlives a turn.

use hmac::{Hmac, Mac};
use md4::{Digest as _, Md4};
use md5::Md5;
use rand::RngCore;

use crate::error::SaslError;

type HmacMd5 = Hmac<Md5>;

const SIGNATURE: &[u8] = b"NTLMSSP\0";

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const NEGOTIATE_OEM: u32 = 0x0000_0002;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SESSIONSECURITY: u32 = 0x0008_0000;
const NEGOTIATE_TARGET_INFO: u32 = 0x0080_0000;
const NEGOTIATE_128: u32 = 0x2000_0000;
const NEGOTIATE_56: u32 = 0x8000_0000;

/// Seconds between the Windows FILETIME epoch (1601) and the Unix epoch,
/// in 100ns units.
const FILETIME_EPOCH_DIFF: u64 = 116_444_736_000_000_000;

pub(crate) fn is_supported() -> bool {
    true
}

/// Parsed type-2 challenge.
pub struct Type2Message {
    pub challenge: [u8; 8],
    pub flags: u32,
    pub target_info: Option<Vec<u8>>,
}

/// Build the type-1 negotiate message. Domain and workstation are left
/// empty; the server supplies the target in its type-2 reply.
pub fn type1_message() -> Vec<u8> {
    let flags = NEGOTIATE_UNICODE
        | NEGOTIATE_OEM
        | REQUEST_TARGET
        | NEGOTIATE_NTLM
        | NEGOTIATE_ALWAYS_SIGN
        | NEGOTIATE_EXTENDED_SESSIONSECURITY
        | NEGOTIATE_TARGET_INFO
        | NEGOTIATE_128
        | NEGOTIATE_56;

    let mut msg = Vec::with_capacity(40);
    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&1u32.to_le_bytes());
    msg.extend_from_slice(&flags.to_le_bytes());
    // Empty domain and workstation security buffers.
    msg.extend_from_slice(&[0u8; 8]);
    msg.extend_from_slice(&[0u8; 8]);
    msg
}

/// Decode the server's type-2 challenge.
pub fn decode_type2(data: &[u8]) -> Result<Type2Message, SaslError> {
    if data.len() < 32 || &data[..8] != SIGNATURE {
        return Err(SaslError::BadServerEncoding);
    }
    let msg_type = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    if msg_type != 2 {
        return Err(SaslError::BadServerEncoding);
    }

    let flags = u32::from_le_bytes([data[20], data[21], data[22], data[23]]);
    let mut challenge = [0u8; 8];
    challenge.copy_from_slice(&data[24..32]);

    let target_info = if data.len() >= 48 && flags & NEGOTIATE_TARGET_INFO != 0 {
        let len = u16::from_le_bytes([data[40], data[41]]) as usize;
        let offset = u32::from_le_bytes([data[44], data[45], data[46], data[47]]) as usize;
        if len > 0 && offset.checked_add(len).is_some_and(|end| end <= data.len()) {
            Some(data[offset..offset + len].to_vec())
        } else {
            None
        }
    } else {
        None
    };

    Ok(Type2Message {
        challenge,
        flags,
        target_info,
    })
}

/// Build the type-3 authenticate message.
pub fn type3_message(user: &str, passwd: &str, type2: &Type2Message) -> Result<Vec<u8>, SaslError> {
    let mut client_challenge = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut client_challenge);
    type3_with_entropy(user, passwd, type2, client_challenge, filetime_now())
}

/// Deterministic core of [`type3_message`].
pub(crate) fn type3_with_entropy(
    user: &str,
    passwd: &str,
    type2: &Type2Message,
    client_challenge: [u8; 8],
    timestamp: u64,
) -> Result<Vec<u8>, SaslError> {
    let (user, domain) = split_domain(user);

    let (nt_response, lm_response) = ntlmv2_responses(
        user,
        domain,
        passwd,
        &type2.challenge,
        &client_challenge,
        type2.target_info.as_deref(),
        timestamp,
    );

    let domain_bytes = utf16le(domain);
    let user_bytes = utf16le(user);
    let workstation_bytes: Vec<u8> = Vec::new();

    let base_offset: u32 = 64;
    let lm_offset = base_offset;
    let nt_offset = lm_offset + lm_response.len() as u32;
    let domain_offset = nt_offset + nt_response.len() as u32;
    let user_offset = domain_offset + domain_bytes.len() as u32;
    let workstation_offset = user_offset + user_bytes.len() as u32;
    let session_key_offset = workstation_offset + workstation_bytes.len() as u32;

    let mut msg = Vec::with_capacity(session_key_offset as usize);
    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&3u32.to_le_bytes());
    security_buffer(&mut msg, lm_response.len(), lm_offset);
    security_buffer(&mut msg, nt_response.len(), nt_offset);
    security_buffer(&mut msg, domain_bytes.len(), domain_offset);
    security_buffer(&mut msg, user_bytes.len(), user_offset);
    security_buffer(&mut msg, workstation_bytes.len(), workstation_offset);
    // Session key: empty.
    security_buffer(&mut msg, 0, session_key_offset);
    msg.extend_from_slice(&type2.flags.to_le_bytes());
    msg.extend_from_slice(&lm_response);
    msg.extend_from_slice(&nt_response);
    msg.extend_from_slice(&domain_bytes);
    msg.extend_from_slice(&user_bytes);
    msg.extend_from_slice(&workstation_bytes);
    Ok(msg)
}

fn security_buffer(msg: &mut Vec<u8>, len: usize, offset: u32) {
    msg.extend_from_slice(&(len as u16).to_le_bytes());
    msg.extend_from_slice(&(len as u16).to_le_bytes());
    msg.extend_from_slice(&offset.to_le_bytes());
}

fn ntlmv2_responses(
    user: &str,
    domain: &str,
    passwd: &str,
    server_challenge: &[u8; 8],
    client_challenge: &[u8; 8],
    target_info: Option<&[u8]>,
    timestamp: u64,
) -> (Vec<u8>, Vec<u8>) {
    // NT hash = MD4(UTF16LE(passwd))
    let mut md4 = Md4::new();
    md4.update(utf16le(passwd));
    let nt_hash = md4.finalize();

    // NTLMv2 hash = HMAC-MD5(NT hash, UTF16LE(UPPER(user) + domain))
    let ntlmv2_hash = hmac_md5(&nt_hash, &[&utf16le(&format!("{}{}", user.to_uppercase(), domain))]);

    let mut blob = Vec::with_capacity(44 + target_info.map_or(0, <[u8]>::len));
    blob.extend_from_slice(&[0x01, 0x01, 0x00, 0x00]);
    blob.extend_from_slice(&[0x00; 4]);
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&[0x00; 4]);
    if let Some(info) = target_info {
        blob.extend_from_slice(info);
    }
    blob.extend_from_slice(&[0x00; 4]);

    let nt_proof = hmac_md5(&ntlmv2_hash, &[server_challenge, &blob]);
    let mut nt_response = nt_proof;
    nt_response.extend_from_slice(&blob);

    let lm_proof = hmac_md5(&ntlmv2_hash, &[server_challenge, client_challenge]);
    let mut lm_response = lm_proof;
    lm_response.extend_from_slice(client_challenge);

    (nt_response, lm_response)
}

fn hmac_md5(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac = HmacMd5::new_from_slice(key).expect("HMAC key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// Accept `DOMAIN\user` and `user@domain` spellings.
fn split_domain(user: &str) -> (&str, &str) {
    if let Some((domain, user)) = user.split_once('\\') {
        (user, domain)
    } else if let Some((user, domain)) = user.split_once('@') {
        (user, domain)
    } else {
        (user, "")
    }
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn filetime_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs() * 10_000_000 + u64::from(now.subsec_nanos()) / 100 + FILETIME_EPOCH_DIFF
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_type2(target_info: Option<&[u8]>) -> Vec<u8> {
        let mut flags = NEGOTIATE_UNICODE | NEGOTIATE_NTLM;
        let mut msg = Vec::new();
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&2u32.to_le_bytes());
        // Target name buffer (empty).
        msg.extend_from_slice(&[0u8; 8]);
        if target_info.is_some() {
            flags |= NEGOTIATE_TARGET_INFO;
        }
        msg.extend_from_slice(&flags.to_le_bytes());
        msg.extend_from_slice(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        msg.extend_from_slice(&[0u8; 8]); // context
        let info = target_info.unwrap_or(&[]);
        // Target info buffer follows the 48-byte header.
        msg.extend_from_slice(&(info.len() as u16).to_le_bytes());
        msg.extend_from_slice(&(info.len() as u16).to_le_bytes());
        msg.extend_from_slice(&48u32.to_le_bytes());
        msg.extend_from_slice(info);
        msg
    }

    #[test]
    fn type1_layout() {
        let msg = type1_message();
        assert_eq!(msg.len(), 32);
        assert_eq!(&msg[..8], SIGNATURE);
        assert_eq!(u32::from_le_bytes([msg[8], msg[9], msg[10], msg[11]]), 1);
    }

    #[test]
    fn type2_roundtrip() {
        let info = [0x02u8, 0x00, 0x04, 0x00, b'D', 0x00, b'O', 0x00];
        let parsed = decode_type2(&sample_type2(Some(&info))).unwrap();
        assert_eq!(parsed.challenge, [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(parsed.target_info.as_deref(), Some(&info[..]));
    }

    #[test]
    fn type2_garbage_rejected() {
        assert!(matches!(decode_type2(b"not ntlm"), Err(SaslError::BadServerEncoding)));
        let mut wrong_type = sample_type2(None);
        wrong_type[8] = 3;
        assert!(matches!(decode_type2(&wrong_type), Err(SaslError::BadServerEncoding)));
    }

    #[test]
    fn type3_structure() {
        let type2 = decode_type2(&sample_type2(None)).unwrap();
        let msg =
            type3_with_entropy("EXAMPLE\\alice", "secret", &type2, [7u8; 8], 0x0123_4567).unwrap();
        assert_eq!(&msg[..8], SIGNATURE);
        assert_eq!(u32::from_le_bytes([msg[8], msg[9], msg[10], msg[11]]), 3);

        // LM response: 16-byte proof plus the 8-byte client challenge.
        let lm_len = u16::from_le_bytes([msg[12], msg[13]]) as usize;
        let lm_offset = u32::from_le_bytes([msg[16], msg[17], msg[18], msg[19]]) as usize;
        assert_eq!(lm_len, 24);
        assert_eq!(&msg[lm_offset + 16..lm_offset + 24], &[7u8; 8]);

        // Username buffer carries UTF-16LE "alice" without the domain.
        let user_len = u16::from_le_bytes([msg[36], msg[37]]) as usize;
        let user_offset = u32::from_le_bytes([msg[40], msg[41], msg[42], msg[43]]) as usize;
        assert_eq!(&msg[user_offset..user_offset + user_len], utf16le("alice").as_slice());

        // Domain buffer carries UTF-16LE "EXAMPLE".
        let dom_len = u16::from_le_bytes([msg[28], msg[29]]) as usize;
        let dom_offset = u32::from_le_bytes([msg[32], msg[33], msg[34], msg[35]]) as usize;
        assert_eq!(&msg[dom_offset..dom_offset + dom_len], utf16le("EXAMPLE").as_slice());
    }

    #[test]
    fn domain_spellings() {
        assert_eq!(split_domain("EXAMPLE\\bob"), ("bob", "EXAMPLE"));
        assert_eq!(split_domain("bob@example.org"), ("bob", "example.org"));
        assert_eq!(split_domain("bob"), ("bob", ""));
    }
}
