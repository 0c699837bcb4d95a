/*
 * codec.rs
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

//! Transport framing for SASL turns.
//!
//! With base64 framing an absent payload goes out as the empty string and an
//! explicitly empty payload (the mechanism has nothing substantive to say) as
//! `"="`; the inverse convention applies to server data. Binary framing
//! passes payloads through untouched.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::SaslError;

/// Encode one outgoing message.
///
/// `payload` is `None` when the current turn produced no message at all, and
/// `Some` of an empty slice for the explicit empty response.
pub fn encode_outgoing(payload: Option<&[u8]>, base64_framing: bool) -> Vec<u8> {
    if !base64_framing {
        return payload.map(<[u8]>::to_vec).unwrap_or_default();
    }
    match payload {
        None => Vec::new(),
        Some([]) => b"=".to_vec(),
        Some(data) => BASE64.encode(data).into_bytes(),
    }
}

/// Decode the server data for one turn into raw bytes.
pub fn decode_server(raw: &[u8], base64_framing: bool) -> Result<Vec<u8>, SaslError> {
    if !base64_framing {
        return Ok(raw.to_vec());
    }
    if raw.is_empty() || raw[0] == b'=' {
        return Ok(Vec::new());
    }
    BASE64.decode(raw).map_err(|_| SaslError::BadServerEncoding)
}
