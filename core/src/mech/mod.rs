/*
 * mod.rs
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

//! Per-mechanism byte producers.
//!
//! Each module turns credentials plus an optional decoded server blob into
//! the next client blob. The driver owns all state transitions; these
//! functions only compute messages. DIGEST-MD5, CRAM-MD5, NTLM and SCRAM are
//! build-time options, matching what the crypto stack can serve.

#[cfg(feature = "digest-auth")]
pub mod cram_md5;
#[cfg(feature = "digest-auth")]
pub mod digest_md5;
pub mod external;
pub mod gssapi;
pub mod login;
#[cfg(feature = "ntlm")]
pub mod ntlm;
pub mod oauth;
pub mod plain;
#[cfg(feature = "scram")]
pub mod scram;

#[cfg(feature = "digest-auth")]
pub(crate) fn lower_hex(bytes: &[u8]) -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(HEX[(b >> 4) as usize] as char);
        s.push(HEX[(b & 15) as usize] as char);
    }
    s
}
