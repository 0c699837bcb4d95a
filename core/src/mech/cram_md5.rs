/*
 * cram_md5.rs
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

//! CRAM-MD5 (RFC 2195).

use hmac::{Hmac, Mac};
use md5::Md5;

use super::lower_hex;

type HmacMd5 = Hmac<Md5>;

pub(crate) fn is_supported() -> bool {
    true
}

/// Build the CRAM-MD5 reply: `user SP lowercase-hex(HMAC-MD5(passwd, challenge))`.
/// The challenge is hashed as raw bytes; it is not required to be UTF-8.
pub fn response(user: &str, passwd: &str, challenge: &[u8]) -> Vec<u8> {
    let mut mac = HmacMd5::new_from_slice(passwd.as_bytes()).expect("HMAC key length");
    mac.update(challenge);
    let digest = mac.finalize().into_bytes();
    format!("{} {}", user, lower_hex(&digest)).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2195_vector() {
        let reply = response(
            "tim",
            "tanstaaftanstaaf",
            b"<1896.697170952@postoffice.reston.mci.net>",
        );
        assert_eq!(reply, b"tim b913a602c7eda7a495b4e6e7334d3890".to_vec());
    }
}
