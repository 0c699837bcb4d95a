/*
 * plain.rs
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

//! PLAIN (RFC 4616).

/// Build the PLAIN message: `authzid NUL authcid NUL passwd` (UTF-8).
/// Wire encoding (base64 or not) is the codec's business.
pub fn message(authzid: &str, authcid: &str, passwd: &str) -> Vec<u8> {
    format!("{}\0{}\0{}", authzid, authcid, passwd).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4616_format() {
        assert_eq!(message("", "tim", "tanstaaftanstaaf"), b"\0tim\0tanstaaftanstaaf");
        assert_eq!(message("admin", "tim", "pw"), b"admin\0tim\0pw");
    }
}
