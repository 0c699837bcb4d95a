/*
 * external.rs
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

//! EXTERNAL (RFC 4422 appendix A). Authentication is established outside
//! SASL (TLS client certificate, IPsec); the one message names the identity
//! to authorize, and may be empty.

/// Build the EXTERNAL message: the authorization identity, possibly empty.
/// An empty identity still produces an explicit (empty) response.
pub fn message(authzid: &str) -> Vec<u8> {
    authzid.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_or_empty() {
        assert_eq!(message("alice"), b"alice");
        assert_eq!(message(""), b"");
    }
}
