/*
 * oauth.rs
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

//! OAuth 2.0 bearer-token mechanisms: OAUTHBEARER (RFC 7628) and the older
//! XOAUTH2 used by Gmail and Outlook. Both are single client messages built
//! from `\x01`-separated key/value pairs.

/// Build the OAUTHBEARER message:
/// `n,a=<user>,\x01host=<host>\x01port=<port>\x01auth=Bearer <token>\x01\x01`.
pub fn bearer_message(user: &str, host: &str, port: u16, bearer: &str) -> Vec<u8> {
    format!(
        "n,a={},\x01host={}\x01port={}\x01auth=Bearer {}\x01\x01",
        user, host, port, bearer
    )
    .into_bytes()
}

/// Build the XOAUTH2 message: `user=<user>\x01auth=Bearer <token>\x01\x01`.
pub fn xoauth2_message(user: &str, bearer: &str) -> Vec<u8> {
    format!("user={}\x01auth=Bearer {}\x01\x01", user, bearer).into_bytes()
}
