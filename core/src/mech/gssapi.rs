/*
 * gssapi.rs
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

//! GSSAPI (Kerberos 5) capability probe.
//!
//! No platform GSS library is wired into this build, so the probe reports
//! unsupported and selection never picks the mechanism; the driver's GSSAPI
//! states then only fire on a missing context. Diagnostics uses the probe to
//! explain the situation.

/// Whether a platform GSS library is available.
pub(crate) fn is_supported() -> bool {
    false
}

/// GSSAPI needs a principal with a realm: `user@REALM`, `DOMAIN\user` or
/// `DOMAIN/user`.
pub(crate) fn user_contains_domain(user: &str) -> bool {
    user.contains('@') || user.contains('\\') || user.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realm_spellings() {
        assert!(user_contains_domain("alice@EXAMPLE.ORG"));
        assert!(user_contains_domain("EXAMPLE\\alice"));
        assert!(user_contains_domain("EXAMPLE/alice"));
        assert!(!user_contains_domain("alice"));
    }
}
