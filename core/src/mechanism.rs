/*
 * mechanism.rs
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

//! SASL mechanism registry: names, bit tokens, and list parsing.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Supported SASL mechanisms (client-side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// Legacy LOGIN (draft-murchison-sasl-login).
    Login,
    /// PLAIN (RFC 4616).
    Plain,
    /// CRAM-MD5 (RFC 2195).
    CramMd5,
    /// DIGEST-MD5 (RFC 2831).
    DigestMd5,
    /// GSSAPI / Kerberos 5 (RFC 4752).
    Gssapi,
    /// EXTERNAL (RFC 4422 appendix A).
    External,
    /// NTLM over SASL.
    Ntlm,
    /// XOAUTH2 (Gmail, Outlook).
    XOAuth2,
    /// OAUTHBEARER (RFC 7628).
    OAuthBearer,
    /// SCRAM-SHA-1 (RFC 5802).
    ScramSha1,
    /// SCRAM-SHA-256 (RFC 7677).
    ScramSha256,
}

/// Registry scan order. Mirrors the wire-name table; selection priority is a
/// separate concern and lives in the selector.
pub const MECHANISMS: &[Mechanism] = &[
    Mechanism::Login,
    Mechanism::Plain,
    Mechanism::CramMd5,
    Mechanism::DigestMd5,
    Mechanism::Gssapi,
    Mechanism::External,
    Mechanism::Ntlm,
    Mechanism::XOAuth2,
    Mechanism::OAuthBearer,
    Mechanism::ScramSha1,
    Mechanism::ScramSha256,
];

impl Mechanism {
    pub fn name(&self) -> &'static str {
        match self {
            Mechanism::Login => "LOGIN",
            Mechanism::Plain => "PLAIN",
            Mechanism::CramMd5 => "CRAM-MD5",
            Mechanism::DigestMd5 => "DIGEST-MD5",
            Mechanism::Gssapi => "GSSAPI",
            Mechanism::External => "EXTERNAL",
            Mechanism::Ntlm => "NTLM",
            Mechanism::XOAuth2 => "XOAUTH2",
            Mechanism::OAuthBearer => "OAUTHBEARER",
            Mechanism::ScramSha1 => "SCRAM-SHA-1",
            Mechanism::ScramSha256 => "SCRAM-SHA-256",
        }
    }

    /// Flag bit in a [`MechSet`].
    pub fn bit(&self) -> u16 {
        match self {
            Mechanism::Login => 1 << 0,
            Mechanism::Plain => 1 << 1,
            Mechanism::CramMd5 => 1 << 2,
            Mechanism::DigestMd5 => 1 << 3,
            Mechanism::Gssapi => 1 << 4,
            Mechanism::External => 1 << 5,
            Mechanism::Ntlm => 1 << 6,
            Mechanism::XOAuth2 => 1 << 7,
            Mechanism::OAuthBearer => 1 << 8,
            Mechanism::ScramSha1 => 1 << 9,
            Mechanism::ScramSha256 => 1 << 10,
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Set of mechanisms as a small bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MechSet(u16);

impl MechSet {
    pub const NONE: MechSet = MechSet(0);
    /// Every mechanism in the registry.
    pub const ALL: MechSet = MechSet((1 << 11) - 1);

    pub fn single(mech: Mechanism) -> Self {
        MechSet(mech.bit())
    }

    pub fn contains(&self, mech: Mechanism) -> bool {
        self.0 & mech.bit() != 0
    }

    pub fn insert(&mut self, mech: Mechanism) {
        self.0 |= mech.bit();
    }

    pub fn remove(&mut self, mech: Mechanism) {
        self.0 &= !mech.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Mechanism> + '_ {
        MECHANISMS.iter().copied().filter(|m| self.contains(*m))
    }
}

impl BitOr for MechSet {
    type Output = MechSet;
    fn bitor(self, rhs: MechSet) -> MechSet {
        MechSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for MechSet {
    fn bitor_assign(&mut self, rhs: MechSet) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for MechSet {
    type Output = MechSet;
    fn bitand(self, rhs: MechSet) -> MechSet {
        MechSet(self.0 & rhs.0)
    }
}

impl From<Mechanism> for MechSet {
    fn from(mech: Mechanism) -> Self {
        MechSet::single(mech)
    }
}

impl FromIterator<Mechanism> for MechSet {
    fn from_iter<T: IntoIterator<Item = Mechanism>>(iter: T) -> Self {
        let mut set = MechSet::NONE;
        for m in iter {
            set.insert(m);
        }
        set
    }
}

/// Convert a mechanism name prefix into its token.
///
/// A match is accepted only when it consumes all of `input`, or when the byte
/// following the matched name is not one of `[A-Z0-9_-]` (so "PLAIN" does not
/// match inside "PLAINXY"). Returns the mechanism and the consumed length.
pub fn decode_mech(input: &str) -> Option<(Mechanism, usize)> {
    let bytes = input.as_bytes();
    for mech in MECHANISMS {
        let name = mech.name().as_bytes();
        if bytes.len() >= name.len() && &bytes[..name.len()] == name {
            if bytes.len() == name.len() {
                return Some((*mech, name.len()));
            }
            let c = bytes[name.len()];
            if !c.is_ascii_uppercase() && !c.is_ascii_digit() && c != b'-' && c != b'_' {
                return Some((*mech, name.len()));
            }
        }
    }
    None
}

/// Parse a whitespace-separated mechanism list as advertised by the peer
/// (e.g. an SMTP `AUTH` line or IMAP `AUTH=` capabilities with the prefix
/// stripped). Unknown names are skipped.
pub fn decode_mech_list(list: &str) -> MechSet {
    let mut set = MechSet::NONE;
    for word in list.split_ascii_whitespace() {
        if let Some((mech, len)) = decode_mech(word) {
            if len == word.len() {
                set.insert(mech);
            }
        }
    }
    set
}
