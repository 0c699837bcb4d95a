/*
 * select.rs
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

//! Mechanism selection: one choice from offered ∩ preferred, in decreasing
//! order of security, with the initial response precomputed when requested.

use crate::mech::{external, gssapi, login, oauth, plain};
#[cfg(feature = "digest-auth")]
use crate::mech::{cram_md5, digest_md5};
#[cfg(feature = "ntlm")]
use crate::mech::ntlm;
#[cfg(feature = "scram")]
use crate::mech::scram::{self, ScramExchange, ScramKind};
use crate::error::SaslError;
use crate::mechanism::Mechanism;
use crate::session::{Carrier, Credentials, Sasl, State};

/// Outcome of a successful selection.
pub(crate) struct Choice {
    pub mech: Mechanism,
    /// State when the first message goes out without an initial response.
    pub state1: State,
    /// State once the initial response has been consumed.
    pub state2: State,
    /// Precomputed initial response, not yet encoded for the wire.
    pub resp: Option<Vec<u8>>,
}

impl Choice {
    fn new(mech: Mechanism, state1: State, state2: State, resp: Option<Vec<u8>>) -> Option<Choice> {
        Some(Choice { mech, state1, state2, resp })
    }
}

/// Pick the best usable mechanism. `Ok(None)` means nothing matched and the
/// caller should turn to diagnostics.
pub(crate) fn choose<C: Carrier>(
    sasl: &mut Sasl,
    carrier: &C,
    creds: &Credentials,
) -> Result<Option<Choice>, SaslError> {
    let enabled = sasl.authmechs & sasl.prefmech;

    // A configured password signals the user expected a password mechanism.
    if enabled.contains(Mechanism::External) && creds.passwd.is_empty() {
        sasl.authused = Some(Mechanism::External);
        let resp = sasl
            .force_ir
            .then(|| external::message(creds.user.unwrap_or("")));
        return Ok(Choice::new(Mechanism::External, State::External, State::Final, resp));
    }

    // All remaining mechanisms need a username.
    let Some(user) = creds.user else {
        return Ok(None);
    };

    if enabled.contains(Mechanism::Gssapi)
        && gssapi::is_supported()
        && gssapi::user_contains_domain(user)
    {
        sasl.mutual_auth = false;
        sasl.authused = Some(Mechanism::Gssapi);
        return Ok(Choice::new(Mechanism::Gssapi, State::Gssapi, State::GssapiToken, None));
    }

    #[cfg(feature = "scram")]
    {
        if (enabled.contains(Mechanism::ScramSha256) || enabled.contains(Mechanism::ScramSha1))
            && scram::is_supported()
        {
            let (mech, kind) = if enabled.contains(Mechanism::ScramSha256) {
                (Mechanism::ScramSha256, ScramKind::Sha256)
            } else {
                (Mechanism::ScramSha1, ScramKind::Sha1)
            };
            sasl.authused = Some(mech);
            let mut exchange = ScramExchange::new(kind, creds.authzid, user);
            let resp = if sasl.force_ir {
                exchange.step(&[], creds.passwd)?
            } else {
                None
            };
            sasl.scram = Some(exchange);
            // The exchange loops in one state until it runs out of output.
            return Ok(Choice::new(mech, State::Scram, State::Scram, resp));
        }
    }

    #[cfg(feature = "digest-auth")]
    {
        if enabled.contains(Mechanism::DigestMd5) && digest_md5::is_supported() {
            sasl.authused = Some(Mechanism::DigestMd5);
            return Ok(Choice::new(Mechanism::DigestMd5, State::DigestMd5, State::Final, None));
        }
        if enabled.contains(Mechanism::CramMd5) && cram_md5::is_supported() {
            sasl.authused = Some(Mechanism::CramMd5);
            return Ok(Choice::new(Mechanism::CramMd5, State::CramMd5, State::Final, None));
        }
    }

    #[cfg(feature = "ntlm")]
    {
        if enabled.contains(Mechanism::Ntlm) && ntlm::is_supported() {
            sasl.authused = Some(Mechanism::Ntlm);
            let resp = sasl.force_ir.then(ntlm::type1_message);
            return Ok(Choice::new(Mechanism::Ntlm, State::Ntlm, State::NtlmType2Msg, resp));
        }
    }

    if let Some(bearer) = creds.bearer {
        if enabled.contains(Mechanism::OAuthBearer) {
            sasl.authused = Some(Mechanism::OAuthBearer);
            let resp = sasl
                .force_ir
                .then(|| oauth::bearer_message(user, carrier.host(), carrier.port(), bearer));
            // Failures may arrive as continuations for OAUTHBEARER.
            return Ok(Choice::new(Mechanism::OAuthBearer, State::OAuth2, State::OAuth2Resp, resp));
        }
        if enabled.contains(Mechanism::XOAuth2) {
            sasl.authused = Some(Mechanism::XOAuth2);
            let resp = sasl.force_ir.then(|| oauth::xoauth2_message(user, bearer));
            return Ok(Choice::new(Mechanism::XOAuth2, State::OAuth2, State::Final, resp));
        }
    }

    if enabled.contains(Mechanism::Plain) {
        sasl.authused = Some(Mechanism::Plain);
        let resp = sasl
            .force_ir
            .then(|| plain::message(creds.authzid.unwrap_or(""), user, creds.passwd));
        return Ok(Choice::new(Mechanism::Plain, State::Plain, State::Final, resp));
    }

    if enabled.contains(Mechanism::Login) {
        sasl.authused = Some(Mechanism::Login);
        let resp = sasl.force_ir.then(|| login::message(user));
        return Ok(Choice::new(Mechanism::Login, State::Login, State::LoginPasswd, resp));
    }

    Ok(None)
}
