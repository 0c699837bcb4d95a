/*
 * diag.rs
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

//! Failing SASL selection is a pain; give a helping hand by reporting, per
//! mechanism, why it was not chosen. Observability only, no state changes.

use log::info;

use crate::error::SaslError;
use crate::mech::gssapi;
use crate::mechanism::{Mechanism, MechSet};
use crate::session::{Credentials, Sasl};

impl Sasl {
    /// Explain why no mechanism was selected and hand back the error the
    /// carrier should surface.
    pub fn explain_blocked(&self, creds: &Credentials) -> SaslError {
        let enabled = self.authmechs & self.prefmech;

        if self.authmechs.is_empty() {
            info!("SASL: no auth mechanism was offered or recognized");
        } else if enabled.is_empty() {
            info!("SASL: no overlap between offered and configured auth mechanisms");
        } else {
            info!("SASL: no auth mechanism offered could be selected");
            if enabled.contains(Mechanism::External) && !creds.passwd.is_empty() {
                info!("SASL: auth EXTERNAL not chosen with password");
            }
            unchosen(Mechanism::Gssapi, enabled, true, gssapi::is_supported(), None, creds);
            unchosen(
                Mechanism::ScramSha256,
                enabled,
                cfg!(feature = "scram"),
                true,
                None,
                creds,
            );
            unchosen(
                Mechanism::ScramSha1,
                enabled,
                cfg!(feature = "scram"),
                true,
                None,
                creds,
            );
            unchosen(
                Mechanism::DigestMd5,
                enabled,
                cfg!(feature = "digest-auth"),
                true,
                None,
                creds,
            );
            unchosen(
                Mechanism::CramMd5,
                enabled,
                cfg!(feature = "digest-auth"),
                true,
                None,
                creds,
            );
            unchosen(
                Mechanism::Ntlm,
                enabled,
                cfg!(feature = "ntlm"),
                true,
                None,
                creds,
            );
            let bearer_missing = creds.bearer.is_none().then_some("a bearer token");
            unchosen(Mechanism::OAuthBearer, enabled, true, true, bearer_missing, creds);
            unchosen(Mechanism::XOAuth2, enabled, true, true, bearer_missing, creds);
        }

        SaslError::LoginDenied
    }
}

/// At most one line per mechanism: not built in, not supported by the
/// platform, or missing a credential.
fn unchosen(
    mech: Mechanism,
    enabled: MechSet,
    built_in: bool,
    platform: bool,
    missing: Option<&str>,
    creds: &Credentials,
) {
    if !enabled.contains(mech) {
        return;
    }
    if !built_in {
        info!("SASL: {} not builtin", mech);
    } else if !platform {
        info!("SASL: {} not supported by the platform/libraries", mech);
    } else {
        if let Some(what) = missing {
            info!("SASL: {} is missing {}", mech, what);
        }
        if creds.user.is_none() {
            info!("SASL: {} is missing username", mech);
        }
    }
}
