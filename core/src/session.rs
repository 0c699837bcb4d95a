/*
 * session.rs
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

//! Per-connection SASL session: carrier bindings, preferences, and the
//! authentication state. Only the driver changes the state, through the one
//! sanctioned setter.

use log::debug;

use crate::error::SaslError;
use crate::mechanism::{decode_mech, Mechanism, MechSet};
#[cfg(feature = "scram")]
use crate::mech::scram::ScramExchange;

/// Authentication progress as seen by the carrier protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// No mechanism selected; nothing on the wire.
    Idle,
    /// A turn was sent; feed the next server response to `continue_auth`.
    InProgress,
    /// Authentication concluded successfully.
    Done,
}

/// Authentication state. Initial and terminal state is `Stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stop,
    Plain,
    Login,
    LoginPasswd,
    External,
    CramMd5,
    DigestMd5,
    DigestMd5Resp,
    Ntlm,
    NtlmType2Msg,
    Gssapi,
    GssapiToken,
    GssapiNoData,
    OAuth2,
    OAuth2Resp,
    Scram,
    Cancel,
    Final,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Stop => "STOP",
            State::Plain => "PLAIN",
            State::Login => "LOGIN",
            State::LoginPasswd => "LOGIN_PASSWD",
            State::External => "EXTERNAL",
            State::CramMd5 => "CRAMMD5",
            State::DigestMd5 => "DIGESTMD5",
            State::DigestMd5Resp => "DIGESTMD5_RESP",
            State::Ntlm => "NTLM",
            State::NtlmType2Msg => "NTLM_TYPE2MSG",
            State::Gssapi => "GSSAPI",
            State::GssapiToken => "GSSAPI_TOKEN",
            State::GssapiNoData => "GSSAPI_NO_DATA",
            State::OAuth2 => "OAUTH2",
            State::OAuth2Resp => "OAUTH2_RESP",
            State::Scram => "SCRAM",
            State::Cancel => "CANCEL",
            State::Final => "FINAL",
        }
    }
}

/// Carrier-protocol bindings, fixed per protocol (IMAP, POP3, SMTP, LDAP).
#[derive(Debug, Clone, Copy)]
pub struct SaslParams {
    /// Service identifier for service-aware mechanisms (e.g. "imap", "smtp").
    pub service: &'static str,
    /// Default preferred mechanisms.
    pub defmechs: MechSet,
    /// Maximum combined length of mechanism name and encoded initial
    /// response; 0 means no limit.
    pub maxirlen: usize,
    /// Result code meaning "server wants another turn".
    pub contcode: u16,
    /// Result code meaning "authentication succeeded".
    pub finalcode: u16,
    /// Apply base64 framing to every turn.
    pub base64: bool,
}

/// Credentials for one authentication attempt, borrowed from the caller for
/// the duration of a driver call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    /// Authentication identity. `None` means no username was configured.
    pub user: Option<&'a str>,
    /// Password; empty means none was configured.
    pub passwd: &'a str,
    /// Authorization identity, when distinct from `user`.
    pub authzid: Option<&'a str>,
    /// OAuth 2.0 bearer token.
    pub bearer: Option<&'a str>,
}

/// The enclosing protocol. The driver emits every outgoing message through
/// these callbacks and pulls the last-seen server data back in; blocking I/O
/// happens inside them, never in the driver.
pub trait Carrier {
    /// Emit the initial AUTH command. `ir` is the encoded initial response,
    /// when one is being sent along.
    fn send_auth(&mut self, mech: &str, ir: Option<&[u8]>) -> Result<(), SaslError>;
    /// Emit a continuation response (possibly empty).
    fn cont_auth(&mut self, mech: &str, data: &[u8]) -> Result<(), SaslError>;
    /// Emit the mechanism-specific cancellation.
    fn cancel_auth(&mut self, mech: &str) -> Result<(), SaslError>;
    /// Retrieve the last-seen server data as opaque bytes.
    fn get_message(&mut self) -> Result<Vec<u8>, SaslError>;
    /// Peer host, for host-aware mechanisms (OAUTHBEARER).
    fn host(&self) -> &str;
    /// Peer port.
    fn port(&self) -> u16;
}

/// HTTP-style authentication option flags used to derive mechanism
/// preferences from application configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HttpAuth(u8);

impl HttpAuth {
    pub const NONE: HttpAuth = HttpAuth(0);
    pub const BASIC: HttpAuth = HttpAuth(1 << 0);
    pub const DIGEST: HttpAuth = HttpAuth(1 << 1);
    pub const NTLM: HttpAuth = HttpAuth(1 << 2);
    pub const BEARER: HttpAuth = HttpAuth(1 << 3);
    pub const NEGOTIATE: HttpAuth = HttpAuth(1 << 4);

    pub fn contains(&self, other: HttpAuth) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for HttpAuth {
    type Output = HttpAuth;
    fn bitor(self, rhs: HttpAuth) -> HttpAuth {
        HttpAuth(self.0 | rhs.0)
    }
}

/// One SASL session, created per connection authentication cycle.
pub struct Sasl {
    pub(crate) params: SaslParams,
    pub(crate) state: State,
    /// Wire name of the mechanism in use.
    pub(crate) curmech: Option<&'static str>,
    /// Mechanisms offered by the peer.
    pub(crate) authmechs: MechSet,
    /// Mechanisms preferred by us.
    pub(crate) prefmech: MechSet,
    /// The mechanism currently selected.
    pub(crate) authused: Option<Mechanism>,
    /// Clear `prefmech` on the next auth-option parse.
    pub(crate) resetprefs: bool,
    /// Request mutual authentication (GSSAPI only).
    pub(crate) mutual_auth: bool,
    /// Compute an initial response even when the carrier would not.
    pub(crate) force_ir: bool,
    /// Service-name override for this session.
    pub(crate) service: Option<String>,
    #[cfg(feature = "scram")]
    pub(crate) scram: Option<ScramExchange>,
}

impl Sasl {
    pub fn new(params: SaslParams) -> Self {
        Sasl {
            params,
            state: State::Stop,
            curmech: None,
            authmechs: MechSet::NONE,
            prefmech: params.defmechs,
            authused: None,
            resetprefs: true,
            mutual_auth: false,
            force_ir: false,
            service: None,
            #[cfg(feature = "scram")]
            scram: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The ONLY way to change the state.
    pub(crate) fn set_state(&mut self, newstate: State) {
        if self.state != newstate {
            debug!("SASL state change from {} to {}", self.state.name(), newstate.name());
        }
        self.state = newstate;
    }

    pub fn params(&self) -> &SaslParams {
        &self.params
    }

    /// Mechanisms offered by the peer so far.
    pub fn offered(&self) -> MechSet {
        self.authmechs
    }

    /// Record peer-offered mechanisms (cumulative across capability lines).
    pub fn record_offered(&mut self, mechs: MechSet) {
        self.authmechs |= mechs;
    }

    pub fn preferred(&self) -> MechSet {
        self.prefmech
    }

    pub fn set_preferred(&mut self, mechs: MechSet) {
        self.prefmech = mechs;
    }

    /// Name of the mechanism currently in use, for carrier logging.
    pub fn mechanism(&self) -> Option<&'static str> {
        self.curmech
    }

    /// Effective service name: the session override, else the carrier default.
    pub fn service(&self) -> &str {
        self.service.as_deref().unwrap_or(self.params.service)
    }

    pub fn set_service(&mut self, service: Option<String>) {
        self.service = service;
    }

    /// Mutual-authentication toggle (GSSAPI only).
    pub fn mutual_auth(&self) -> bool {
        self.mutual_auth
    }

    pub fn set_mutual_auth(&mut self, mutual: bool) {
        self.mutual_auth = mutual;
    }

    /// Derive mechanism preferences from HTTP-style auth options. Flags that
    /// map to no mechanism leave the carrier defaults in place.
    pub fn set_http_auth(&mut self, auth: HttpAuth) {
        let mut mechs = MechSet::NONE;
        if auth.contains(HttpAuth::BASIC) {
            mechs.insert(Mechanism::Plain);
            mechs.insert(Mechanism::Login);
        }
        if auth.contains(HttpAuth::DIGEST) {
            mechs.insert(Mechanism::DigestMd5);
        }
        if auth.contains(HttpAuth::NTLM) {
            mechs.insert(Mechanism::Ntlm);
        }
        if auth.contains(HttpAuth::BEARER) {
            mechs.insert(Mechanism::OAuthBearer);
            mechs.insert(Mechanism::XOAuth2);
        }
        if auth.contains(HttpAuth::NEGOTIATE) {
            mechs.insert(Mechanism::Gssapi);
        }
        if !mechs.is_empty() {
            self.prefmech = mechs;
        }
    }

    /// Parse one URL login option value into the preferences.
    ///
    /// `"*"` selects the carrier defaults; a mechanism name is OR-ed in. The
    /// first parse of a cycle clears the preferences, making later parses
    /// additive.
    pub fn parse_auth_option(&mut self, value: &str) -> Result<(), SaslError> {
        if value.is_empty() {
            return Err(SaslError::MalformedOption);
        }

        if self.resetprefs {
            self.resetprefs = false;
            self.prefmech = MechSet::NONE;
        }

        if value == "*" {
            self.prefmech = self.params.defmechs;
            return Ok(());
        }
        match decode_mech(value) {
            Some((mech, len)) if len == value.len() => {
                self.prefmech |= mech.into();
                Ok(())
            }
            _ => Err(SaslError::MalformedOption),
        }
    }

    /// Whether there is enough auth data to attempt authentication at all.
    /// EXTERNAL can authenticate without username or password.
    pub fn can_authenticate(&self, creds: &Credentials) -> bool {
        creds.user.is_some() || (self.authmechs & self.prefmech).contains(Mechanism::External)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: SaslParams = SaslParams {
        service: "smtp",
        defmechs: MechSet::ALL,
        maxirlen: 0,
        contcode: 334,
        finalcode: 235,
        base64: true,
    };

    #[test]
    fn option_star_selects_defaults_then_adds() {
        let mut sasl = Sasl::new(PARAMS);
        sasl.parse_auth_option("*").unwrap();
        assert_eq!(sasl.preferred(), PARAMS.defmechs);
        sasl.parse_auth_option("PLAIN").unwrap();
        assert_eq!(sasl.preferred(), PARAMS.defmechs | MechSet::single(Mechanism::Plain));
    }

    #[test]
    fn first_option_clears_preferences() {
        let mut sasl = Sasl::new(PARAMS);
        sasl.parse_auth_option("CRAM-MD5").unwrap();
        assert_eq!(sasl.preferred(), MechSet::single(Mechanism::CramMd5));
        sasl.parse_auth_option("PLAIN").unwrap();
        assert!(sasl.preferred().contains(Mechanism::CramMd5));
        assert!(sasl.preferred().contains(Mechanism::Plain));
    }

    #[test]
    fn malformed_options_rejected() {
        let mut sasl = Sasl::new(PARAMS);
        assert!(matches!(sasl.parse_auth_option(""), Err(SaslError::MalformedOption)));
        assert!(matches!(sasl.parse_auth_option("PLAINX"), Err(SaslError::MalformedOption)));
        assert!(matches!(sasl.parse_auth_option("PLAIN X"), Err(SaslError::MalformedOption)));
    }

    #[test]
    fn http_auth_defaults() {
        let mut sasl = Sasl::new(PARAMS);
        sasl.set_http_auth(HttpAuth::BEARER | HttpAuth::BASIC);
        let prefs = sasl.preferred();
        assert!(prefs.contains(Mechanism::Plain));
        assert!(prefs.contains(Mechanism::Login));
        assert!(prefs.contains(Mechanism::OAuthBearer));
        assert!(prefs.contains(Mechanism::XOAuth2));
        assert!(!prefs.contains(Mechanism::CramMd5));

        // No usable flags: defaults stay.
        let mut other = Sasl::new(PARAMS);
        other.set_http_auth(HttpAuth::NONE);
        assert_eq!(other.preferred(), PARAMS.defmechs);
    }

    #[test]
    fn can_authenticate_requires_user_or_external() {
        let mut sasl = Sasl::new(PARAMS);
        let no_user = Credentials::default();
        assert!(!sasl.can_authenticate(&no_user));
        sasl.record_offered(MechSet::single(Mechanism::External));
        assert!(sasl.can_authenticate(&no_user));
        let with_user = Credentials { user: Some("alice"), ..Credentials::default() };
        assert!(Sasl::new(PARAMS).can_authenticate(&with_user));
    }
}
