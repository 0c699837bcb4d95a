/*
 * driver.rs
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

//! The authentication driver: reacts to server result codes, produces one
//! outgoing message per turn, and walks the session to a terminal state.
//! Each call is a synchronous transition; blocking belongs to the carrier.

use log::error;

use crate::codec;
#[cfg(feature = "digest-auth")]
use crate::mech::{cram_md5, digest_md5};
use crate::mech::{external, login, oauth, plain};
#[cfg(feature = "ntlm")]
use crate::mech::ntlm;
use crate::error::SaslError;
use crate::mechanism::Mechanism;
use crate::select;
use crate::session::{Carrier, Credentials, Progress, Sasl, State};

impl Sasl {
    /// Select a mechanism and send the initial AUTH command.
    ///
    /// Returns `Progress::Idle` when no mechanism could be selected; the
    /// caller should then ask [`Sasl::explain_blocked`] why.
    pub fn start<C: Carrier>(
        &mut self,
        carrier: &mut C,
        creds: &Credentials,
        force_ir: bool,
    ) -> Result<Progress, SaslError> {
        self.force_ir = force_ir;
        self.authused = None;
        #[cfg(feature = "scram")]
        {
            self.scram = None;
        }

        let Some(choice) = select::choose(self, carrier, creds)? else {
            return Ok(Progress::Idle);
        };

        let mech = choice.mech.name();
        self.curmech = Some(mech);

        let mut ir = choice
            .resp
            .map(|raw| codec::encode_outgoing(Some(&raw), self.params.base64));

        // An oversized initial response is dropped, not truncated; the
        // exchange then starts with a bare AUTH command.
        if self.params.maxirlen > 0 {
            if let Some(encoded) = &ir {
                if mech.len() + encoded.len() > self.params.maxirlen {
                    ir = None;
                }
            }
        }

        carrier.send_auth(mech, ir.as_deref())?;
        self.set_state(if ir.is_some() { choice.state2 } else { choice.state1 });
        Ok(Progress::InProgress)
    }

    /// Feed the next server result code into the state machine.
    pub fn continue_auth<C: Carrier>(
        &mut self,
        carrier: &mut C,
        creds: &Credentials,
        code: u16,
    ) -> Result<Progress, SaslError> {
        if self.state == State::Final {
            let ok = code == self.params.finalcode;
            self.set_state(State::Stop);
            return if ok { Ok(Progress::Done) } else { Err(SaslError::LoginDenied) };
        }

        if self.state != State::Cancel
            && self.state != State::OAuth2Resp
            && code != self.params.contcode
        {
            self.set_state(State::Stop);
            return Err(SaslError::LoginDenied);
        }

        match self.state {
            State::Stop => return Ok(Progress::Done),
            State::Cancel => {
                // Remove the offending mechanism and try the next-best one.
                if let Some(failed) = self.authused {
                    self.authmechs.remove(failed);
                }
                return self.start(carrier, creds, self.force_ir);
            }
            State::OAuth2Resp if code == self.params.finalcode => {
                self.set_state(State::Stop);
                return Ok(Progress::Done);
            }
            State::OAuth2Resp if code != self.params.contcode => {
                self.set_state(State::Stop);
                return Err(SaslError::LoginDenied);
            }
            _ => {}
        }

        let Some(mech) = self.curmech else {
            self.set_state(State::Stop);
            return Err(SaslError::UnsupportedProtocol);
        };

        match self.step(carrier, creds) {
            // The server spoke gibberish: cancel this mechanism and let the
            // cancel turn restart selection without it.
            Err(SaslError::BadServerEncoding) => {
                let sent = carrier.cancel_auth(mech);
                self.set_state(State::Cancel);
                sent?;
                Ok(Progress::InProgress)
            }
            Ok((resp, newstate)) => {
                let msg = codec::encode_outgoing(resp.as_deref(), self.params.base64);
                let sent = carrier.cont_auth(mech, &msg);
                self.set_state(newstate);
                sent?;
                Ok(Progress::InProgress)
            }
            Err(err) => {
                self.set_state(State::Stop);
                Err(err)
            }
        }
    }

    /// Produce this turn's outgoing payload and the state to commit.
    /// `None` as payload means "no message" (an empty line under base64
    /// framing); `Some` of an empty buffer is the explicit empty response.
    fn step<C: Carrier>(
        &mut self,
        carrier: &mut C,
        creds: &Credentials,
    ) -> Result<(Option<Vec<u8>>, State), SaslError> {
        let user = creds.user.unwrap_or("");
        let mut newstate = State::Final;
        let resp: Option<Vec<u8>> = match self.state {
            State::Plain => Some(plain::message(
                creds.authzid.unwrap_or(""),
                user,
                creds.passwd,
            )),
            State::Login => {
                newstate = State::LoginPasswd;
                Some(login::message(user))
            }
            State::LoginPasswd => Some(login::message(creds.passwd)),
            State::External => Some(external::message(user)),
            #[cfg(feature = "scram")]
            State::Scram => {
                let serverdata = self.server_message(carrier)?;
                let exchange = self.scram.as_mut().ok_or(SaslError::FailedInit)?;
                let out = exchange.step(&serverdata, creds.passwd)?;
                if out.as_deref().is_some_and(|data| !data.is_empty()) {
                    newstate = State::Scram;
                }
                out
            }
            #[cfg(feature = "digest-auth")]
            State::CramMd5 => {
                let serverdata = self.server_message(carrier)?;
                Some(cram_md5::response(user, creds.passwd, &serverdata))
            }
            #[cfg(feature = "digest-auth")]
            State::DigestMd5 => {
                let serverdata = self.server_message(carrier)?;
                let msg = digest_md5::message(&serverdata, user, creds.passwd, self.service())?;
                if self.params.base64 {
                    newstate = State::DigestMd5Resp;
                }
                Some(msg)
            }
            // The rspauth turn is answered with a blank line.
            #[cfg(feature = "digest-auth")]
            State::DigestMd5Resp => None,
            #[cfg(feature = "ntlm")]
            State::Ntlm => {
                newstate = State::NtlmType2Msg;
                Some(ntlm::type1_message())
            }
            #[cfg(feature = "ntlm")]
            State::NtlmType2Msg => {
                let serverdata = self.server_message(carrier)?;
                let type2 = ntlm::decode_type2(&serverdata)?;
                Some(ntlm::type3_message(user, creds.passwd, &type2)?)
            }
            State::Gssapi | State::GssapiToken | State::GssapiNoData => {
                // Selection probes for a platform GSS library before these
                // states can be entered; without one there is no context.
                // mutual_auth would add the GssapiNoData turn.
                return Err(SaslError::FailedInit);
            }
            State::OAuth2 => {
                let bearer = creds.bearer.ok_or(SaslError::FailedInit)?;
                if self.authused == Some(Mechanism::OAuthBearer) {
                    // Failures may be sent as continuations for OAUTHBEARER.
                    newstate = State::OAuth2Resp;
                    Some(oauth::bearer_message(
                        user,
                        carrier.host(),
                        carrier.port(),
                        bearer,
                    ))
                } else {
                    Some(oauth::xoauth2_message(user, bearer))
                }
            }
            // Acknowledge the failure continuation with a 0x01 response and
            // let the final code settle the outcome.
            State::OAuth2Resp => Some(vec![0x01]),
            _ => {
                error!("unsupported SASL authentication mechanism state");
                return Err(SaslError::UnsupportedProtocol);
            }
        };
        Ok((resp, newstate))
    }

    /// Fetch and decode the server data for the current turn.
    fn server_message<C: Carrier>(&self, carrier: &mut C) -> Result<Vec<u8>, SaslError> {
        let raw = carrier.get_message()?;
        codec::decode_server(&raw, self.params.base64)
    }
}
