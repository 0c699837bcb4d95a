/*
 * lib.rs
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

//! Client-side SASL negotiation engine for application protocols (IMAP,
//! POP3, SMTP, LDAP).
//!
//! The carrier protocol records which mechanisms the peer offered, calls
//! [`Sasl::start`] once, then feeds every (result code, server data) pair to
//! [`Sasl::continue_auth`] until progress reports `Done` or an error falls
//! out. Message transport stays with the carrier behind the [`Carrier`]
//! trait; this crate decides *what* to send, one turn at a time.
//!
//! ```no_run
//! use sigillo_core::{mechanism, Carrier, Credentials, MechSet, Progress, Sasl, SaslParams};
//!
//! # fn demo<C: Carrier>(carrier: &mut C) -> Result<(), sigillo_core::SaslError> {
//! let params = SaslParams {
//!     service: "smtp",
//!     defmechs: MechSet::ALL,
//!     maxirlen: 0,
//!     contcode: 334,
//!     finalcode: 235,
//!     base64: true,
//! };
//! let mut sasl = Sasl::new(params);
//! sasl.record_offered(mechanism::decode_mech_list("PLAIN LOGIN CRAM-MD5"));
//! let creds = Credentials { user: Some("alice"), passwd: "secret", ..Default::default() };
//!
//! let mut progress = sasl.start(carrier, &creds, true)?;
//! if progress == Progress::Idle {
//!     return Err(sasl.explain_blocked(&creds));
//! }
//! while progress == Progress::InProgress {
//!     let code = 334; // read the next server response here
//!     progress = sasl.continue_auth(carrier, &creds, code)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod diag;
mod driver;
pub mod error;
pub mod mech;
pub mod mechanism;
mod select;
pub mod session;

pub use error::SaslError;
pub use mechanism::{decode_mech, decode_mech_list, Mechanism, MechSet};
pub use session::{Carrier, Credentials, HttpAuth, Progress, Sasl, SaslParams, State};
