/*
 * error.rs
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

//! Error taxonomy for the SASL engine.

use thiserror::Error;

/// Errors surfaced by the negotiation engine.
///
/// `BadServerEncoding` is the only self-recovered error: the driver answers it
/// with a cancellation and falls back to the next mechanism. Everything else
/// stops the session.
#[derive(Debug, Error)]
pub enum SaslError {
    /// An auth option from the URL or configuration named no known mechanism.
    #[error("malformed authentication option")]
    MalformedOption,

    /// Server data could not be decoded by the active mechanism.
    #[error("could not decode server data")]
    BadServerEncoding,

    /// The server rejected the credentials, or answered a turn with an
    /// unexpected result code.
    #[error("login denied")]
    LoginDenied,

    /// The driver reached a state it does not recognise.
    #[error("unsupported SASL authentication mechanism")]
    UnsupportedProtocol,

    /// A mechanism context required by a continuation was missing.
    #[error("authentication context not initialized")]
    FailedInit,

    /// The mechanism itself failed (e.g. SCRAM server signature mismatch).
    #[error("{0}")]
    MechanismFailed(String),

    /// The carrier protocol failed to transmit a message.
    #[error("carrier failure: {0}")]
    Carrier(String),
}
