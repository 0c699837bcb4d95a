/*
 * login.rs
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

//! LOGIN (draft-murchison-sasl-login). Two turns: username, then password;
//! the server's "Username:"/"Password:" prompts are decorative and ignored.

/// Build one LOGIN turn. The driver decides whether `value` is the username
/// or the password from its own state.
pub fn message(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}
