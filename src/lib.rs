/* This file is part of Gallus (https://gallus.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/// Error codes
pub mod error;
pub use error::{Error, Result, RpcError};

/// Network transports
pub mod net;

/// JSON-RPC implementation
pub mod rpc;

/// System primitives
pub mod system;

/// Utilities
pub mod util;

/// Macro to build a description string from the Cargo metadata of the
/// calling crate, for use in CLI `about` strings.
#[macro_export]
macro_rules! cli_desc {
    () => {{
        let desc = format!(
            "{} {}\n{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION").to_string(),
        );
        Box::leak(desc.into_boxed_str()) as &'static str
    }};
}
