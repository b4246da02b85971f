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

use std::fmt;

use gallus::Error;

/// Server error code gallusd replies with when the user declines the
/// wallet's account-selection flow.
pub const ERROR_CODE_CONNECTION_REJECTED: i32 = -32100;

/// Server error code gallusd replies with when a transaction is declined
/// by the wallet or reverted by a contract.
pub const ERROR_CODE_TX_REVERTED: i32 = -32110;

/// Result type used throughout the client.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Client failure taxonomy. Every caught error is normalized into one of
/// these before it reaches a caller, so no error shape is ever accessed
/// without knowing it holds what we expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The user declined the wallet's account-selection flow
    ConnectionRejected,
    /// The wallet is on a different network than required
    WrongNetwork { expected: u64, actual: u64 },
    /// The wallet or a contract rejected the transaction
    TransactionReverted(String),
    /// Generic network or provider failure
    RpcFailure(String),
    /// Method not declared by the contract interface
    UnknownMethod(String),
    /// Wrong number of parameters for an interface method
    BadArity { method: String, expected: usize, found: usize },
    /// No wallet account has been authorized yet
    NotConnected,
    /// Malformed value received from the daemon
    ParseFailed(&'static str),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionRejected => {
                write!(f, "Wallet connection rejected by the user")
            }
            Self::WrongNetwork { expected, actual } => {
                write!(
                    f,
                    "Wallet is on chain {actual} but chain {expected} is required. \
                    Please switch the wallet network and try again"
                )
            }
            Self::TransactionReverted(msg) => write!(f, "Transaction reverted: {msg}"),
            Self::RpcFailure(msg) => write!(f, "RPC failure: {msg}"),
            Self::UnknownMethod(method) => {
                write!(f, "Method \"{method}\" is not part of the contract interface")
            }
            Self::BadArity { method, expected, found } => {
                write!(f, "Method \"{method}\" takes {expected} parameters, got {found}")
            }
            Self::NotConnected => {
                write!(f, "No wallet account connected. Connect the wallet first")
            }
            Self::ParseFailed(msg) => write!(f, "Parse failed: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<Error> for ClientError {
    fn from(e: Error) -> Self {
        match e {
            Error::JsonRpcError(code, message) => match code {
                ERROR_CODE_CONNECTION_REJECTED => Self::ConnectionRejected,
                ERROR_CODE_TX_REVERTED => Self::TransactionReverted(message),
                _ => Self::RpcFailure(message),
            },
            e => Self::RpcFailure(e.to_string()),
        }
    }
}
