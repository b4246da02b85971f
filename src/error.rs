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

// Hello developer. Please add your error to the according subsection
// that is commented, or make a new subsection. Keep it clean.

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General library errors used throughout the codebase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // ==============
    // Parsing errors
    // ==============
    #[error("Parse failed: {0}")]
    ParseFailed(&'static str),

    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    // ===============
    // Encoding errors
    // ===============
    #[error(transparent)]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("JSON generate error: {0}")]
    JsonGenerateError(String),

    // ======================
    // Network-related errors
    // ======================
    #[error("Unsupported network transport: {0}")]
    UnsupportedTransport(String),

    #[error("Connection failed")]
    ConnectFailed,

    #[error("Create listener bound to {0} failed")]
    BindFailed(String),

    #[error("Accept a new incoming connection from the listener {0} failed")]
    AcceptConnectionFailed(String),

    #[error("Network operation failed")]
    NetworkOperationFailed,

    // ======================
    // JSON-RPC related errors
    // ======================
    #[error(transparent)]
    RpcError(#[from] RpcError),

    #[error("JSON-RPC server error {0}: {1}")]
    JsonRpcError(i32, String),

    #[error("Unexpected JSON-RPC data received: {0}")]
    UnexpectedJsonRpc(String),

    #[error("JSON-RPC client stopped")]
    RpcClientStopped,

    #[error("JSON-RPC server stopped")]
    RpcServerStopped,

    // ===============
    // System errors
    // ===============
    #[error("Detached task stopped")]
    DetachedTaskStopped,

    // ====================
    // Miscellaneous errors
    // ====================
    #[error("io error: {0:?}")]
    Io(std::io::ErrorKind),

    #[error("Logger setup error: {0}")]
    SetLoggerError(String),
}

/// Errors for JSON-RPC object conversions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

impl From<tinyjson::JsonParseError> for Error {
    fn from(err: tinyjson::JsonParseError) -> Self {
        Self::JsonParseError(err.to_string())
    }
}

impl From<tinyjson::JsonGenerateError> for Error {
    fn from(err: tinyjson::JsonGenerateError) -> Self {
        Self::JsonGenerateError(err.to_string())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Self::SetLoggerError(err.to_string())
    }
}
