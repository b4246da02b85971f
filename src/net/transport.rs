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

use std::{io, path::PathBuf};

use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite};
use log::debug;
use smol::net::{
    unix::{UnixListener, UnixStream},
    TcpListener, TcpStream,
};
use url::Url;

use crate::{Error, Result};

/// Object-safe stream type used by dialers and listeners.
pub trait PtStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl PtStream for TcpStream {}
impl PtStream for UnixStream {}

/// Object-safe listener type returned by [`Listener::listen`].
#[async_trait]
pub trait PtListener: Send + Sync {
    async fn next(&self) -> io::Result<(Box<dyn PtStream>, Url)>;
}

/// Supported transports, derived from an endpoint URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Tcp,
    Unix,
}

impl Transport {
    fn from_url(url: &Url) -> Result<Self> {
        match url.scheme() {
            "tcp" => Ok(Self::Tcp),
            "unix" => Ok(Self::Unix),
            x => Err(Error::UnsupportedTransport(x.to_string())),
        }
    }
}

/// Dialer for outbound connections towards an endpoint URL.
#[derive(Debug, Clone)]
pub struct Dialer {
    /// The endpoint to connect to
    endpoint: Url,
    /// The transport to use for connecting
    transport: Transport,
}

impl Dialer {
    /// Instantiate a new [`Dialer`] with the given endpoint URL.
    pub async fn new(endpoint: Url) -> Result<Self> {
        let transport = Transport::from_url(&endpoint)?;
        Ok(Self { endpoint, transport })
    }

    /// Dial the instantiated endpoint and return an open stream.
    pub async fn dial(&self) -> Result<Box<dyn PtStream>> {
        match self.transport {
            Transport::Tcp => {
                let sockaddr = self.endpoint.socket_addrs(|| None)?[0];
                debug!(target: "net::transport", "Dialing {} TCP socket...", sockaddr);
                let Ok(stream) = TcpStream::connect(sockaddr).await else {
                    return Err(Error::ConnectFailed)
                };
                Ok(Box::new(stream))
            }

            Transport::Unix => {
                let path = PathBuf::from(self.endpoint.path());
                debug!(target: "net::transport", "Dialing {:?} Unix socket...", path);
                let Ok(stream) = UnixStream::connect(path).await else {
                    return Err(Error::ConnectFailed)
                };
                Ok(Box::new(stream))
            }
        }
    }
}

/// Listener for inbound connections on an endpoint URL.
#[derive(Debug, Clone)]
pub struct Listener {
    /// The endpoint to listen on
    endpoint: Url,
    /// The transport to use for listening
    transport: Transport,
}

impl Listener {
    /// Instantiate a new [`Listener`] with the given endpoint URL.
    pub async fn new(endpoint: Url) -> Result<Self> {
        let transport = Transport::from_url(&endpoint)?;
        Ok(Self { endpoint, transport })
    }

    /// Bind the instantiated endpoint and return an accept handle.
    pub async fn listen(&self) -> Result<Box<dyn PtListener>> {
        match self.transport {
            Transport::Tcp => {
                let sockaddr = self.endpoint.socket_addrs(|| None)?[0];
                debug!(target: "net::transport", "Binding {} TCP socket...", sockaddr);
                let Ok(listener) = TcpListener::bind(sockaddr).await else {
                    return Err(Error::BindFailed(self.endpoint.as_str().into()))
                };
                Ok(Box::new(listener))
            }

            Transport::Unix => {
                let path = PathBuf::from(self.endpoint.path());
                debug!(target: "net::transport", "Binding {:?} Unix socket...", path);
                // Remove a stale socket file from a previous run.
                let _ = smol::fs::remove_file(&path).await;
                let Ok(listener) = UnixListener::bind(&path) else {
                    return Err(Error::BindFailed(self.endpoint.as_str().into()))
                };
                Ok(Box::new(listener))
            }
        }
    }
}

#[async_trait]
impl PtListener for TcpListener {
    async fn next(&self) -> io::Result<(Box<dyn PtStream>, Url)> {
        let (stream, peer_addr) = self.accept().await?;
        let url = Url::parse(&format!("tcp://{peer_addr}"))
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?;
        Ok((Box::new(stream), url))
    }
}

#[async_trait]
impl PtListener for UnixListener {
    async fn next(&self) -> io::Result<(Box<dyn PtStream>, Url)> {
        let (stream, _peer_addr) = self.accept().await?;
        let url = Url::parse("unix:///unnamed")
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?;
        Ok((Box::new(stream), url))
    }
}
