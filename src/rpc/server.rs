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

//! JSON-RPC server-side implementation.
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use smol::io::BufReader;
use tinyjson::JsonValue;
use url::Url;

use super::{
    common::{read_from_stream, write_to_stream},
    jsonrpc::{JsonRequest, JsonResult},
};
use crate::{
    net::transport::{Listener, PtStream},
    system::ExecutorPtr,
    Error, Result,
};

/// Asynchronous trait implementing a handler for incoming JSON-RPC requests.
/// Can be used by matching on methods and branching out to functions that
/// handle respective methods.
#[async_trait]
pub trait RequestHandler: Sync + Send {
    async fn handle_request(&self, req: JsonRequest) -> JsonResult;
}

/// Internal accept function that runs inside a loop for accepting incoming
/// JSON-RPC requests and passing them to the [`RequestHandler`].
pub async fn accept(
    stream: Box<dyn PtStream>,
    peer_addr: Url,
    rh: Arc<impl RequestHandler + 'static>,
) -> Result<()> {
    let (reader, mut writer) = smol::io::split(stream);
    let mut reader = BufReader::new(reader);

    loop {
        let mut buf = vec![];

        if let Err(e) = read_from_stream(&mut reader, &mut buf).await {
            debug!(target: "rpc::server", "Closed connection for {}: {}", peer_addr, e);
            break
        }

        let val: JsonValue = match String::from_utf8(buf)?.parse() {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    target: "rpc::server",
                    "JSON-RPC server received invalid JSON from {}: {}", peer_addr, e,
                );
                break
            }
        };

        let req = match JsonRequest::try_from(&val) {
            Ok(r) => {
                debug!(target: "rpc::server", "{} --> {}", peer_addr, r.stringify()?);
                r
            }
            Err(e) => {
                warn!(
                    target: "rpc::server",
                    "JSON-RPC server received invalid request from {}: {}", peer_addr, e,
                );
                break
            }
        };

        let reply = rh.handle_request(req).await;
        write_to_stream(&mut writer, &reply).await?;
    }

    Ok(())
}

/// Start a JSON-RPC server bound to the given accept URL and use the given
/// [`RequestHandler`] to handle incoming requests.
pub async fn listen_and_serve(
    accept_url: Url,
    rh: Arc<impl RequestHandler + 'static>,
    ex: ExecutorPtr,
) -> Result<()> {
    debug!(target: "rpc::server", "Trying to bind listener on {}", accept_url);
    let listener = Listener::new(accept_url.clone()).await?.listen().await?;
    info!(target: "rpc::server", "JSON-RPC listener bound to {}", accept_url);

    loop {
        let (stream, peer_addr) = match listener.next().await {
            Ok(x) => x,
            Err(e) => {
                error!(
                    target: "rpc::server",
                    "JSON-RPC server failed accepting connection on {}: {}", accept_url, e,
                );
                return Err(Error::AcceptConnectionFailed(accept_url.as_str().into()))
            }
        };

        info!(target: "rpc::server", "JSON-RPC server accepted connection from {}", peer_addr);

        // Detaching requests handling
        let _rh = rh.clone();
        ex.spawn(async move {
            if let Err(e) = accept(stream, peer_addr.clone(), _rh).await {
                error!(
                    target: "rpc::server",
                    "JSON-RPC server error on handling request of {}: {}", peer_addr, e,
                );
            }
        })
        .detach();
    }
}
