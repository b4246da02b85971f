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

//! JSON-RPC client-side implementation.
use log::{debug, error};
use smol::io::BufReader;
use tinyjson::JsonValue;
use url::Url;

use super::{
    common::{read_from_stream, write_to_stream},
    jsonrpc::{JsonRequest, JsonResult},
};
use crate::{
    net::transport::{Dialer, PtStream},
    system::{ExecutorPtr, StoppableTask, StoppableTaskPtr},
    Error, Result,
};

/// JSON-RPC client implementation using asynchronous channels.
pub struct RpcClient {
    /// Request submission channel
    req_send: smol::channel::Sender<JsonRequest>,
    /// Reply reception channel
    rep_recv: smol::channel::Receiver<JsonResult>,
    /// Background request-reply task
    task: StoppableTaskPtr,
    /// The endpoint the client is connected to
    endpoint: Url,
}

impl RpcClient {
    /// Instantiate a new JSON-RPC client connected to the given endpoint.
    pub async fn new(endpoint: Url, ex: ExecutorPtr) -> Result<Self> {
        let dialer = Dialer::new(endpoint.clone()).await?;
        let stream = dialer.dial().await?;
        debug!(target: "rpc::client", "Connected to {}", endpoint);

        let (req_send, req_recv) = smol::channel::unbounded();
        let (rep_send, rep_recv) = smol::channel::unbounded();

        let task = StoppableTask::new();
        task.clone().start(
            Self::reqrep_loop(stream, rep_send, req_recv),
            |res| async move {
                match res {
                    Ok(()) | Err(Error::RpcClientStopped) => { /* Do nothing */ }
                    Err(e) => error!(target: "rpc::client", "JSON-RPC client error: {e}"),
                }
            },
            Error::RpcClientStopped,
            ex,
        );

        Ok(Self { req_send, rep_recv, task, endpoint })
    }

    /// Stop the JSON-RPC client's background task, closing the connection.
    pub async fn stop(&self) {
        self.task.stop().await;
    }

    /// Internal function that loops on the connected stream and multiplexes
    /// requests and replies over the client's channels.
    async fn reqrep_loop(
        stream: Box<dyn PtStream>,
        rep_send: smol::channel::Sender<JsonResult>,
        req_recv: smol::channel::Receiver<JsonRequest>,
    ) -> Result<()> {
        let (reader, mut writer) = smol::io::split(stream);
        let mut reader = BufReader::new(reader);

        loop {
            // The channel closes when the client is dropped.
            let Ok(request) = req_recv.recv().await else { break };

            write_to_stream(&mut writer, &JsonResult::Request(request)).await?;

            let mut buf = vec![];
            read_from_stream(&mut reader, &mut buf).await?;
            let val: JsonValue = String::from_utf8(buf)?.parse()?;
            let reply = JsonResult::try_from_value(&val)?;

            if rep_send.send(reply).await.is_err() {
                break
            }
        }

        Ok(())
    }

    /// Send a given JSON-RPC request over the instantiated client and
    /// return the matching reply result.
    pub async fn request(&self, req: JsonRequest) -> Result<JsonValue> {
        let req_id = req.id;
        debug!(target: "rpc::client", "--> {}", req.stringify()?);

        // If the connection is closed, the sender will get an error
        // for sending to a closed channel.
        if self.req_send.send(req).await.is_err() {
            error!(
                target: "rpc::client",
                "JSON-RPC client unable to send to {} (channels closed)", self.endpoint,
            );
            return Err(Error::NetworkOperationFailed)
        }

        // If the connection is closed, the receiver will get an error
        // for waiting on a closed channel.
        let Ok(reply) = self.rep_recv.recv().await else {
            error!(
                target: "rpc::client",
                "JSON-RPC client unable to recv from {} (channels closed)", self.endpoint,
            );
            return Err(Error::NetworkOperationFailed)
        };

        match reply {
            JsonResult::Response(rep) => {
                debug!(target: "rpc::client", "<-- {}", rep.stringify()?);

                if rep.id != req_id {
                    return Err(Error::UnexpectedJsonRpc(
                        "Reply ID does not match request ID".to_string(),
                    ))
                }

                Ok(rep.result)
            }

            JsonResult::Error(e) => {
                debug!(target: "rpc::client", "<-- {}", e.stringify()?);
                Err(Error::JsonRpcError(e.error.code, e.error.message))
            }

            JsonResult::Notification(n) => {
                debug!(target: "rpc::client", "<-- {}", n.stringify()?);
                Err(Error::UnexpectedJsonRpc("Got unexpected notification reply".to_string()))
            }

            JsonResult::Request(r) => {
                debug!(target: "rpc::client", "<-- {}", r.stringify()?);
                Err(Error::UnexpectedJsonRpc("Got unexpected request object in reply".to_string()))
            }
        }
    }

    /// Oneshot send a given JSON-RPC request over the instantiated client
    /// and stop the client on reply.
    pub async fn oneshot_request(&self, req: JsonRequest) -> Result<JsonValue> {
        let rep = self.request(req).await?;
        self.stop().await;
        Ok(rep)
    }
}
