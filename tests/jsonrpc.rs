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

use std::sync::Arc;

use async_trait::async_trait;
use tinyjson::JsonValue;
use url::Url;

use gallus::{
    rpc::{
        client::RpcClient,
        jsonrpc::{ErrorCode, JsonError, JsonRequest, JsonResponse, JsonResult},
        server::{listen_and_serve, RequestHandler},
    },
    system::msleep,
    Error, Result,
};

struct RpcSrv;

impl RpcSrv {
    async fn pong(&self, id: u16, _params: JsonValue) -> JsonResult {
        JsonResponse::new(JsonValue::String("pong".to_string()), id).into()
    }
}

#[async_trait]
impl RequestHandler for RpcSrv {
    async fn handle_request(&self, req: JsonRequest) -> JsonResult {
        assert!(req.params.is_array());

        match req.method.as_str() {
            "ping" => self.pong(req.id, req.params).await,
            "reject" => {
                JsonError::new(ErrorCode::ServerError(-32100), Some("declined".to_string()), req.id)
                    .into()
            }
            _ => JsonError::new(ErrorCode::MethodNotFound, None, req.id).into(),
        }
    }
}

fn find_free_endpoint() -> Result<Url> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let sockaddr = listener.local_addr()?;
    let endpoint = Url::parse(&format!("tcp://127.0.0.1:{}", sockaddr.port()))?;
    drop(listener);
    Ok(endpoint)
}

#[test]
fn jsonrpc_reqrep() -> Result<()> {
    let ex = Arc::new(smol::Executor::new());

    smol::block_on(ex.clone().run(async {
        let endpoint = find_free_endpoint()?;

        let rpcsrv = Arc::new(RpcSrv {});
        ex.spawn(listen_and_serve(endpoint.clone(), rpcsrv, ex.clone())).detach();

        // Let the server bind before dialing it.
        msleep(500).await;

        let client = RpcClient::new(endpoint, ex.clone()).await?;

        let req = JsonRequest::new("ping", JsonValue::Array(vec![]));
        let rep = client.request(req).await?;
        assert_eq!(rep.get::<String>().unwrap(), "pong");

        // Repeated requests over the same connection
        let req = JsonRequest::new("ping", JsonValue::Array(vec![]));
        let rep = client.request(req).await?;
        assert_eq!(rep.get::<String>().unwrap(), "pong");

        // Server-side errors surface code and message
        let req = JsonRequest::new("reject", JsonValue::Array(vec![]));
        match client.request(req).await {
            Err(Error::JsonRpcError(code, message)) => {
                assert_eq!(code, -32100);
                assert_eq!(message, "declined");
            }
            x => panic!("Unexpected reply: {x:?}"),
        }

        // Unknown methods map to the reserved code
        let req = JsonRequest::new("chicken", JsonValue::Array(vec![]));
        match client.request(req).await {
            Err(Error::JsonRpcError(code, _)) => assert_eq!(code, -32601),
            x => panic!("Unexpected reply: {x:?}"),
        }

        client.stop().await;
        Ok(())
    }))
}
