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

use std::time::Instant;

use gallus::{
    rpc::{
        jsonrpc::JsonRequest,
        util::{json_str, JsonValue},
    },
    system::msleep,
    Result,
};

use crate::{
    error::{ClientError, ClientResult},
    wallet::Provider,
    Coop,
};

impl Coop {
    /// Auxiliary function to execute a request towards the configured
    /// gallusd daemon JSON-RPC endpoint.
    pub async fn daemon_request(&self, method: &str, params: JsonValue) -> Result<JsonValue> {
        let req = JsonRequest::new(method, params);
        self.rpc_client.request(req).await
    }

    /// Auxiliary function to ping the configured gallusd daemon for liveness.
    pub async fn ping(&self) -> Result<()> {
        eprintln!("Executing ping request to gallusd...");
        let latency = Instant::now();
        let rep = self.daemon_request("ping", JsonValue::Array(vec![])).await?;
        let latency = latency.elapsed();
        eprintln!("Got reply: {rep:?}");
        eprintln!("Latency: {latency:?}");
        Ok(())
    }

    /// Query gallusd for the chain ID the connected wallet is active on.
    pub async fn chain_id(&self) -> ClientResult<u64> {
        let rep = self.daemon_request("wallet.chain_id", JsonValue::Array(vec![])).await?;
        let Some(chain_id) = rep.get::<f64>() else {
            return Err(ClientError::ParseFailed("wallet.chain_id reply is not a number"))
        };

        Ok(*chain_id as u64)
    }

    /// Block until the given transaction has at least one confirmation.
    /// There is deliberately no timeout; a hung daemon hangs the wait and
    /// the user can abort the process.
    pub async fn await_confirmation(&self, txid: &str) -> ClientResult<()> {
        loop {
            let rep = self
                .daemon_request("tx.confirmations", JsonValue::Array(vec![json_str(txid)]))
                .await?;
            let Some(confirmations) = rep.get::<f64>() else {
                return Err(ClientError::ParseFailed("tx.confirmations reply is not a number"))
            };

            if *confirmations >= 1.0 {
                return Ok(())
            }

            msleep(2000).await;
        }
    }
}

impl Provider<'_> {
    /// Query the native balance of the given address, in atomic units.
    pub async fn get_balance(&self, address: &str) -> ClientResult<u64> {
        let rep = self.request("chain.get_balance", vec![json_str(address)]).await?;
        let Some(balance) = rep.get::<String>() else {
            return Err(ClientError::ParseFailed("chain.get_balance reply is not a string"))
        };

        let Ok(balance) = balance.parse::<u64>() else {
            return Err(ClientError::ParseFailed("Balance is not an integer"))
        };

        Ok(balance)
    }
}
