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

use gallus::rpc::util::{json_str, JsonValue};

use crate::{
    error::{ClientError, ClientResult},
    wallet::Provider,
};

/// Description of a contract's callable surface: method names with their
/// parameter counts.
#[derive(Clone, Debug)]
pub struct ContractInterface {
    pub methods: &'static [(&'static str, usize)],
}

impl ContractInterface {
    /// Validate a call against the interface. Runs before any network
    /// traffic is produced.
    pub fn validate(&self, method: &str, arity: usize) -> ClientResult<()> {
        let Some((_, expected)) = self.methods.iter().find(|(name, _)| *name == method) else {
            return Err(ClientError::UnknownMethod(method.to_string()))
        };

        if *expected != arity {
            return Err(ClientError::BadArity {
                method: method.to_string(),
                expected: *expected,
                found: arity,
            })
        }

        Ok(())
    }
}

/// Callable contract handle, binding a deployed address and an interface
/// description to a provider-or-signer connection. Pure construction.
pub struct Contract<'a> {
    /// Deployed contract address
    pub address: &'static str,
    /// The contract's callable surface
    pub iface: &'static ContractInterface,
    /// Underlying connection
    conn: Provider<'a>,
}

impl<'a> Contract<'a> {
    pub fn new(
        address: &'static str,
        iface: &'static ContractInterface,
        conn: Provider<'a>,
    ) -> Self {
        Self { address, iface, conn }
    }

    /// Invoke a read-only contract method and return its raw result.
    pub async fn read(&self, method: &str, params: Vec<JsonValue>) -> ClientResult<JsonValue> {
        self.iface.validate(method, params.len())?;

        let mut wire = vec![json_str(self.address), json_str(method)];
        wire.extend(params);

        self.conn.request("contract.read", wire).await
    }

    /// Submit a transaction invoking a state-changing contract method and
    /// return the transaction ID. Requires a signing connection.
    pub async fn invoke(&self, method: &str, params: Vec<JsonValue>) -> ClientResult<String> {
        self.iface.validate(method, params.len())?;

        if !self.conn.is_signer() {
            return Err(ClientError::NotConnected)
        }

        let mut wire = vec![json_str(self.address), json_str(method)];
        wire.extend(params);

        let rep = self.conn.request("wallet.invoke", wire).await?;
        let Some(txid) = rep.get::<String>() else {
            return Err(ClientError::ParseFailed("wallet.invoke reply is not a string"))
        };

        Ok(txid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::DAO_INTERFACE;

    #[test]
    fn interface_validation() {
        assert!(DAO_INTERFACE.validate("numProposals", 0).is_ok());
        assert!(DAO_INTERFACE.validate("proposals", 1).is_ok());
        assert!(DAO_INTERFACE.validate("voteOnProposal", 2).is_ok());

        assert!(matches!(
            DAO_INTERFACE.validate("mintEggs", 0),
            Err(ClientError::UnknownMethod(_))
        ));
        assert!(matches!(
            DAO_INTERFACE.validate("proposals", 2),
            Err(ClientError::BadArity { expected: 1, found: 2, .. })
        ));
    }
}
