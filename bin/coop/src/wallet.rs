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

use std::{fmt, str::FromStr};

use log::warn;

use gallus::{rpc::util::JsonValue, Error};

use crate::{
    error::{ClientError, ClientResult},
    Coop,
};

/// Networks the client knows how to verify, mapped to chain IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Localnet,
    Testnet,
    Mainnet,
}

impl Network {
    /// Chain ID the connected wallet must report for this network.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Localnet => 31337,
            Self::Testnet => 4,
            Self::Mainnet => 1,
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "localnet" => Ok(Self::Localnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            _ => Err(Error::ParseFailed("Unknown network")),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Localnet => write!(f, "localnet"),
            Self::Testnet => write!(f, "testnet"),
            Self::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Connection handle for chain queries. Read-only by default, it becomes
/// a signing handle when bound to an authorized wallet account.
pub struct Provider<'a> {
    coop: &'a Coop,
    account: Option<String>,
}

impl<'a> Provider<'a> {
    pub(crate) fn new(coop: &'a Coop, account: Option<String>) -> Self {
        Self { coop, account }
    }

    /// Whether this handle can author transactions.
    pub fn is_signer(&self) -> bool {
        self.account.is_some()
    }

    /// The account this handle signs with, if any.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Forward a raw request over the underlying daemon connection.
    pub(crate) async fn request(
        &self,
        method: &str,
        params: Vec<JsonValue>,
    ) -> ClientResult<JsonValue> {
        Ok(self.coop.daemon_request(method, JsonValue::Array(params)).await?)
    }
}

/// Fail unless the reported chain ID matches the required network.
pub fn ensure_chain(network: Network, actual: u64) -> ClientResult<()> {
    let expected = network.chain_id();
    if actual != expected {
        return Err(ClientError::WrongNetwork { expected, actual })
    }

    Ok(())
}

impl Coop {
    /// Open the wallet's account-selection flow and remember the authorized
    /// account. The wallet must be on the required network first.
    pub async fn connect(&self) -> ClientResult<String> {
        self.provider().await?;

        let rep = self.daemon_request("wallet.connect", JsonValue::Array(vec![])).await?;
        let Some(account) = rep.get::<String>() else {
            return Err(ClientError::ParseFailed("wallet.connect reply is not a string"))
        };
        let account = account.clone();

        *self.account.lock().await = Some(account.clone());
        self.session.set_wallet_connected(account.clone()).await;

        Ok(account)
    }

    /// Acquire a read-only provider handle, verifying the wallet network
    /// before any contract call is attempted. No retry, the caller must
    /// re-invoke manually.
    pub async fn provider(&self) -> ClientResult<Provider<'_>> {
        let actual = self.chain_id().await?;
        if let Err(e) = ensure_chain(self.network, actual) {
            warn!(target: "coop::wallet", "{e}");
            return Err(e)
        }

        Ok(Provider::new(self, None))
    }

    /// Acquire a signing handle. Requires an authorized account on the
    /// required network.
    pub async fn signer(&self) -> ClientResult<Provider<'_>> {
        let actual = self.chain_id().await?;
        ensure_chain(self.network, actual)?;

        let Some(account) = self.account.lock().await.clone() else {
            return Err(ClientError::NotConnected)
        };

        Ok(Provider::new(self, Some(account)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_check() {
        assert!(ensure_chain(Network::Testnet, 4).is_ok());
        assert_eq!(
            ensure_chain(Network::Testnet, 1),
            Err(ClientError::WrongNetwork { expected: 4, actual: 1 })
        );
        assert!(ensure_chain(Network::Mainnet, 1).is_ok());
        assert!(ensure_chain(Network::Localnet, 31337).is_ok());
    }

    #[test]
    fn network_parsing() {
        assert_eq!(Network::from_str("testnet").unwrap(), Network::Testnet);
        assert_eq!(Network::from_str("MAINNET").unwrap(), Network::Mainnet);
        assert!(Network::from_str("chickennet").is_err());
    }
}
