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

use gallus::rpc::util::JsonValue;

use crate::{
    contract::{Contract, ContractInterface},
    error::{ClientError, ClientResult},
    Coop,
};

/// Deployed address of the Gallus membership NFT contract.
pub const GALLUS_NFT_ADDRESS: &str = "GNFTxK9yQm3dVXpL2JvRa8cW5tU4ZsEbhHgFfD6nTiAe";

/// Callable surface of the membership NFT contract.
pub const NFT_INTERFACE: ContractInterface = ContractInterface { methods: &[("balanceOf", 1)] };

impl Coop {
    /// Query how many membership NFTs the connected account holds.
    /// Membership gates proposal creation and voting on chain, so this
    /// needs an authorized account.
    pub async fn nft_balance(&self) -> ClientResult<u64> {
        let signer = self.signer().await?;
        let Some(account) = signer.account().map(|x| x.to_string()) else {
            return Err(ClientError::NotConnected)
        };

        let contract = Contract::new(GALLUS_NFT_ADDRESS, &NFT_INTERFACE, signer);
        let rep = contract.read("balanceOf", vec![JsonValue::String(account)]).await?;

        let Some(balance) = rep.get::<f64>() else {
            return Err(ClientError::ParseFailed("balanceOf reply is not a number"))
        };

        Ok(*balance as u64)
    }
}
