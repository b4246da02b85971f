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

use std::{collections::HashMap, fmt, str::FromStr};

use log::warn;

use gallus::{
    rpc::util::JsonValue,
    util::{parse::encode_base10, time::Timestamp},
};

use crate::{
    contract::{Contract, ContractInterface},
    error::{ClientError, ClientResult},
    Coop,
};

/// Deployed address of the Gallus DAO governance contract.
pub const GALLUS_DAO_ADDRESS: &str = "GDAOqWtZ6H1vPkZ9cD4PTFXwzeCX1uEJ5R7SgK3mhNBY";

/// Number of base 10 decimals the native balance is displayed with.
pub const BALANCE_BASE10_DECIMALS: usize = 8;

/// Callable surface of the DAO governance contract.
pub const DAO_INTERFACE: ContractInterface = ContractInterface {
    methods: &[
        ("numProposals", 0),
        ("proposals", 1),
        ("createProposal", 1),
        ("voteOnProposal", 2),
        ("executeProposal", 1),
    ],
};

/// Snapshot of an on-chain proposal record. The contract owns the
/// authoritative copy; this client only ever reads it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    /// Numeric identifier for the proposal
    pub id: u64,
    /// NFT token ID the treasury should purchase
    pub token_id: u64,
    /// Voting deadline
    pub deadline: Timestamp,
    /// Number of yea votes cast
    pub yea_votes: u64,
    /// Number of nay votes cast
    pub nay_votes: u64,
    /// Whether the proposal has been executed
    pub executed: bool,
}

impl Proposal {
    /// Derive the proposal's lifecycle status against the given time.
    /// The three states are mutually exclusive.
    pub fn status(&self, now: Timestamp) -> ProposalStatus {
        if self.executed {
            return ProposalStatus::Settled
        }

        if self.deadline > now {
            return ProposalStatus::VotingOpen
        }

        ProposalStatus::Executable
    }

    /// Parse a proposal snapshot from its wire representation.
    fn from_json(id: u64, value: &JsonValue) -> ClientResult<Self> {
        if !value.is_object() {
            return Err(ClientError::ParseFailed("Proposal reply is not an object"))
        }
        let map: &HashMap<String, JsonValue> = value.get().unwrap();

        let Some(token_id) = map.get("token_id").and_then(|x| x.get::<f64>()) else {
            return Err(ClientError::ParseFailed("Proposal token_id is malformed"))
        };

        let Some(deadline) = map.get("deadline").and_then(|x| x.get::<f64>()) else {
            return Err(ClientError::ParseFailed("Proposal deadline is malformed"))
        };

        let Some(yea_votes) = map.get("yea_votes").and_then(|x| x.get::<f64>()) else {
            return Err(ClientError::ParseFailed("Proposal yea_votes is malformed"))
        };

        let Some(nay_votes) = map.get("nay_votes").and_then(|x| x.get::<f64>()) else {
            return Err(ClientError::ParseFailed("Proposal nay_votes is malformed"))
        };

        let Some(executed) = map.get("executed").and_then(|x| x.get::<bool>()) else {
            return Err(ClientError::ParseFailed("Proposal executed flag is malformed"))
        };

        Ok(Self {
            id,
            token_id: *token_id as u64,
            deadline: Timestamp(*deadline as i64),
            yea_votes: *yea_votes as u64,
            nay_votes: *nay_votes as u64,
            executed: *executed,
        })
    }
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = format!(
            concat!(
                "Proposal parameters\n",
                "===================\n",
                "Proposal ID: {}\n",
                "NFT to purchase: {}\n",
                "Deadline: {}\n",
                "Yea votes: {}\n",
                "Nay votes: {}\n",
                "Executed: {}",
            ),
            self.id, self.token_id, self.deadline, self.yea_votes, self.nay_votes, self.executed,
        );

        write!(f, "{}", s)
    }
}

/// Lifecycle status of a proposal, derived at render time by comparing
/// its deadline with the current time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Deadline in the future and not executed, votes can be cast
    VotingOpen,
    /// Deadline passed and not executed, anyone can execute
    Executable,
    /// Executed on chain
    Settled,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::VotingOpen => write!(f, "Voting open"),
            Self::Executable => write!(f, "Executable"),
            Self::Settled => write!(f, "Settled"),
        }
    }
}

/// A vote on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vote {
    Yea,
    Nay,
}

impl Vote {
    /// Wire encoding the contract expects.
    pub fn wire(&self) -> u64 {
        match self {
            Self::Yea => 0,
            Self::Nay => 1,
        }
    }
}

impl FromStr for Vote {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yea" => Ok(Self::Yea),
            "nay" => Ok(Self::Nay),
            _ => Err(ClientError::ParseFailed("Vote must be \"yea\" or \"nay\"")),
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Yea => write!(f, "YEA"),
            Self::Nay => write!(f, "NAY"),
        }
    }
}

impl Coop {
    /// Query the native balance held by the DAO contract, in atomic units.
    pub async fn dao_treasury_balance(&self) -> ClientResult<u64> {
        let provider = self.provider().await?;
        provider.get_balance(GALLUS_DAO_ADDRESS).await
    }

    /// Query the number of proposals created in the DAO.
    pub async fn dao_num_proposals(&self) -> ClientResult<u64> {
        let provider = self.provider().await?;
        let contract = Contract::new(GALLUS_DAO_ADDRESS, &DAO_INTERFACE, provider);
        let rep = contract.read("numProposals", vec![]).await?;

        let Some(num) = rep.get::<f64>() else {
            return Err(ClientError::ParseFailed("numProposals reply is not a number"))
        };

        Ok(*num as u64)
    }

    /// Fetch a single proposal snapshot by ID.
    pub async fn dao_fetch_proposal(&self, id: u64) -> ClientResult<Proposal> {
        let provider = self.provider().await?;
        let contract = Contract::new(GALLUS_DAO_ADDRESS, &DAO_INTERFACE, provider);
        self.dao_fetch_proposal_with(&contract, id).await
    }

    /// Fetch a single proposal snapshot over an existing contract handle.
    async fn dao_fetch_proposal_with(
        &self,
        contract: &Contract<'_>,
        id: u64,
    ) -> ClientResult<Proposal> {
        let rep = contract.read("proposals", vec![JsonValue::Number(id as f64)]).await?;
        Proposal::from_json(id, &rep)
    }

    /// Fetch all proposal snapshots, strictly sequentially, in ID order.
    /// A failed lookup aborts the whole fetch so a partial list never
    /// reaches the caller.
    pub async fn dao_fetch_all_proposals(&self) -> ClientResult<Vec<Proposal>> {
        let provider = self.provider().await?;
        let contract = Contract::new(GALLUS_DAO_ADDRESS, &DAO_INTERFACE, provider);

        let rep = contract.read("numProposals", vec![]).await?;
        let Some(num) = rep.get::<f64>() else {
            return Err(ClientError::ParseFailed("numProposals reply is not a number"))
        };
        let num = *num as u64;

        let mut proposals = Vec::with_capacity(num as usize);
        for id in 0..num {
            proposals.push(self.dao_fetch_proposal_with(&contract, id).await?);
        }

        Ok(proposals)
    }

    /// Fetch the treasury balance, membership balance and proposal count,
    /// updating the session. Each query updates a single independent field,
    /// fails independently, and keeps prior state on failure.
    pub async fn refresh_overview(&self) {
        match self.dao_treasury_balance().await {
            Ok(balance) => self.session.set_treasury_balance(balance).await,
            Err(e) => warn!(target: "coop::dao", "Failed fetching treasury balance: {e}"),
        }

        match self.nft_balance().await {
            Ok(balance) => self.session.set_nft_balance(balance).await,
            Err(e) => warn!(target: "coop::dao", "Failed fetching NFT balance: {e}"),
        }

        match self.dao_num_proposals().await {
            Ok(num) => self.session.set_num_proposals(num).await,
            Err(e) => warn!(target: "coop::dao", "Failed fetching number of proposals: {e}"),
        }
    }

    /// Refresh the cached proposal list, keeping prior state on failure.
    pub async fn refresh_proposals(&self) {
        match self.dao_fetch_all_proposals().await {
            Ok(proposals) => self.session.set_proposals(proposals).await,
            Err(e) => warn!(target: "coop::dao", "Failed refreshing proposals: {e}"),
        }
    }

    /// Submit a proposal to purchase the given NFT, wait for one
    /// confirmation and refresh the proposal count.
    pub async fn dao_create_proposal(&self, token_id: u64) -> ClientResult<String> {
        let signer = self.signer().await?;
        let contract = Contract::new(GALLUS_DAO_ADDRESS, &DAO_INTERFACE, signer);
        let txid =
            contract.invoke("createProposal", vec![JsonValue::Number(token_id as f64)]).await?;

        self.session.set_loading(true).await;
        let confirmed = self.await_confirmation(&txid).await;
        self.session.set_loading(false).await;
        confirmed?;

        match self.dao_num_proposals().await {
            Ok(num) => self.session.set_num_proposals(num).await,
            Err(e) => warn!(target: "coop::dao", "Failed refreshing number of proposals: {e}"),
        }

        Ok(txid)
    }

    /// Cast a vote on the given proposal, wait for one confirmation and
    /// refresh the proposal list.
    pub async fn dao_vote(&self, id: u64, vote: Vote) -> ClientResult<String> {
        let signer = self.signer().await?;
        let contract = Contract::new(GALLUS_DAO_ADDRESS, &DAO_INTERFACE, signer);
        let txid = contract
            .invoke(
                "voteOnProposal",
                vec![JsonValue::Number(id as f64), JsonValue::Number(vote.wire() as f64)],
            )
            .await?;

        self.session.set_loading(true).await;
        let confirmed = self.await_confirmation(&txid).await;
        self.session.set_loading(false).await;
        confirmed?;

        self.refresh_proposals().await;

        Ok(txid)
    }

    /// Execute the given proposal, wait for one confirmation and refresh
    /// the proposal list.
    pub async fn dao_execute(&self, id: u64) -> ClientResult<String> {
        let signer = self.signer().await?;
        let contract = Contract::new(GALLUS_DAO_ADDRESS, &DAO_INTERFACE, signer);
        let txid =
            contract.invoke("executeProposal", vec![JsonValue::Number(id as f64)]).await?;

        self.session.set_loading(true).await;
        let confirmed = self.await_confirmation(&txid).await;
        self.session.set_loading(false).await;
        confirmed?;

        self.refresh_proposals().await;

        Ok(txid)
    }

    /// Format an atomic-unit balance for display.
    pub fn display_balance(balance: u64) -> String {
        encode_base10(balance, BALANCE_BASE10_DECIMALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> Proposal {
        Proposal {
            id: 0,
            token_id: 7,
            deadline: Timestamp(1_000_100),
            yea_votes: 0,
            nay_votes: 0,
            executed: false,
        }
    }

    #[test]
    fn proposal_status_classification() {
        let now = Timestamp(1_000_000);
        let mut p = proposal();

        assert_eq!(p.status(now), ProposalStatus::VotingOpen);

        p.deadline = Timestamp(999_900);
        assert_eq!(p.status(now), ProposalStatus::Executable);

        p.executed = true;
        assert_eq!(p.status(now), ProposalStatus::Settled);

        // An executed proposal stays settled regardless of its deadline
        p.deadline = Timestamp(1_000_100);
        assert_eq!(p.status(now), ProposalStatus::Settled);

        // A deadline exactly at the current time is no longer open
        p.executed = false;
        p.deadline = now;
        assert_eq!(p.status(now), ProposalStatus::Executable);
    }

    #[test]
    fn vote_parsing() {
        assert_eq!(Vote::from_str("yea").unwrap(), Vote::Yea);
        assert_eq!(Vote::from_str("NAY").unwrap(), Vote::Nay);
        assert!(Vote::from_str("maybe").is_err());

        assert_eq!(Vote::Yea.wire(), 0);
        assert_eq!(Vote::Nay.wire(), 1);
    }

    #[test]
    fn proposal_wire_parsing() {
        let value: JsonValue = r#"{
            "token_id": 7,
            "deadline": 1000100,
            "yea_votes": 3,
            "nay_votes": 1,
            "executed": false
        }"#
        .parse()
        .unwrap();

        let p = Proposal::from_json(4, &value).unwrap();
        assert_eq!(p.id, 4);
        assert_eq!(p.token_id, 7);
        assert_eq!(p.deadline, Timestamp(1_000_100));
        assert_eq!(p.yea_votes, 3);
        assert_eq!(p.nay_votes, 1);
        assert!(!p.executed);

        let missing: JsonValue = r#"{"token_id": 7}"#.parse().unwrap();
        assert!(matches!(
            Proposal::from_json(0, &missing),
            Err(ClientError::ParseFailed(_))
        ));

        let not_an_object: JsonValue = "[]".parse().unwrap();
        assert!(Proposal::from_json(0, &not_an_object).is_err());
    }
}
