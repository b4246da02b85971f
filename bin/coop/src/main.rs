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

use std::{process::exit, str::FromStr, sync::Arc};

use smol::lock::Mutex;
use structopt_toml::{serde::Deserialize, structopt::StructOpt, StructOptToml};
use url::Url;

use gallus::{
    async_daemonize, cli_desc,
    rpc::client::RpcClient,
    system::ExecutorPtr,
    util::time::Timestamp,
    Result,
};

/// Client error codes
mod error;
use error::ClientResult;

/// gallusd JSON-RPC related methods
mod rpc;

/// Wallet connection handling
mod wallet;
use wallet::Network;

/// Contract handle construction
mod contract;

/// DAO queries and actions
mod dao;
use dao::Vote;

/// NFT membership queries
mod nft;

/// Session state container
mod session;
use session::{Session, SessionPtr, Tab};

/// Session state rendering
mod view;

/// Interactive shell
mod interactive;
use interactive::interactive;

#[cfg(test)]
mod tests;

const CONFIG_FILE: &str = "coop_config.toml";
const CONFIG_FILE_CONTENTS: &str = include_str!("../coop_config.toml");

#[derive(Clone, Debug, Deserialize, StructOpt, StructOptToml)]
#[serde(default)]
#[structopt(name = "coop", about = cli_desc!())]
struct Args {
    #[structopt(short, long)]
    /// Configuration file to use
    config: Option<String>,

    #[structopt(short, long, default_value = "tcp://127.0.0.1:8640")]
    /// gallusd JSON-RPC endpoint
    endpoint: Url,

    #[structopt(short, long, default_value = "testnet")]
    /// Network the connected wallet is expected to be on (localnet/testnet/mainnet)
    network: String,

    #[structopt(long, default_value = "~/.local/share/gallus/coop_history")]
    /// Interactive shell history file
    history_path: String,

    #[structopt(subcommand)]
    /// Sub command to execute
    command: Subcmd,

    #[structopt(short, long)]
    /// Set log file to output into
    log: Option<String>,

    #[structopt(short, parse(from_occurrences))]
    /// Increase verbosity (-vvv supported)
    verbose: u8,
}

#[derive(Clone, Debug, Deserialize, StructOpt)]
enum Subcmd {
    /// Send a ping request to the gallusd RPC endpoint
    Ping,

    /// Connect the wallet and print the authorized account
    Connect,

    /// Connect the wallet and print the DAO overview
    Overview,

    /// List all proposals, or inspect a single one
    Proposals {
        /// Optional proposal ID to inspect
        id: Option<u64>,
    },

    /// Create a proposal to purchase an NFT for the treasury
    Propose {
        /// NFT token ID the treasury should purchase
        token_id: u64,
    },

    /// Vote on an open proposal
    Vote {
        /// Proposal ID
        id: u64,

        /// Vote to cast (yea/nay)
        vote: String,
    },

    /// Execute a passed proposal
    Exec {
        /// Proposal ID
        id: u64,
    },

    /// Start the interactive shell
    Shell,
}

/// CLI-util structure
pub struct Coop {
    /// JSON-RPC client to execute requests to the gallusd daemon
    pub rpc_client: RpcClient,
    /// Network the connected wallet is expected to be on
    pub network: Network,
    /// Account authorized by the wallet connection flow
    pub account: Mutex<Option<String>>,
    /// Session state container
    pub session: SessionPtr,
}

impl Coop {
    pub async fn new(endpoint: Url, network: Network, ex: ExecutorPtr) -> Result<Self> {
        let rpc_client = RpcClient::new(endpoint, ex).await?;
        Ok(Self { rpc_client, network, account: Mutex::new(None), session: Session::new() })
    }
}

/// Connect the wallet, fetch the overview state and render it.
async fn overview_flow(coop: &Coop) -> ClientResult<()> {
    coop.connect().await?;
    coop.refresh_overview().await;
    println!("{}", view::render_summary(&coop.session.snapshot().await));
    Ok(())
}

/// Fetch and render the proposal list, or a single proposal.
async fn proposals_flow(coop: &Coop, id: Option<u64>) -> ClientResult<()> {
    match id {
        Some(id) => {
            let proposal = coop.dao_fetch_proposal(id).await?;
            println!("{}", view::render_proposal(&proposal, Timestamp::current_time()));
        }
        None => {
            coop.session.select_tab(Tab::View).await;
            let proposals = coop.dao_fetch_all_proposals().await?;
            coop.session.set_proposals(proposals).await;
            println!(
                "{}",
                view::render_tab(&coop.session.snapshot().await, Timestamp::current_time())
            );
        }
    }

    Ok(())
}

/// Connect the wallet and submit a proposal creation transaction.
async fn propose_flow(coop: &Coop, token_id: u64) -> ClientResult<()> {
    coop.connect().await?;
    let txid = coop.dao_create_proposal(token_id).await?;
    println!("Proposal submitted. Transaction ID: {txid}");
    println!("Total number of proposals: {}", coop.session.snapshot().await.num_proposals);
    Ok(())
}

/// Connect the wallet and cast a vote on a proposal.
async fn vote_flow(coop: &Coop, id: u64, vote: &str) -> ClientResult<()> {
    let vote = Vote::from_str(vote)?;
    coop.connect().await?;
    let txid = coop.dao_vote(id, vote).await?;
    println!("Vote cast. Transaction ID: {txid}");
    Ok(())
}

/// Connect the wallet and execute a passed proposal.
async fn exec_flow(coop: &Coop, id: u64) -> ClientResult<()> {
    coop.connect().await?;
    let txid = coop.dao_execute(id).await?;
    println!("Proposal executed. Transaction ID: {txid}");
    Ok(())
}

async_daemonize!(realmain);
async fn realmain(args: Args, ex: Arc<smol::Executor<'static>>) -> Result<()> {
    let Ok(network) = Network::from_str(&args.network) else {
        eprintln!("Error: Unknown network \"{}\"", args.network);
        eprintln!("Supported networks: localnet, testnet, mainnet");
        exit(2);
    };

    let coop = Coop::new(args.endpoint, network, ex.clone()).await?;

    match args.command {
        Subcmd::Ping => coop.ping().await?,

        Subcmd::Connect => match coop.connect().await {
            Ok(account) => println!("Connected as {account}"),
            Err(e) => {
                eprintln!("Error: {e}");
                exit(2);
            }
        },

        Subcmd::Overview => {
            if let Err(e) = overview_flow(&coop).await {
                eprintln!("Error: {e}");
                exit(2);
            }
        }

        Subcmd::Proposals { id } => {
            if let Err(e) = proposals_flow(&coop, id).await {
                eprintln!("Error: {e}");
                exit(2);
            }
        }

        Subcmd::Propose { token_id } => {
            if let Err(e) = propose_flow(&coop, token_id).await {
                eprintln!("Error: {e}");
                exit(2);
            }
        }

        Subcmd::Vote { id, vote } => {
            if let Err(e) = vote_flow(&coop, id, &vote).await {
                eprintln!("Error: {e}");
                exit(2);
            }
        }

        Subcmd::Exec { id } => {
            if let Err(e) = exec_flow(&coop, id).await {
                eprintln!("Error: {e}");
                exit(2);
            }
        }

        Subcmd::Shell => interactive(&coop, &args.history_path, &ex).await,
    }

    coop.rpc_client.stop().await;

    Ok(())
}
