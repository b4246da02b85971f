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

//! Client flow tests against an in-process mock gallusd daemon.
use std::sync::Arc;

use async_trait::async_trait;
use smol::lock::Mutex;
use url::Url;

use gallus::{
    rpc::{
        jsonrpc::{ErrorCode, JsonError, JsonRequest, JsonResponse, JsonResult},
        server::{listen_and_serve, RequestHandler},
        util::{json_map, JsonValue},
    },
    system::{msleep, ExecutorPtr},
    Result,
};

use crate::{
    dao::Vote,
    error::{ClientError, ERROR_CODE_CONNECTION_REJECTED, ERROR_CODE_TX_REVERTED},
    wallet::Network,
    Coop,
};

/// A deadline far enough in the future that tests never cross it.
const FUTURE_DEADLINE: f64 = 4102444800.0;

#[derive(Clone)]
struct MockProposal {
    token_id: f64,
    deadline: f64,
    yea_votes: f64,
    nay_votes: f64,
    executed: bool,
}

impl MockProposal {
    fn to_json(&self) -> JsonValue {
        json_map([
            ("token_id", JsonValue::Number(self.token_id)),
            ("deadline", JsonValue::Number(self.deadline)),
            ("yea_votes", JsonValue::Number(self.yea_votes)),
            ("nay_votes", JsonValue::Number(self.nay_votes)),
            ("executed", JsonValue::Boolean(self.executed)),
        ])
    }
}

/// Mock gallusd daemon holding chain state behind a [`RequestHandler`].
struct MockDaemon {
    chain_id: f64,
    reject_connect: bool,
    revert_invokes: bool,
    account: String,
    treasury_balance: u64,
    nft_balance: f64,
    proposals: Mutex<Vec<MockProposal>>,
    tx_counter: Mutex<u64>,
    /// Methods hit, in call order
    hits: Mutex<Vec<String>>,
}

impl MockDaemon {
    fn new(chain_id: f64) -> Self {
        Self {
            chain_id,
            reject_connect: false,
            revert_invokes: false,
            account: "GALICEWALLETACCOUNT".to_string(),
            treasury_balance: 110_000_000,
            nft_balance: 1.0,
            proposals: Mutex::new(vec![]),
            tx_counter: Mutex::new(0),
            hits: Mutex::new(vec![]),
        }
    }

    async fn contract_read(&self, id: u16, params: &[JsonValue]) -> JsonResult {
        let method = params[1].get::<String>().unwrap().clone();
        let proposals = self.proposals.lock().await;

        match method.as_str() {
            "numProposals" => {
                self.hits.lock().await.push("contract.read numProposals".to_string());
                JsonResponse::new(JsonValue::Number(proposals.len() as f64), id).into()
            }

            "proposals" => {
                let prop_id = *params[2].get::<f64>().unwrap() as usize;
                self.hits.lock().await.push(format!("contract.read proposals {prop_id}"));
                match proposals.get(prop_id) {
                    Some(p) => JsonResponse::new(p.to_json(), id).into(),
                    None => JsonError::new(
                        ErrorCode::ServerError(ERROR_CODE_TX_REVERTED),
                        Some("unknown proposal".to_string()),
                        id,
                    )
                    .into(),
                }
            }

            "balanceOf" => {
                self.hits.lock().await.push("contract.read balanceOf".to_string());
                JsonResponse::new(JsonValue::Number(self.nft_balance), id).into()
            }

            _ => JsonError::new(ErrorCode::MethodNotFound, None, id).into(),
        }
    }

    async fn wallet_invoke(&self, id: u16, params: &[JsonValue]) -> JsonResult {
        let method = params[1].get::<String>().unwrap().clone();
        self.hits.lock().await.push(format!("wallet.invoke {method}"));

        if self.revert_invokes {
            return JsonError::new(
                ErrorCode::ServerError(ERROR_CODE_TX_REVERTED),
                Some("execution reverted".to_string()),
                id,
            )
            .into()
        }

        let mut proposals = self.proposals.lock().await;

        match method.as_str() {
            "createProposal" => {
                let token_id = *params[2].get::<f64>().unwrap();
                proposals.push(MockProposal {
                    token_id,
                    deadline: FUTURE_DEADLINE,
                    yea_votes: 0.0,
                    nay_votes: 0.0,
                    executed: false,
                });
            }

            "voteOnProposal" => {
                let prop_id = *params[2].get::<f64>().unwrap() as usize;
                let vote = *params[3].get::<f64>().unwrap() as u64;
                match vote {
                    0 => proposals[prop_id].yea_votes += 1.0,
                    _ => proposals[prop_id].nay_votes += 1.0,
                }
            }

            "executeProposal" => {
                let prop_id = *params[2].get::<f64>().unwrap() as usize;
                proposals[prop_id].executed = true;
            }

            _ => return JsonError::new(ErrorCode::MethodNotFound, None, id).into(),
        }

        let mut counter = self.tx_counter.lock().await;
        *counter += 1;
        JsonResponse::new(JsonValue::String(format!("TX{counter}")), id).into()
    }
}

#[async_trait]
impl RequestHandler for MockDaemon {
    async fn handle_request(&self, req: JsonRequest) -> JsonResult {
        let params = req.params.get::<Vec<JsonValue>>().unwrap().clone();

        match req.method.as_str() {
            "ping" => {
                JsonResponse::new(JsonValue::String("pong".to_string()), req.id).into()
            }

            "wallet.chain_id" => {
                self.hits.lock().await.push("wallet.chain_id".to_string());
                JsonResponse::new(JsonValue::Number(self.chain_id), req.id).into()
            }

            "wallet.connect" => {
                self.hits.lock().await.push("wallet.connect".to_string());
                if self.reject_connect {
                    return JsonError::new(
                        ErrorCode::ServerError(ERROR_CODE_CONNECTION_REJECTED),
                        Some("user declined".to_string()),
                        req.id,
                    )
                    .into()
                }
                JsonResponse::new(JsonValue::String(self.account.clone()), req.id).into()
            }

            "chain.get_balance" => {
                self.hits.lock().await.push("chain.get_balance".to_string());
                JsonResponse::new(JsonValue::String(self.treasury_balance.to_string()), req.id)
                    .into()
            }

            "contract.read" => self.contract_read(req.id, &params).await,

            "wallet.invoke" => self.wallet_invoke(req.id, &params).await,

            "tx.confirmations" => {
                self.hits.lock().await.push("tx.confirmations".to_string());
                JsonResponse::new(JsonValue::Number(1.0), req.id).into()
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

async fn start_mock(ex: &ExecutorPtr, daemon: Arc<MockDaemon>) -> Result<Url> {
    let endpoint = find_free_endpoint()?;
    ex.spawn(listen_and_serve(endpoint.clone(), daemon, ex.clone())).detach();
    // Let the server bind before dialing it
    msleep(500).await;
    Ok(endpoint)
}

#[test]
fn wrong_network_blocks_contract_calls() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let daemon = Arc::new(MockDaemon::new(1.0));
        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        let Err(e) = coop.provider().await else {
            panic!("Provider acquired on wrong network")
        };
        assert_eq!(e, ClientError::WrongNetwork { expected: 4, actual: 1 });

        let Err(e) = coop.signer().await else { panic!("Signer acquired on wrong network") };
        assert_eq!(e, ClientError::WrongNetwork { expected: 4, actual: 1 });

        // Every query and action fails the same way before reaching a contract
        assert!(coop.dao_num_proposals().await.is_err());
        assert!(coop.dao_fetch_all_proposals().await.is_err());
        assert!(coop.dao_create_proposal(7).await.is_err());

        let hits = daemon.hits.lock().await;
        assert!(hits.iter().all(|h| !h.starts_with("contract.read")));
        assert!(hits.iter().all(|h| !h.starts_with("wallet.invoke")));

        coop.rpc_client.stop().await;
        Ok(())
    }))
}

#[test]
fn sequential_fetch_yields_ordered_snapshots() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let daemon = Arc::new(MockDaemon::new(4.0));
        daemon.proposals.lock().await.extend([
            MockProposal {
                token_id: 7.0,
                deadline: FUTURE_DEADLINE,
                yea_votes: 2.0,
                nay_votes: 0.0,
                executed: false,
            },
            MockProposal {
                token_id: 8.0,
                deadline: 1000.0,
                yea_votes: 1.0,
                nay_votes: 3.0,
                executed: true,
            },
        ]);

        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        let proposals = coop.dao_fetch_all_proposals().await.unwrap();
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].id, 0);
        assert_eq!(proposals[0].token_id, 7);
        assert_eq!(proposals[1].id, 1);
        assert_eq!(proposals[1].token_id, 8);
        assert!(proposals[1].executed);

        // Exactly one count lookup and one lookup per ID, in order
        let hits = daemon.hits.lock().await;
        let reads: Vec<String> =
            hits.iter().filter(|h| h.starts_with("contract.read")).cloned().collect();
        assert_eq!(
            reads,
            vec![
                "contract.read numProposals",
                "contract.read proposals 0",
                "contract.read proposals 1"
            ]
        );

        coop.rpc_client.stop().await;
        Ok(())
    }))
}

#[test]
fn repeated_reads_are_idempotent() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let daemon = Arc::new(MockDaemon::new(4.0));
        daemon.proposals.lock().await.push(MockProposal {
            token_id: 7.0,
            deadline: FUTURE_DEADLINE,
            yea_votes: 2.0,
            nay_votes: 1.0,
            executed: false,
        });

        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        let first = coop.dao_fetch_all_proposals().await.unwrap();
        let second = coop.dao_fetch_all_proposals().await.unwrap();
        assert_eq!(first, second);

        let balance = coop.dao_treasury_balance().await.unwrap();
        assert_eq!(balance, coop.dao_treasury_balance().await.unwrap());

        coop.rpc_client.stop().await;
        Ok(())
    }))
}

#[test]
fn create_refreshes_count_and_clears_loading() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let daemon = Arc::new(MockDaemon::new(4.0));
        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        let account = coop.connect().await.unwrap();
        assert_eq!(account, "GALICEWALLETACCOUNT");

        let txid = coop.dao_create_proposal(7).await.unwrap();
        assert_eq!(txid, "TX1");

        let snapshot = coop.session.snapshot().await;
        assert!(!snapshot.loading);
        assert_eq!(snapshot.num_proposals, 1);

        let hits = daemon.hits.lock().await;
        assert!(hits.iter().any(|h| h == "wallet.invoke createProposal"));
        assert!(hits.iter().any(|h| h == "tx.confirmations"));

        coop.rpc_client.stop().await;
        Ok(())
    }))
}

#[test]
fn vote_refreshes_proposal_list() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let daemon = Arc::new(MockDaemon::new(4.0));
        daemon.proposals.lock().await.push(MockProposal {
            token_id: 7.0,
            deadline: FUTURE_DEADLINE,
            yea_votes: 0.0,
            nay_votes: 0.0,
            executed: false,
        });

        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        coop.connect().await.unwrap();
        coop.dao_vote(0, Vote::Yea).await.unwrap();

        let snapshot = coop.session.snapshot().await;
        assert!(!snapshot.loading);
        assert_eq!(snapshot.proposals.len(), 1);
        assert_eq!(snapshot.proposals[0].yea_votes, 1);
        assert_eq!(snapshot.proposals[0].nay_votes, 0);

        coop.rpc_client.stop().await;
        Ok(())
    }))
}

#[test]
fn execute_settles_proposal() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let daemon = Arc::new(MockDaemon::new(4.0));
        daemon.proposals.lock().await.push(MockProposal {
            token_id: 7.0,
            deadline: 1000.0,
            yea_votes: 3.0,
            nay_votes: 1.0,
            executed: false,
        });

        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        coop.connect().await.unwrap();
        coop.dao_execute(0).await.unwrap();

        let snapshot = coop.session.snapshot().await;
        assert!(snapshot.proposals[0].executed);

        coop.rpc_client.stop().await;
        Ok(())
    }))
}

#[test]
fn rejected_connection_is_normalized() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let mut daemon = MockDaemon::new(4.0);
        daemon.reject_connect = true;
        let daemon = Arc::new(daemon);

        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        assert_eq!(coop.connect().await, Err(ClientError::ConnectionRejected));

        // Without a connected account, write actions fail locally
        assert_eq!(coop.dao_create_proposal(7).await, Err(ClientError::NotConnected));

        coop.rpc_client.stop().await;
        Ok(())
    }))
}

#[test]
fn reverted_transaction_is_normalized() -> Result<()> {
    let ex: ExecutorPtr = Arc::new(smol::Executor::new());
    smol::block_on(ex.clone().run(async {
        let mut daemon = MockDaemon::new(4.0);
        daemon.revert_invokes = true;
        let daemon = Arc::new(daemon);

        let endpoint = start_mock(&ex, daemon.clone()).await?;
        let coop = Coop::new(endpoint, Network::Testnet, ex.clone()).await?;

        coop.connect().await.unwrap();
        assert_eq!(
            coop.dao_create_proposal(7).await,
            Err(ClientError::TransactionReverted("execution reverted".to_string()))
        );

        // The failed action left no loading state behind
        assert!(!coop.session.snapshot().await.loading);

        coop.rpc_client.stop().await;
        Ok(())
    }))
}
