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

use smol::lock::Mutex;

use gallus::system::{Subscriber, SubscriberPtr, Subscription};

use crate::dao::Proposal;

pub type SessionPtr = Arc<Session>;

/// The two views the client renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    /// Proposal creation form
    Create,
    /// Proposal listing
    View,
}

/// Notification broadcast on every session mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    WalletConnected,
    TabChanged,
    LoadingChanged,
    TreasuryBalanceUpdated,
    NftBalanceUpdated,
    NumProposalsUpdated,
    ProposalsUpdated,
}

/// Plain copy of the session state, handed out for rendering.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    /// Whether a wallet account has been authorized
    pub wallet_connected: bool,
    /// The authorized account address
    pub account: Option<String>,
    /// Currently selected tab
    pub selected_tab: Option<Tab>,
    /// Whether a transaction confirmation is pending
    pub loading: bool,
    /// Cached native balance of the DAO contract, in atomic units
    pub treasury_balance: u64,
    /// Cached membership NFT balance of the connected account
    pub nft_balance: u64,
    /// Cached number of proposals in the DAO
    pub num_proposals: u64,
    /// Cached proposal snapshots
    pub proposals: Vec<Proposal>,
}

/// Session state container. Everything here is ephemeral and re-derived
/// from the network. Mutations happen from a single execution context
/// after an awaited call completes, and every mutation broadcasts a
/// [`SessionEvent`] so views can re-render.
pub struct Session {
    inner: Mutex<SessionSnapshot>,
    events: SubscriberPtr<SessionEvent>,
}

impl Session {
    pub fn new() -> SessionPtr {
        Arc::new(Self { inner: Mutex::new(SessionSnapshot::default()), events: Subscriber::new() })
    }

    /// Subscribe to session change notifications.
    pub async fn subscribe(&self) -> Subscription<SessionEvent> {
        self.events.clone().subscribe().await
    }

    /// Take a plain copy of the current state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn set_wallet_connected(&self, account: String) {
        {
            let mut inner = self.inner.lock().await;
            inner.wallet_connected = true;
            inner.account = Some(account);
        }
        self.events.notify(SessionEvent::WalletConnected).await;
    }

    pub async fn select_tab(&self, tab: Tab) {
        self.inner.lock().await.selected_tab = Some(tab);
        self.events.notify(SessionEvent::TabChanged).await;
    }

    pub async fn set_loading(&self, loading: bool) {
        self.inner.lock().await.loading = loading;
        self.events.notify(SessionEvent::LoadingChanged).await;
    }

    pub async fn set_treasury_balance(&self, balance: u64) {
        self.inner.lock().await.treasury_balance = balance;
        self.events.notify(SessionEvent::TreasuryBalanceUpdated).await;
    }

    pub async fn set_nft_balance(&self, balance: u64) {
        self.inner.lock().await.nft_balance = balance;
        self.events.notify(SessionEvent::NftBalanceUpdated).await;
    }

    pub async fn set_num_proposals(&self, num: u64) {
        self.inner.lock().await.num_proposals = num;
        self.events.notify(SessionEvent::NumProposalsUpdated).await;
    }

    pub async fn set_proposals(&self, proposals: Vec<Proposal>) {
        self.inner.lock().await.proposals = proposals;
        self.events.notify(SessionEvent::ProposalsUpdated).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_notify_subscribers() {
        smol::block_on(async {
            let session = Session::new();
            let sub = session.subscribe().await;

            session.set_wallet_connected("GACCOUNT".to_string()).await;
            assert_eq!(sub.receive().await, SessionEvent::WalletConnected);

            session.select_tab(Tab::View).await;
            assert_eq!(sub.receive().await, SessionEvent::TabChanged);

            session.set_loading(true).await;
            assert_eq!(sub.receive().await, SessionEvent::LoadingChanged);

            session.set_num_proposals(2).await;
            assert_eq!(sub.receive().await, SessionEvent::NumProposalsUpdated);

            let snapshot = session.snapshot().await;
            assert!(snapshot.wallet_connected);
            assert_eq!(snapshot.account.as_deref(), Some("GACCOUNT"));
            assert_eq!(snapshot.selected_tab, Some(Tab::View));
            assert!(snapshot.loading);
            assert_eq!(snapshot.num_proposals, 2);
        });
    }
}
