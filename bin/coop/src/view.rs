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

//! Pure functions from session snapshots to rendered text. Proposal row
//! states are recomputed against the current time on every render.
use prettytable::{format, row, Table};

use gallus::util::time::Timestamp;

use crate::{
    dao::{Proposal, ProposalStatus},
    session::{SessionSnapshot, Tab},
    Coop,
};

/// Actions a proposal row offers, derived from its status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalAction {
    VoteYea,
    VoteNay,
    Execute,
}

/// The actions offered for a proposal at the given time. Voting is
/// offered while the deadline is in the future, execution once it has
/// passed, and nothing once the proposal is executed.
pub fn proposal_actions(proposal: &Proposal, now: Timestamp) -> Vec<ProposalAction> {
    match proposal.status(now) {
        ProposalStatus::VotingOpen => vec![ProposalAction::VoteYea, ProposalAction::VoteNay],
        ProposalStatus::Executable => vec![ProposalAction::Execute],
        ProposalStatus::Settled => vec![],
    }
}

/// Winning side annotation for an executable proposal.
fn leading_side(proposal: &Proposal) -> &'static str {
    if proposal.yea_votes > proposal.nay_votes {
        "YEA"
    } else {
        "NAY"
    }
}

fn actions_column(proposal: &Proposal, now: Timestamp) -> String {
    let actions = proposal_actions(proposal, now);

    if actions.is_empty() {
        return "-".to_string()
    }

    if actions.contains(&ProposalAction::Execute) {
        return format!("exec ({})", leading_side(proposal))
    }

    "vote yea|nay".to_string()
}

/// Render the session overview block.
pub fn render_summary(snapshot: &SessionSnapshot) -> String {
    let account = match &snapshot.account {
        Some(account) => account.as_str(),
        None => "not connected",
    };

    format!(
        concat!(
            "Gallus DAO\n",
            "==========\n",
            "Account: {}\n",
            "Membership NFT balance: {}\n",
            "Treasury balance: {} GLS\n",
            "Total number of proposals: {}",
        ),
        account,
        snapshot.nft_balance,
        Coop::display_balance(snapshot.treasury_balance),
        snapshot.num_proposals,
    )
}

/// Render the body of the currently selected tab.
pub fn render_tab(snapshot: &SessionSnapshot, now: Timestamp) -> String {
    match snapshot.selected_tab {
        Some(Tab::Create) => render_create_tab(snapshot),
        Some(Tab::View) => render_view_tab(snapshot, now),
        None => String::new(),
    }
}

fn render_create_tab(snapshot: &SessionSnapshot) -> String {
    if snapshot.loading {
        return "Loading... Waiting for transaction confirmation...".to_string()
    }

    if snapshot.nft_balance == 0 {
        return concat!(
            "You do not own any Gallus NFTs.\n",
            "You cannot create or vote on proposals.",
        )
        .to_string()
    }

    "Use `create <token_id>` to propose an NFT purchase for the treasury.".to_string()
}

fn render_view_tab(snapshot: &SessionSnapshot, now: Timestamp) -> String {
    if snapshot.loading {
        return "Loading... Waiting for transaction confirmation...".to_string()
    }

    if snapshot.proposals.is_empty() {
        return "No proposals have been created".to_string()
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row!["ID", "NFT", "Deadline", "Yea", "Nay", "Status", "Actions"]);
    for proposal in &snapshot.proposals {
        table.add_row(row![
            proposal.id,
            proposal.token_id,
            proposal.deadline,
            proposal.yea_votes,
            proposal.nay_votes,
            proposal.status(now),
            actions_column(proposal, now),
        ]);
    }

    table.to_string()
}

/// Render a single proposal card with its offered actions.
pub fn render_proposal(proposal: &Proposal, now: Timestamp) -> String {
    let actions = match proposal.status(now) {
        ProposalStatus::VotingOpen => {
            format!("vote {} yea | vote {} nay", proposal.id, proposal.id)
        }
        ProposalStatus::Executable => {
            format!("exec {} ({})", proposal.id, leading_side(proposal))
        }
        ProposalStatus::Settled => "Proposal executed".to_string(),
    };

    format!("{}\nStatus: {}\nActions: {}", proposal, proposal.status(now), actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(deadline: i64, executed: bool) -> Proposal {
        Proposal {
            id: 0,
            token_id: 7,
            deadline: Timestamp(deadline),
            yea_votes: 2,
            nay_votes: 1,
            executed,
        }
    }

    #[test]
    fn actions_follow_status() {
        let now = Timestamp(1_000_000);

        // Voting open offers votes, never execution
        let open = proposal(1_000_100, false);
        let actions = proposal_actions(&open, now);
        assert_eq!(actions, vec![ProposalAction::VoteYea, ProposalAction::VoteNay]);
        assert!(!actions.contains(&ProposalAction::Execute));

        // Deadline passed offers only execution
        let passed = proposal(999_900, false);
        assert_eq!(proposal_actions(&passed, now), vec![ProposalAction::Execute]);

        // Executed offers nothing
        let settled = proposal(999_900, true);
        assert!(proposal_actions(&settled, now).is_empty());
    }

    #[test]
    fn executable_shows_leading_side() {
        let now = Timestamp(1_000_000);
        let mut passed = proposal(999_900, false);

        assert_eq!(actions_column(&passed, now), "exec (YEA)");

        passed.yea_votes = 0;
        assert_eq!(actions_column(&passed, now), "exec (NAY)");
    }

    #[test]
    fn view_tab_states() {
        let now = Timestamp(1_000_000);
        let mut snapshot = SessionSnapshot { selected_tab: Some(Tab::View), ..Default::default() };

        assert_eq!(render_tab(&snapshot, now), "No proposals have been created");

        snapshot.loading = true;
        assert!(render_tab(&snapshot, now).starts_with("Loading..."));

        snapshot.loading = false;
        snapshot.proposals = vec![proposal(1_000_100, false)];
        let rendered = render_tab(&snapshot, now);
        assert!(rendered.contains("Voting open"));
        assert!(rendered.contains("vote yea|nay"));
    }

    #[test]
    fn create_tab_states() {
        let now = Timestamp(1_000_000);
        let mut snapshot =
            SessionSnapshot { selected_tab: Some(Tab::Create), ..Default::default() };

        // Without a membership NFT, proposal creation is not offered
        assert!(render_tab(&snapshot, now).contains("You do not own any Gallus NFTs"));

        snapshot.nft_balance = 1;
        assert!(render_tab(&snapshot, now).contains("create <token_id>"));

        snapshot.loading = true;
        assert!(render_tab(&snapshot, now).starts_with("Loading..."));
    }

    #[test]
    fn summary_renders_balances() {
        let snapshot = SessionSnapshot {
            account: Some("GACCOUNT".to_string()),
            nft_balance: 2,
            treasury_balance: 110_000_000,
            num_proposals: 3,
            ..Default::default()
        };

        let rendered = render_summary(&snapshot);
        assert!(rendered.contains("Account: GACCOUNT"));
        assert!(rendered.contains("Membership NFT balance: 2"));
        assert!(rendered.contains("Treasury balance: 1.1 GLS"));
        assert!(rendered.contains("Total number of proposals: 3"));
    }
}
