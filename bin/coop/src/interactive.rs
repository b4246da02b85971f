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

use std::{io::ErrorKind, str::FromStr};

use futures::{select, FutureExt};
use libc::{fcntl, F_GETFL, F_SETFL, O_NONBLOCK};
use linenoise_rs::{
    linenoise_history_add, linenoise_history_load, linenoise_history_save,
    linenoise_set_completion_callback, linenoise_set_hints_callback, LinenoiseState,
};
use smol::channel::{unbounded, Receiver, Sender};

use gallus::{
    cli_desc,
    system::{msleep, ExecutorPtr, StoppableTask, StoppableTaskPtr},
    util::{path::expand_path, time::Timestamp},
    Error,
};

use crate::{
    dao::Vote,
    session::{SessionEvent, Tab},
    view, Coop,
};

/// Auxiliary function to print the help message.
fn help() {
    println!("{}", cli_desc!());
    println!("Commands:");
    println!("\thelp: Prints the help message");
    println!("\tping: Send a ping request to the gallusd RPC endpoint");
    println!("\tconnect: Connect the wallet and fetch the DAO overview");
    println!("\toverview: Print the DAO overview");
    println!("\ttab: Switch to the create or view tab");
    println!("\tcreate: Create a proposal to purchase an NFT");
    println!("\tproposals: Fetch and list all proposals");
    println!("\tvote: Vote on an open proposal");
    println!("\texec: Execute a passed proposal");
    println!("\tsnooze: Disables the background session messages printing");
    println!("\tunsnooze: Enables the background session messages printing");
}

/// Auxiliary function to define the interactive shell completions.
fn completion(buf: &str, lc: &mut Vec<String>) {
    // First we define the specific commands prefixes
    if buf.starts_with("h") {
        lc.push("help".to_string());
        return
    }

    if buf.starts_with("pi") {
        lc.push("ping".to_string());
        return
    }

    if buf.starts_with("pr") {
        lc.push("proposals".to_string());
        return
    }

    if buf.starts_with("co") {
        lc.push("connect".to_string());
        return
    }

    if buf.starts_with("cr") {
        lc.push("create".to_string());
        return
    }

    if buf.starts_with("o") {
        lc.push("overview".to_string());
        return
    }

    if buf.starts_with("t") {
        lc.push("tab".to_string());
        return
    }

    if buf.starts_with("v") {
        lc.push("vote".to_string());
        return
    }

    if buf.starts_with("e") {
        lc.push("exec".to_string());
        return
    }

    if buf.starts_with("sn") {
        lc.push("snooze".to_string());
        return
    }

    if buf.starts_with("u") {
        lc.push("unsnooze".to_string());
        return
    }

    // Now the catch alls
    if buf.starts_with("p") {
        lc.push("ping".to_string());
        lc.push("proposals".to_string());
        return
    }

    if buf.starts_with("c") {
        lc.push("connect".to_string());
        lc.push("create".to_string());
        return
    }

    if buf.starts_with("s") {
        lc.push("snooze".to_string());
    }
}

/// Auxiliary function to define the interactive shell hints.
fn hints(buf: &str) -> Option<(String, i32, bool)> {
    match buf {
        "tab " => Some(("create|view".to_string(), 35, false)), // 35 = magenta
        "create " => Some(("{token_id}".to_string(), 35, false)),
        "vote " => Some(("{id} yea|nay".to_string(), 35, false)),
        "exec " => Some(("{id}".to_string(), 35, false)),
        _ => None,
    }
}

/// Auxiliary function to start the provided client as an interactive shell.
/// Only sane/linenoise terminals are supported.
pub async fn interactive(coop: &Coop, history_path: &str, ex: &ExecutorPtr) {
    // Expand the history file path
    let history_path = match expand_path(history_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error while expanding history file path: {e}");
            return
        }
    };
    let history_path = history_path.into_os_string();
    let history_file = history_path.to_str().unwrap();

    // Set the completion callback. This will be called every time the
    // user uses the <tab> key.
    linenoise_set_completion_callback(completion);

    // Set the shell hints
    linenoise_set_hints_callback(hints);

    // Load history from file. The history file is just a plain text file
    // where entries are separated by newlines.
    let _ = linenoise_history_load(history_file);

    // Create an unbounded smol channel, so we can have a printing
    // queue the background task can submit messages to the shell.
    let (shell_sender, shell_receiver) = unbounded();

    // Detached task re-rendering the affected view whenever the session
    // state changes underneath us.
    let render_task = StoppableTask::new();
    start_render_task(coop, &render_task, &shell_sender, ex).await;

    let mut snooze_active = false;

    // Start the interactive shell
    loop {
        // Wait for next line to process
        let line = listen_for_line(&snooze_active, &shell_receiver).await;

        // Grab input or end if Ctrl-D or Ctrl-C was pressed
        let Some(line) = line else { break };

        // Check if line is empty
        if line.is_empty() {
            continue
        }

        // Add line to history
        linenoise_history_add(&line);

        // Parse command parts
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue
        }

        // Handle command
        match parts[0] {
            "help" => help(),
            "ping" => handle_ping(coop).await,
            "connect" => handle_connect(coop).await,
            "overview" => handle_overview(coop).await,
            "tab" => handle_tab(coop, &parts).await,
            "create" => handle_create(coop, &parts).await,
            "proposals" => handle_proposals(coop).await,
            "vote" => handle_vote(coop, &parts).await,
            "exec" => handle_exec(coop, &parts).await,
            "snooze" => snooze_active = true,
            "unsnooze" => snooze_active = false,
            _ => println!("Unrecognized command: {}", parts[0]),
        }
    }

    // Stop the background render task
    render_task.stop().await;

    // Write history file
    let _ = linenoise_history_save(history_file);
}

/// Auxiliary function to start the detached task that drains session
/// change notifications and pushes re-rendered views to the shell's
/// print queue.
async fn start_render_task(
    coop: &Coop,
    render_task: &StoppableTaskPtr,
    shell_sender: &Sender<Vec<String>>,
    ex: &ExecutorPtr,
) {
    let subscription = coop.session.subscribe().await;
    let session = coop.session.clone();
    let shell_sender = shell_sender.clone();

    render_task.clone().start(
        async move {
            loop {
                let event = subscription.receive().await;
                let snapshot = session.snapshot().await;
                let now = Timestamp::current_time();

                let rendered = match event {
                    SessionEvent::TabChanged |
                    SessionEvent::LoadingChanged |
                    SessionEvent::ProposalsUpdated => view::render_tab(&snapshot, now),
                    _ => continue,
                };

                if rendered.is_empty() {
                    continue
                }

                let lines: Vec<String> = rendered.lines().map(String::from).collect();
                if shell_sender.send(lines).await.is_err() {
                    break
                }
            }

            Ok(())
        },
        |res| async move {
            match res {
                Ok(()) | Err(Error::DetachedTaskStopped) => { /* Do nothing */ }
                Err(e) => println!("Error in background render task: {e}"),
            }
        },
        Error::DetachedTaskStopped,
        ex.clone(),
    );
}

/// Auxiliary function to listen for linenoise input line and handle
/// background task messages.
async fn listen_for_line(
    snooze_active: &bool,
    shell_receiver: &Receiver<Vec<String>>,
) -> Option<String> {
    // Generate the linenoise state structure
    let mut state = match LinenoiseState::edit_start(-1, -1, "coop> ") {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error while generating linenoise state: {e}");
            return None
        }
    };

    // Set stdin to non-blocking mode
    let fd = state.get_fd();
    unsafe {
        let flags = fcntl(fd, F_GETFL, 0);
        fcntl(fd, F_SETFL, flags | O_NONBLOCK);
    }

    // Read until we get a line to process
    let mut line = None;
    loop {
        // Future that polls stdin for input
        let input_future = async {
            loop {
                match state.edit_feed() {
                    Ok(Some(l)) => {
                        line = Some(l);
                        break
                    }
                    Ok(None) => break,
                    Err(e) if e.kind() == ErrorKind::Interrupted => break,
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {
                        // No data available, yield and retry
                        msleep(10).await;
                        continue
                    }
                    Err(e) => {
                        eprintln!("Error while reading linenoise feed: {e}");
                        break
                    }
                }
            }
        };

        // Future that polls the channel
        let channel_future = async {
            loop {
                if !shell_receiver.is_empty() {
                    break
                }
                msleep(1000).await;
            }
        };

        // Manage the futures
        select! {
            // When input is ready we break out the loop
            _ = input_future.fuse() => break,
            // Manage filled channel
            _ = channel_future.fuse() => {
                while !shell_receiver.is_empty() {
                    match shell_receiver.recv().await {
                        Ok(msg) => {
                            // We only print if snooze is inactive,
                            // but have to consume the message regardless,
                            // so the queue gets empty.
                            if *snooze_active {
                                continue
                            }
                            // Hide prompt, print output, show prompt again
                            let _ = state.hide();
                            for line in msg {
                                println!("{line}\r");
                            }
                            let _ = state.show();
                        }
                        Err(e) => {
                            eprintln!("Error while reading shell receiver channel: {e}");
                            break
                        }
                    }
                }
            }
        }
    }

    // Restore blocking mode
    unsafe {
        let flags = fcntl(fd, F_GETFL, 0);
        fcntl(fd, F_SETFL, flags & !O_NONBLOCK);
    }

    let _ = state.edit_stop();
    line
}

/// Auxiliary function to define the ping command handling.
async fn handle_ping(coop: &Coop) {
    if let Err(e) = coop.ping().await {
        println!("Error while executing ping command: {e}")
    }
}

/// Auxiliary function to define the connect command handling.
async fn handle_connect(coop: &Coop) {
    match coop.connect().await {
        Ok(account) => {
            println!("Connected as {account}");
            coop.refresh_overview().await;
            println!("{}", view::render_summary(&coop.session.snapshot().await));
        }
        Err(e) => println!("Error while connecting wallet: {e}"),
    }
}

/// Auxiliary function to define the overview command handling.
async fn handle_overview(coop: &Coop) {
    if coop.session.snapshot().await.wallet_connected {
        coop.refresh_overview().await;
    }
    println!("{}", view::render_summary(&coop.session.snapshot().await));
}

/// Auxiliary function to define the tab command handling.
async fn handle_tab(coop: &Coop, parts: &[&str]) {
    if parts.len() != 2 {
        println!("Malformed `tab` command");
        println!("Usage: tab create|view");
        return
    }

    match parts[1] {
        "create" => coop.session.select_tab(Tab::Create).await,
        "view" => {
            coop.session.select_tab(Tab::View).await;
            // Re-fetch the proposal list when switching to the view tab
            match coop.dao_fetch_all_proposals().await {
                Ok(proposals) => coop.session.set_proposals(proposals).await,
                Err(e) => println!("Error while fetching proposals: {e}"),
            }
        }
        x => println!("Unknown tab: {x}"),
    }
}

/// Auxiliary function to define the create command handling.
async fn handle_create(coop: &Coop, parts: &[&str]) {
    if parts.len() != 2 {
        println!("Malformed `create` command");
        println!("Usage: create {{token_id}}");
        return
    }

    let token_id = match u64::from_str(parts[1]) {
        Ok(x) => x,
        Err(e) => {
            println!("Invalid token ID: {e}");
            return
        }
    };

    match coop.dao_create_proposal(token_id).await {
        Ok(txid) => println!("Proposal submitted. Transaction ID: {txid}"),
        Err(e) => println!("Error while creating proposal: {e}"),
    }
}

/// Auxiliary function to define the proposals command handling.
async fn handle_proposals(coop: &Coop) {
    coop.session.select_tab(Tab::View).await;
    match coop.dao_fetch_all_proposals().await {
        Ok(proposals) => coop.session.set_proposals(proposals).await,
        Err(e) => println!("Error while fetching proposals: {e}"),
    }
}

/// Auxiliary function to define the vote command handling.
async fn handle_vote(coop: &Coop, parts: &[&str]) {
    if parts.len() != 3 {
        println!("Malformed `vote` command");
        println!("Usage: vote {{id}} yea|nay");
        return
    }

    let id = match u64::from_str(parts[1]) {
        Ok(x) => x,
        Err(e) => {
            println!("Invalid proposal ID: {e}");
            return
        }
    };

    let vote = match Vote::from_str(parts[2]) {
        Ok(v) => v,
        Err(e) => {
            println!("{e}");
            return
        }
    };

    match coop.dao_vote(id, vote).await {
        Ok(txid) => println!("Vote cast. Transaction ID: {txid}"),
        Err(e) => println!("Error while voting on proposal: {e}"),
    }
}

/// Auxiliary function to define the exec command handling.
async fn handle_exec(coop: &Coop, parts: &[&str]) {
    if parts.len() != 2 {
        println!("Malformed `exec` command");
        println!("Usage: exec {{id}}");
        return
    }

    let id = match u64::from_str(parts[1]) {
        Ok(x) => x,
        Err(e) => {
            println!("Invalid proposal ID: {e}");
            return
        }
    };

    match coop.dao_execute(id).await {
        Ok(txid) => println!("Proposal executed. Transaction ID: {txid}"),
        Err(e) => println!("Error while executing proposal: {e}"),
    }
}
