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

use std::{env, fs, path::Path, process::exit};

use log::{debug, info, warn};
use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook_async_std::Signals;
use simplelog::{Config, ConfigBuilder, LevelFilter};
use smol::stream::StreamExt;

use crate::Result;

/// Map a verbosity count to a log level and build the logger configuration.
/// The `LOG_TARGETS` environment variable is a comma-separated list of
/// targets to allow, or to ignore when prefixed with `!`.
pub fn log_config(verbosity: u8) -> Result<(LevelFilter, Config)> {
    let log_level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut cfg = ConfigBuilder::new();
    cfg.set_thread_level(LevelFilter::Off);

    if let Ok(targets) = env::var("LOG_TARGETS") {
        for target in targets.split(',').map(|x| x.trim()) {
            if let Some(ignored) = target.strip_prefix('!') {
                cfg.add_filter_ignore(ignored.to_string());
            } else {
                cfg.add_filter_allow(target.to_string());
            }
        }
    }

    Ok((log_level, cfg.build()))
}

/// Create a default config file at the given path if it does not exist yet.
pub fn spawn_config(path: &Path, contents: &[u8]) -> Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        println!("Config file created in '{}'. Please review it and try again.", path.display());
        exit(2);
    }

    Ok(())
}

/// Auxiliary task that listens for process signals and forwards termination
/// requests over the given channel.
pub async fn handle_signals(mut signals: Signals, term_tx: smol::channel::Sender<()>) -> Result<()> {
    debug!(target: "util::cli", "Started signal handler");

    while let Some(signal) = signals.next().await {
        match signal {
            SIGHUP => info!(target: "util::cli", "Caught SIGHUP, ignoring"),

            SIGTERM | SIGINT | SIGQUIT => {
                let _ = term_tx.send(()).await;
                break
            }

            x => warn!(target: "util::cli", "Caught unhandled signal: {}", x),
        }
    }

    Ok(())
}

/// Wrap the given async function into a `main` that parses arguments merged
/// with a TOML config file, initializes logging, spawns executor threads and
/// runs the function until it finishes or a termination signal arrives.
///
/// The calling crate must define `Args` (a `StructOptToml` struct with
/// `config`, `log` and `verbose` fields), `CONFIG_FILE` and
/// `CONFIG_FILE_CONTENTS`.
#[macro_export]
macro_rules! async_daemonize {
    ($realmain:ident) => {
        fn main() -> $crate::Result<()> {
            let args = Args::from_args_with_toml("").unwrap();
            let cfg_path = $crate::util::path::get_config_path(args.config.clone(), CONFIG_FILE)?;
            $crate::util::cli::spawn_config(&cfg_path, CONFIG_FILE_CONTENTS.as_bytes())?;
            let args = Args::from_args_with_toml(&std::fs::read_to_string(&cfg_path)?).unwrap();

            let (lvl, conf) = $crate::util::cli::log_config(args.verbose)?;
            match args.log {
                Some(ref log_path) => {
                    let log_path = $crate::util::path::expand_path(log_path)?;
                    if let Some(parent) = log_path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    let log_file = std::fs::File::create(log_path)?;
                    simplelog::CombinedLogger::init(vec![
                        simplelog::TermLogger::new(
                            lvl,
                            conf.clone(),
                            simplelog::TerminalMode::Mixed,
                            simplelog::ColorChoice::Auto,
                        ),
                        simplelog::WriteLogger::new(lvl, conf, log_file),
                    ])?;
                }
                None => {
                    simplelog::TermLogger::init(
                        lvl,
                        conf,
                        simplelog::TerminalMode::Mixed,
                        simplelog::ColorChoice::Auto,
                    )?;
                }
            }

            // https://docs.rs/smol/latest/smol/struct.Executor.html#examples
            let n_threads = std::thread::available_parallelism().unwrap().get();
            let ex = std::sync::Arc::new(smol::Executor::new());
            let (signal, shutdown) = smol::channel::unbounded::<()>();
            let (_, result) = easy_parallel::Parallel::new()
                .each(0..n_threads, |_| smol::future::block_on(ex.run(shutdown.recv())))
                .finish(|| {
                    smol::future::block_on(async {
                        let signals = signal_hook_async_std::Signals::new([
                            signal_hook::consts::SIGHUP,
                            signal_hook::consts::SIGTERM,
                            signal_hook::consts::SIGINT,
                            signal_hook::consts::SIGQUIT,
                        ])?;
                        let handle = signals.handle();
                        let (term_tx, term_rx) = smol::channel::bounded::<()>(1);
                        let signals_task =
                            ex.spawn($crate::util::cli::handle_signals(signals, term_tx));

                        let realmain_fut = futures::FutureExt::fuse($realmain(args, ex.clone()));
                        futures::pin_mut!(realmain_fut);

                        let result = futures::select! {
                            result = realmain_fut => result,
                            _ = futures::FutureExt::fuse(term_rx.recv()) => {
                                log::info!(
                                    target: "async_daemonize",
                                    "Caught termination signal, cleaning up and exiting",
                                );
                                Ok(())
                            }
                        };

                        handle.close();
                        signals_task.cancel().await;
                        drop(signal);
                        result
                    })
                });

            result
        }
    };
}
