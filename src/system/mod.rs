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

use std::{sync::Arc, time::Duration};

pub mod stoppable_task;
pub mod subscriber;

pub use stoppable_task::{StoppableTask, StoppableTaskPtr};
pub use subscriber::{Subscriber, SubscriberPtr, Subscription};

/// Global executor pointer used for spawning detached tasks.
pub type ExecutorPtr = Arc<smol::Executor<'static>>;

/// Sleep for any number of seconds.
pub async fn sleep(seconds: u64) {
    smol::Timer::after(Duration::from_secs(seconds)).await;
}

/// Sleep for any number of milliseconds.
pub async fn msleep(millis: u64) {
    smol::Timer::after(Duration::from_millis(millis)).await;
}
