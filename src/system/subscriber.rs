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

use std::{collections::HashMap, sync::Arc};

use log::warn;
use rand::Rng;
use smol::lock::Mutex;

pub type SubscriberPtr<T> = Arc<Subscriber<T>>;

pub type SubscriptionId = u64;

/// A subscription to a [`Subscriber`]. Messages are received with
/// [`Subscription::receive`] and the subscription is released with
/// [`Subscription::unsubscribe`].
pub struct Subscription<T> {
    id: SubscriptionId,
    recv_queue: smol::channel::Receiver<T>,
    parent: Arc<Subscriber<T>>,
}

impl<T: Clone> Subscription<T> {
    pub fn get_id(&self) -> SubscriptionId {
        self.id
    }

    pub async fn receive(&self) -> T {
        match self.recv_queue.recv().await {
            Ok(message) => message,
            Err(e) => {
                panic!("Subscription::receive() recv_queue failed! {}", e);
            }
        }
    }

    // Must be called manually since async Drop is not possible in Rust
    pub async fn unsubscribe(&self) {
        self.parent.clone().unsubscribe(self.id).await
    }
}

/// Simple broadcast (publish-subscribe) class
pub struct Subscriber<T> {
    subs: Mutex<HashMap<SubscriptionId, smol::channel::Sender<T>>>,
}

impl<T: Clone> Subscriber<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { subs: Mutex::new(HashMap::new()) })
    }

    fn random_id() -> SubscriptionId {
        let mut rng = rand::thread_rng();
        rng.gen()
    }

    pub async fn subscribe(self: Arc<Self>) -> Subscription<T> {
        let (sender, recvr) = smol::channel::unbounded();

        let sub_id = Self::random_id();

        self.subs.lock().await.insert(sub_id, sender);

        Subscription { id: sub_id, recv_queue: recvr, parent: self.clone() }
    }

    async fn unsubscribe(self: Arc<Self>, sub_id: SubscriptionId) {
        self.subs.lock().await.remove(&sub_id);
    }

    pub async fn notify(&self, message: T) {
        for sub in (*self.subs.lock().await).values() {
            if let Err(e) = sub.send(message.clone()).await {
                warn!(
                    target: "system::subscriber",
                    "Error returned sending message in notify() call! {}", e,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_all_subscriptions() {
        smol::block_on(async {
            let subscriber: SubscriberPtr<u64> = Subscriber::new();
            let sub0 = subscriber.clone().subscribe().await;
            let sub1 = subscriber.clone().subscribe().await;

            subscriber.notify(42).await;
            assert_eq!(sub0.receive().await, 42);
            assert_eq!(sub1.receive().await, 42);

            sub1.unsubscribe().await;
            subscriber.notify(13).await;
            assert_eq!(sub0.receive().await, 13);
        });
    }
}
