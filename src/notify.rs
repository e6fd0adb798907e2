//! Change notifications for the persistence stores
//!
//! A store announces its own writes on a local broadcast channel. Writes made
//! by other contexts of the same storage arrive through
//! `KeyValueStorage::external_changes`. A `Subscription` merges both so a
//! listener sees every change to the key it cares about.

use crate::{
    constants::CHANGE_CHANNEL_CAPACITY,
    storage::{ExternalChanges, KeyValueStorage},
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Where a change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Written through the same store handle
    Local,
    /// Written by another context sharing the storage
    External,
}

/// A change to a stored key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub origin: ChangeOrigin,
}

/// Local broadcaster owned by a store
pub(crate) struct ChangeNotifier {
    key: &'static str,
    tx: broadcast::Sender<StorageChange>,
}

impl ChangeNotifier {
    pub(crate) fn new(key: &'static str) -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { key, tx }
    }

    /// Announces a local write
    pub(crate) fn notify(&self) {
        let _ = self.tx.send(StorageChange {
            key: self.key.to_string(),
            origin: ChangeOrigin::Local,
        });
    }

    pub(crate) fn subscribe(&self, storage: Option<&Arc<dyn KeyValueStorage>>) -> Subscription {
        Subscription {
            key: self.key,
            local: self.tx.subscribe(),
            external: storage.and_then(|s| s.external_changes()),
        }
    }
}

/// Listener for changes to one stored key
pub struct Subscription {
    key: &'static str,
    local: broadcast::Receiver<StorageChange>,
    external: Option<ExternalChanges>,
}

impl Subscription {
    /// Waits for the next change
    ///
    /// Returns `None` once the owning store is gone.
    pub async fn recv(&mut self) -> Option<StorageChange> {
        let Self {
            key,
            local,
            external,
        } = self;

        loop {
            let external_write = async {
                match external.as_mut() {
                    Some(changes) => changes.recv().await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                change = local.recv() => match change {
                    Ok(change) => return Some(change),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                },
                write = external_write => match write {
                    Some(write) if write.key == *key => {
                        return Some(StorageChange {
                            key: write.key,
                            origin: ChangeOrigin::External,
                        });
                    }
                    Some(_) => continue,
                    None => *external = None,
                },
            }
        }
    }

    /// Returns a pending change without waiting
    pub fn try_recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.local.try_recv() {
                Ok(change) => return Some(change),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        let external = self.external.as_mut()?;
        while let Some(write) = external.try_recv() {
            if write.key == self.key {
                return Some(StorageChange {
                    key: write.key,
                    origin: ChangeOrigin::External,
                });
            }
        }
        None
    }
}
