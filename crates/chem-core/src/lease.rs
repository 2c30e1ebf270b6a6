//! Exclusión mutua por hashkey dentro del proceso.
//!
//! El lease se mantiene desde el lookup hasta el upsert, de modo que dos
//! envíos concurrentes de la misma estructura no disparan dos cómputos. Las
//! entradas se eliminan cuando nadie más espera por la clave.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = Arc<DashMap<String, Arc<Mutex<()>>>>;
type LockWait = Pin<Box<dyn Future<Output = OwnedMutexGuard<()>> + Send>>;

#[derive(Debug, Clone, Default)]
pub struct KeyLeases {
    locks: LockTable,
}

impl KeyLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Espera hasta obtener el lease exclusivo de `key`.
    pub async fn acquire(&self, key: &str) -> KeyLease {
        // El RefMut de DashMap se libera al terminar la sentencia: nunca se
        // mantiene un shard bloqueado a través de un await.
        let lock = Arc::clone(&*self.locks
                                    .entry(key.to_string())
                                    .or_insert_with(|| Arc::new(Mutex::new(()))));
        let pending = PendingLease { key: key.to_string(),
                                     locks: Arc::clone(&self.locks),
                                     wait: Some(Box::pin(lock.lock_owned())) };
        let guard = pending.await;
        KeyLease { key: key.to_string(),
                   guard: Some(guard),
                   locks: Arc::clone(&self.locks) }
    }

    /// Claves con lease activo o en espera.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

/// Espera por el mutex de una clave. Si se cancela (presupuesto agotado),
/// suelta su referencia y limpia la entrada cuando ya nadie la usa.
struct PendingLease {
    key: String,
    locks: LockTable,
    wait: Option<LockWait>,
}

impl Future for PendingLease {
    type Output = OwnedMutexGuard<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.wait.as_mut() {
            Some(wait) => wait.as_mut().poll(cx),
            None => Poll::Pending,
        }
    }
}

impl Drop for PendingLease {
    fn drop(&mut self) {
        // Primero el future (y su Arc); si no, el conteo nunca llega a 1.
        self.wait.take();
        self.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Guard del lease; se libera al soltarse.
#[derive(Debug)]
pub struct KeyLease {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockTable,
}

impl KeyLease {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyLease {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_holder_waits_for_first() {
        let leases = KeyLeases::new();
        let first = leases.acquire("k").await;
        assert_eq!(first.key(), "k");
        let waiting = {
            let leases = leases.clone();
            tokio::spawn(async move { leases.acquire("k").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());
        drop(first);
        let second = tokio::time::timeout(Duration::from_secs(1), waiting).await.unwrap().unwrap();
        drop(second);
        assert_eq!(leases.active(), 0);
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_leave_its_entry_behind() {
        let leases = KeyLeases::new();
        let first = leases.acquire("k").await;
        let mut waiter = Box::pin(leases.acquire("k"));
        assert!(tokio::time::timeout(Duration::from_millis(10), &mut waiter).await.is_err());
        drop(first);
        assert_eq!(leases.active(), 1);
        drop(waiter);
        assert_eq!(leases.active(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let leases = KeyLeases::new();
        let _a = leases.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), leases.acquire("b")).await;
        assert!(b.is_ok());
        assert_eq!(leases.active(), 2);
    }
}
