use std::sync::Arc;

use tokio::sync::Mutex;

use rxl_ledger::Ledger;
use rxl_store::ChainStore;

/// The ledger handle shared by all request handlers.
///
/// The mutex is the single-writer guarantee: the ledger itself does no
/// locking, so every read and append goes through this lock.
pub type SharedLedger = Arc<Mutex<Ledger<Box<dyn ChainStore>>>>;

#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
}

impl AppState {
    pub fn new(ledger: Ledger<Box<dyn ChainStore>>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }
}
