//! Transactional factory: produces adapters and scopes transactions
//!
//! State machine:
//!
//! ```text
//! Uninitialized --configure--> Configured --run_transaction--> TransactionActive
//!                                  ^                                 |
//!                                  +------- commit / rollback -------+
//! ```
//!
//! `run_transaction` before `configure` fails with `NotConfigured`. The
//! options captured by `configure` are shared by every adapter the factory
//! builds afterwards, including the ones bound to transactions.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use authbridge_core::{Error, QueryExecutor, Result, TransactionalExecutor};

use crate::adapter::CrudAdapter;
use crate::config::AdapterConfig;
use crate::options::AuthOptions;

/// Adapter handed to `run_transaction` callbacks.
///
/// Bound to the transaction, or to the plain executor when the configuration
/// disables transactions.
pub type TxAdapter<'a> = CrudAdapter<'a, dyn QueryExecutor + 'a>;

#[derive(Debug)]
enum FactoryState {
    Uninitialized,
    Configured(Arc<AuthOptions>),
}

/// Factory binding an executor and an adapter configuration
pub struct AdapterFactory<S: TransactionalExecutor> {
    executor: S,
    config: AdapterConfig,
    state: RwLock<FactoryState>,
}

impl<S: TransactionalExecutor> AdapterFactory<S> {
    /// Bind `executor` and `config`. No adapter can run transactions until
    /// [`configure`](Self::configure) has been called.
    pub fn new(executor: S, config: AdapterConfig) -> Self {
        Self {
            executor,
            config,
            state: RwLock::new(FactoryState::Uninitialized),
        }
    }

    /// The bound executor
    pub fn executor(&self) -> &S {
        &self.executor
    }

    /// Adapter configuration
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Whether `configure` has been called
    pub fn is_configured(&self) -> bool {
        matches!(*self.state.read(), FactoryState::Configured(_))
    }

    /// Store the runtime options and return an adapter bound to the executor.
    ///
    /// Calling this again replaces the options (with a warning); adapters
    /// built earlier keep the options they were built with.
    pub fn configure(&self, options: AuthOptions) -> CrudAdapter<'_, S> {
        let options = Arc::new(options);
        {
            let mut state = self.state.write();
            if matches!(*state, FactoryState::Configured(_)) {
                warn!(target: "authbridge::factory", adapter = %self.config.adapter_id, "Factory reconfigured, replacing runtime options");
            } else {
                info!(target: "authbridge::factory", adapter = %self.config.adapter_id, "Factory configured");
            }
            *state = FactoryState::Configured(Arc::clone(&options));
        }
        CrudAdapter::new(&self.executor, &self.config, options)
    }

    /// Adapter bound to the executor with the stored options.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` before `configure`.
    pub fn adapter(&self) -> Result<CrudAdapter<'_, S>> {
        let options = self.options()?;
        Ok(CrudAdapter::new(&self.executor, &self.config, options))
    }

    /// Run `f` against an adapter bound to a fresh unit of work.
    ///
    /// Commits when `f` returns `Ok`, rolls back and returns the callback's
    /// error unchanged when it returns `Err`.
    ///
    /// ```ignore
    /// factory.run_transaction(|tx| {
    ///     let user = tx.create("user", row, None)?;
    ///     tx.create("account", account_for(&user), None)?;
    ///     Ok(user)
    /// })?;
    /// ```
    ///
    /// # Errors
    ///
    /// `NotConfigured` before `configure`, any error of `f`, or
    /// `TransactionConflict` if a concurrent commit won.
    pub fn run_transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&TxAdapter<'_>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let options = self.options()?;

        if !self.config.transactions {
            debug!(target: "authbridge::factory", "Transactions disabled, running callback on the plain adapter");
            let executor: &dyn QueryExecutor = &self.executor;
            return f(&CrudAdapter::new(executor, &self.config, options));
        }

        let mut guard = RollbackGuard {
            executor: &self.executor,
            txn: Some(self.executor.begin()?),
        };
        let result = {
            let executor: &dyn QueryExecutor = guard.txn()?;
            f(&CrudAdapter::new(executor, &self.config, options))
        };
        let txn = guard.disarm()?;

        match result {
            Ok(value) => {
                self.executor.commit(txn)?;
                Ok(value)
            }
            Err(e) => {
                self.executor.rollback(txn);
                Err(e)
            }
        }
    }

    fn options(&self) -> Result<Arc<AuthOptions>> {
        match &*self.state.read() {
            FactoryState::Configured(options) => Ok(Arc::clone(options)),
            FactoryState::Uninitialized => Err(Error::NotConfigured),
        }
    }
}

/// Rolls back a transaction that is still open when dropped (callback panic)
struct RollbackGuard<'a, S: TransactionalExecutor> {
    executor: &'a S,
    txn: Option<S::Transaction>,
}

impl<S: TransactionalExecutor> RollbackGuard<'_, S> {
    fn txn(&self) -> Result<&S::Transaction> {
        self.txn
            .as_ref()
            .ok_or_else(|| Error::internal("transaction already finished"))
    }

    fn disarm(&mut self) -> Result<S::Transaction> {
        self.txn
            .take()
            .ok_or_else(|| Error::internal("transaction already finished"))
    }
}

impl<S: TransactionalExecutor> Drop for RollbackGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            warn!(target: "authbridge::factory", "Transaction callback unwound, rolling back");
            self.executor.rollback(txn);
        }
    }
}
