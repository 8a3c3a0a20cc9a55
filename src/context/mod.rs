//! Contexts and their transactions.
//!
//! A [`Context`] holds a configuration and issues queries. Every query
//! becomes a transaction with a [`TransactionId`] which is returned right
//! away. The outcome arrives later through the callback given with the
//! query, exactly once: either the response, an error, or
//! [`Error::Cancelled`] if the transaction was cancelled first.
//!
//! ```no_run
//! use domain_context::context::Context;
//! use domain_context::engine::scripted::ScriptedEngine;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), domain_context::error::Error> {
//! let ctx = Context::create(
//!     ScriptedEngine::new(),
//!     Some(&json!({"timeout": 5000, "upstreams": ["8.8.8.8"]})),
//! )?;
//! let id = ctx.address("example.test", None, |res, id| match res {
//!     Ok(response) => println!("{id}: {:?}", response.just_address_answers()),
//!     Err(err) => println!("{id}: failed: {err}"),
//! })?;
//! ctx.cancel(id);
//! ctx.destroy();
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Each transaction runs as its own task on the Tokio runtime the context
//! was created in. Callbacks run on a separate task per context, one after
//! another, never inside the call that issued or cancelled the
//! transaction. On a current-thread runtime, a query issued from within
//! the runtime has always returned its ID before the callback runs. On a
//! multi-threaded runtime the callback may start while the issuing call
//! is still returning, so callbacks should use the ID they are given
//! rather than state the caller sets up after issuing. Any number of transactions and contexts can be active at
//! the same time.
//!
//! Cancelling races with completion. Whoever takes the transaction out of
//! the context's table first wins: if that is the cancel, the callback
//! receives [`Error::Cancelled`] and `cancel` returns `true`; otherwise
//! the callback receives the real outcome and `cancel` returns `false`.
//!
//! Changing an option only affects transactions issued afterwards. Each
//! transaction works with the configuration it was issued with.

pub use self::dispatch::Callback;
pub use self::lookup::reverse_name;
pub use self::table::TransactionId;

use self::dispatch::Delivery;
use self::table::TransactionTable;
use crate::base::iana::Rtype;
use crate::consts::{
    AppendName, Resolution, TlsAuthentication, Transport, TransportProto,
};
use crate::engine::{Engine, EngineRequest, QueryKind};
use crate::error::Error;
use crate::options::{Config, Extensions, Key, Upstream};
use crate::response::{shape, Response};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tracing::{debug, trace};

mod dispatch;
mod lookup;
mod table;

/// The longest domain name in presentation format.
const MAX_NAME_LEN: usize = 253;

/// The longest label.
const MAX_LABEL_LEN: usize = 63;

/// The serial for the next context.
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

//------------ Context -------------------------------------------------------

/// A configured handle for issuing queries.
///
/// Cloning a context gives another handle to the same context.
#[derive(Clone)]
pub struct Context {
    shared: Arc<Shared>,
}

struct Shared {
    /// The serial distinguishing this context's transaction IDs.
    serial: u64,

    /// The engine doing the actual resolving.
    engine: Arc<dyn Engine>,

    /// The current configuration.
    config: ArcSwap<Config>,

    /// Serializes configuration changes.
    update_lock: Mutex<()>,

    /// The pending transactions.
    table: Mutex<TransactionTable<Entry>>,

    /// Set once the context was destroyed.
    ///
    /// Only changed while holding the table lock.
    destroyed: AtomicBool,

    /// The queue of the dispatcher.
    deliver: mpsc::UnboundedSender<Delivery>,

    /// The runtime transactions are spawned on.
    runtime: Handle,
}

/// A pending transaction.
struct Entry {
    callback: Callback,

    /// The transaction's task.
    ///
    /// This is only `None` while the transaction is being issued.
    task: Option<AbortHandle>,
}

/// What a transaction is asked to do.
struct Query {
    name: String,
    rtype: Rtype,
    kind: QueryKind,
    extensions: Option<Value>,
}

impl Context {
    /// Creates a new context.
    ///
    /// The options are validated right away and any problem is returned
    /// as an error. The context must be created from within a Tokio
    /// runtime which will then run its transactions.
    pub fn create(
        engine: impl Engine,
        options: Option<&Value>,
    ) -> Result<Self, Error> {
        let config = Config::from_options(options)?;
        let runtime = Handle::try_current().map_err(|_| {
            debug!("no runtime for new context");
            Error::BadContext("no async runtime")
        })?;
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(dispatch::run(rx));
        debug!(serial, "context created");
        Ok(Context {
            shared: Arc::new(Shared {
                serial,
                engine: Arc::new(engine),
                config: ArcSwap::from_pointee(config),
                update_lock: Mutex::new(()),
                table: Mutex::new(TransactionTable::new(serial)),
                destroyed: AtomicBool::new(false),
                deliver: tx,
                runtime,
            }),
        })
    }

    /// Destroys the context.
    ///
    /// All pending transactions are cancelled, their callbacks receiving
    /// [`Error::Cancelled`]. Afterwards, queries fail with
    /// [`Error::BadContext`] and cancelling does nothing.
    ///
    /// Returns `true` the first time and `false` ever after.
    pub fn destroy(&self) -> bool {
        let pending: Vec<_> = {
            let mut table = self.shared.table.lock();
            if self.shared.destroyed.swap(true, Ordering::SeqCst) {
                return false;
            }
            table.drain().collect()
        };
        debug!(
            serial = self.shared.serial,
            pending = pending.len(),
            "context destroyed"
        );
        for (id, entry) in pending {
            self.shared.cancel_entry(id, entry);
        }
        true
    }

    /// Returns whether the context was destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::SeqCst)
    }

    /// Cancels a transaction.
    ///
    /// Returns `true` if the transaction was pending. Its callback will
    /// then receive [`Error::Cancelled`] shortly. Returns `false` if the
    /// transaction has already completed or been cancelled, if it belongs
    /// to a different context, or if this context was destroyed.
    pub fn cancel(&self, id: TransactionId) -> bool {
        let entry = match self.shared.table.lock().remove(id) {
            Some(entry) => entry,
            None => {
                trace!(%id, "nothing to cancel");
                return false;
            }
        };
        debug!(%id, "transaction cancelled");
        self.shared.cancel_entry(id, entry);
        true
    }

    /// Returns the number of pending transactions.
    pub fn pending(&self) -> usize {
        self.shared.table.lock().len()
    }

    /// Returns whether a transaction is pending.
    pub fn is_pending(&self, id: TransactionId) -> bool {
        self.shared.table.lock().contains(id)
    }

    /// Fails with [`Error::BadContext`] once the context was destroyed.
    fn check_alive(&self) -> Result<(), Error> {
        if self.is_destroyed() {
            Err(Error::BadContext("context destroyed"))
        } else {
            Ok(())
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> Arc<Config> {
        self.shared.config.load_full()
    }

    /// Issues a query.
    ///
    /// Fails if the context was destroyed, the name is unusable, or there
    /// are too many pending transactions. Everything else is reported to
    /// the callback.
    fn issue(
        &self,
        name: &str,
        rtype: Rtype,
        kind: QueryKind,
        extensions: Option<&Value>,
        callback: Callback,
    ) -> Result<TransactionId, Error> {
        self.check_alive()?;
        check_name(name)?;
        let config = self.shared.config.load_full();
        let query = Query {
            name: name.into(),
            rtype,
            kind,
            extensions: extensions.cloned(),
        };

        // The transaction waits for `go` so its entry is complete before
        // anything can remove it.
        let (go, wait) = oneshot::channel();
        let id = {
            let mut table = self.shared.table.lock();
            self.check_alive()?;
            let id = table
                .insert(Entry {
                    callback,
                    task: None,
                })
                .map_err(|_| {
                    debug!(name, "too many pending transactions");
                    Error::BadContext("too many outstanding transactions")
                })?;
            let task = self.shared.runtime.spawn(Shared::transact(
                self.shared.clone(),
                id,
                query,
                config,
                wait,
            ));
            if let Some(entry) = table.get_mut(id) {
                entry.task = Some(task.abort_handle());
            }
            id
        };
        trace!(%id, name, %rtype, "transaction issued");
        let _ = go.send(());
        Ok(id)
    }

    //--- Options

    /// Sets an option by name.
    ///
    /// This accepts the same names and values as options given to
    /// [`create`][Self::create]. The change only affects queries issued
    /// afterwards.
    pub fn set_option(&self, name: &str, value: &Value) -> Result<(), Error> {
        self.check_alive()?;
        let key = Key::from_name(name).ok_or_else(|| {
            debug!(option = name, "unknown option");
            Error::InvalidParameter(name.into())
        })?;
        self.update(|config| config.apply(key, value))
    }

    /// Sets the query timeout.
    pub fn set_timeout(&self, timeout: Duration) -> Result<(), Error> {
        self.update(|config| {
            config.set_timeout(timeout);
            Ok(())
        })
    }

    /// Sets one of the legacy transport settings.
    pub fn set_dns_transport(&self, transport: Transport) -> Result<(), Error> {
        self.check_alive()?;
        let list = transport
            .to_list()
            .ok_or_else(|| Key::DnsTransport.invalid())?;
        self.set_dns_transport_list(list)
    }

    /// Sets the transports in order of preference.
    pub fn set_dns_transport_list(
        &self,
        list: Vec<TransportProto>,
    ) -> Result<(), Error> {
        self.check_alive()?;
        if list.is_empty() {
            return Err(Key::DnsTransportList.invalid());
        }
        self.update(|config| {
            config.set_dns_transport_list(list);
            Ok(())
        })
    }

    /// Sets the upstream recursive servers.
    pub fn set_upstream_recursive_servers(
        &self,
        servers: Vec<Upstream>,
    ) -> Result<(), Error> {
        self.update(|config| {
            config.set_upstream_recursive_servers(servers);
            Ok(())
        })
    }

    /// Sets the suffixes to append to names.
    pub fn set_suffix(&self, suffix: Vec<String>) -> Result<(), Error> {
        self.update(|config| {
            config.set_suffix(suffix);
            Ok(())
        })
    }

    /// Sets when suffixes are appended.
    pub fn set_append_name(&self, value: AppendName) -> Result<(), Error> {
        self.update(|config| {
            config.set_append_name(value);
            Ok(())
        })
    }

    /// Sets how TLS upstreams are authenticated.
    pub fn set_tls_authentication(
        &self,
        value: TlsAuthentication,
    ) -> Result<(), Error> {
        self.update(|config| {
            config.set_tls_authentication(value);
            Ok(())
        })
    }

    /// Sets stub or recursing resolution.
    pub fn set_resolution_type(&self, value: Resolution) -> Result<(), Error> {
        self.update(|config| {
            config.set_resolution_type(value);
            Ok(())
        })
    }

    /// Replaces the configuration with an updated copy.
    fn update(
        &self,
        op: impl FnOnce(&mut Config) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let _guard = self.shared.update_lock.lock();
        self.check_alive()?;
        let mut config = Config::clone(&self.shared.config.load());
        op(&mut config)?;
        self.shared.config.store(Arc::new(config));
        Ok(())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("serial", &self.shared.serial)
            .field("destroyed", &self.is_destroyed())
            .field("pending", &self.pending())
            .finish()
    }
}

//------------ Shared --------------------------------------------------------

impl Shared {
    /// Runs a transaction to completion.
    async fn transact(
        self: Arc<Self>,
        id: TransactionId,
        query: Query,
        config: Arc<Config>,
        go: oneshot::Receiver<()>,
    ) {
        let _ = go.await;
        let outcome = self.run_query(id, query, config).await;
        let entry = self.table.lock().remove(id);
        match entry {
            Some(entry) => {
                Delivery::new(entry.callback, id, outcome).send(&self.deliver)
            }
            None => trace!(%id, "outcome lost to cancel"),
        }
    }

    /// Resolves a query and shapes the response.
    async fn run_query(
        &self,
        id: TransactionId,
        query: Query,
        config: Arc<Config>,
    ) -> Result<Response, Error> {
        let mut extensions =
            Extensions::parse(query.extensions.as_ref(), &config)?;
        if query.kind == QueryKind::Address {
            extensions.return_both_v4_and_v6 = true;
        }
        config.check_transports()?;
        let raw = self
            .engine
            .resolve(EngineRequest {
                id,
                name: query.name,
                rtype: query.rtype,
                kind: query.kind,
                config,
                extensions,
            })
            .await?;
        trace!(%id, status = %raw.status, "engine completed");
        Ok(shape(raw, query.kind, query.rtype, &extensions))
    }

    /// Cancels a transaction already taken from the table.
    fn cancel_entry(&self, id: TransactionId, entry: Entry) {
        if let Some(task) = entry.task {
            task.abort();
        }
        self.engine.cancel_pending(id);
        Delivery::new(entry.callback, id, Err(Error::Cancelled))
            .send(&self.deliver);
    }
}

//------------ Helper Functions ----------------------------------------------

/// Checks that a name can be looked up at all.
fn check_name(name: &str) -> Result<(), Error> {
    let bad = || Error::BadDomainName(name.into());
    if name == "." {
        return Ok(());
    }
    let relative = name.strip_suffix('.').unwrap_or(name);
    if relative.is_empty() || relative.len() > MAX_NAME_LEN {
        return Err(bad());
    }
    if relative
        .split('.')
        .any(|label| label.is_empty() || label.len() > MAX_LABEL_LEN)
    {
        return Err(bad());
    }
    Ok(())
}

//============ Tests =========================================================
