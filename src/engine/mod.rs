//! The resolution engine.
//!
//! A context doesn't talk to the network itself. It hands every query to an
//! [`Engine`] which does the actual resolving, including transport
//! selection, DNSSEC validation and TSIG, and reports back a
//! [`RawResponse`] or an [`EngineError`].
//!
//! The engine gets the configuration snapshot that was current when the
//! query was issued, so it never has to care about later changes.
//!
//! [`scripted::ScriptedEngine`] is an engine that answers from a table
//! prepared in advance.

use crate::base::iana::Rtype;
use crate::consts::{
    BadDns, CallbackType, DnssecStatus, NameType, RespStatus,
};
use crate::context::TransactionId;
use crate::error::Error;
use crate::options::{Config, Extensions};
use crate::response::{CallReport, Header, Question, Record};
use bytes::Bytes;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod scripted;

//------------ Engine --------------------------------------------------------

/// The future returned by [`Engine::resolve`].
pub type ResolveFuture<'a> = Pin<
    Box<dyn Future<Output = Result<RawResponse, EngineError>> + Send + 'a>,
>;

/// Something that can resolve queries.
pub trait Engine: Send + Sync + 'static {
    /// Resolves a single query.
    ///
    /// The future is dropped without being polled to completion if the
    /// transaction is cancelled, so it needs to be cancel safe.
    fn resolve(&self, request: EngineRequest) -> ResolveFuture<'_>;

    /// Asks the engine to abandon any network activity for a transaction.
    ///
    /// This is best effort. Returns whether the engine knew the
    /// transaction.
    fn cancel_pending(&self, id: TransactionId) -> bool;
}

impl<E: Engine + ?Sized> Engine for Arc<E> {
    fn resolve(&self, request: EngineRequest) -> ResolveFuture<'_> {
        (**self).resolve(request)
    }

    fn cancel_pending(&self, id: TransactionId) -> bool {
        (**self).cancel_pending(id)
    }
}

//------------ QueryKind -----------------------------------------------------

/// Which of the lookup operations issued a query.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum QueryKind {
    /// A query for a name and type.
    General,

    /// The addresses of a host, both IPv4 and IPv6.
    Address,

    /// The SRV records of a service.
    Service,

    /// The names of an address.
    Hostname,
}

//------------ EngineRequest -------------------------------------------------

/// Everything the engine needs to know about a query.
#[derive(Clone, Debug)]
pub struct EngineRequest {
    /// The transaction the query belongs to.
    pub id: TransactionId,

    /// The name to look up.
    pub name: String,

    /// The record type to look up.
    pub rtype: Rtype,

    pub kind: QueryKind,

    /// The context's configuration at the time the query was issued.
    pub config: Arc<Config>,

    /// The extensions merged over the context defaults.
    pub extensions: Extensions,
}

//------------ RawResponse ---------------------------------------------------

/// The engine's result for a query.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: RespStatus,
    pub answer_type: NameType,
    pub canonical_name: Option<String>,

    /// One reply per query the engine made.
    pub replies: Vec<RawReply>,

    /// What the engine did, whether asked for or not.
    pub call_reporting: Vec<CallReport>,
}

/// A single reply as seen by the engine.
#[derive(Clone, Debug)]
pub struct RawReply {
    /// The reply in wire format.
    pub wire: Bytes,
    pub header: Header,
    pub question: Question,
    pub answer: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
    pub canonical_name: Option<String>,
    pub answer_type: NameType,
    pub dnssec_status: Option<DnssecStatus>,
    pub bad_dns: Vec<BadDns>,
    pub tsig_status: Option<DnssecStatus>,
}

//------------ EngineError ---------------------------------------------------

/// A failure reported by the engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineError {
    code: u32,
    msg: String,
}

impl EngineError {
    /// Creates an error from a code and a message.
    pub fn new(code: u32, msg: impl Into<String>) -> Self {
        EngineError {
            code,
            msg: msg.into(),
        }
    }

    /// Creates the error for a query that took too long.
    pub fn timeout() -> Self {
        Self::new(CallbackType::TIMEOUT.to_int(), "query timed out")
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        if err.code == CallbackType::TIMEOUT.to_int() {
            Error::Timeout
        } else {
            Error::Resolution {
                code: err.code,
                msg: err.msg,
            }
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.msg, self.code)
    }
}

impl std::error::Error for EngineError {}
