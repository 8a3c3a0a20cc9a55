//! Error type for contexts and transactions.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::consts::{CallbackType, ReturnCode};
use std::error;
use std::fmt::{Display, Formatter};

//------------ Error ---------------------------------------------------------

/// Error type for contexts and transactions.
///
/// Errors returned directly by a context operation are always one of the
/// configuration or name variants. Everything that goes wrong after a
/// transaction id was handed out reaches the transaction's callback instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// An option has the wrong shape or is not known at all.
    ///
    /// Carries the name of the offending option.
    InvalidParameter(String),

    /// An option has the right shape but its content is unusable.
    ///
    /// Carries the name of the offending option.
    ContextUpdateFail(String),

    /// A query extension has a bad value.
    ///
    /// Carries the name of the offending extension.
    ExtensionMisformat(String),

    /// A query extension is not known.
    NoSuchExtension(String),

    /// The context is destroyed or can't serve the request as configured.
    BadContext(&'static str),

    /// The name to look up is unusable.
    BadDomainName(String),

    /// The transaction was cancelled.
    Cancelled,

    /// The engine gave up waiting for an answer.
    Timeout,

    /// Any other failure reported by the resolution engine.
    Resolution {
        /// The engine's numeric code.
        code: u32,

        /// The engine's description of the failure.
        msg: String,
    },
}

impl Error {
    /// Returns the numeric code for the error.
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidParameter(_) => ReturnCode::INVALID_PARAMETER,
            Error::ContextUpdateFail(_) => ReturnCode::CONTEXT_UPDATE_FAIL,
            Error::ExtensionMisformat(_) => ReturnCode::EXTENSION_MISFORMAT,
            Error::NoSuchExtension(_) => ReturnCode::NO_SUCH_EXTENSION,
            Error::BadContext(_) => ReturnCode::BAD_CONTEXT,
            Error::BadDomainName(_) => ReturnCode::BAD_DOMAIN_NAME,
            Error::Cancelled => return CallbackType::CANCEL.to_int(),
            Error::Timeout => return CallbackType::TIMEOUT.to_int(),
            Error::Resolution { code, .. } => return *code,
        }
        .to_int()
    }

    /// Returns the message for the error.
    ///
    /// For option errors this is just the name of the option.
    pub fn msg(&self) -> String {
        self.to_string()
    }

    /// Returns whether the error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::InvalidParameter(key)
            | Error::ContextUpdateFail(key)
            | Error::ExtensionMisformat(key)
            | Error::NoSuchExtension(key) => f.write_str(key),
            Error::BadContext(reason) => write!(f, "bad context: {reason}"),
            Error::BadDomainName(name) => {
                write!(f, "bad domain name '{name}'")
            }
            Error::Cancelled => write!(f, "transaction cancelled"),
            Error::Timeout => write!(f, "transaction timed out"),
            Error::Resolution { msg, .. } => f.write_str(msg),
        }
    }
}

impl error::Error for Error {}

//============ Tests =========================================================
