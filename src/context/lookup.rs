//! The query operations of a context.

use super::{Context, TransactionId};
use crate::base::iana::Rtype;
use crate::engine::QueryKind;
use crate::error::Error;
use crate::response::Response;
use serde_json::Value;
use std::fmt::Write;
use std::net::IpAddr;

impl Context {
    /// Looks up records of the given type for a name.
    ///
    /// `extensions` is an optional mapping of query extensions. Problems
    /// with it are reported to the callback.
    pub fn general<F>(
        &self,
        name: &str,
        rtype: Rtype,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.issue(
            name,
            rtype,
            QueryKind::General,
            extensions,
            Box::new(callback),
        )
    }

    /// Looks up the IPv4 and IPv6 addresses of a host.
    ///
    /// The response has its `just_address_answers` filled in.
    pub fn address<F>(
        &self,
        name: &str,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.issue(
            name,
            Rtype::A,
            QueryKind::Address,
            extensions,
            Box::new(callback),
        )
    }

    /// Looks up the servers of a service.
    ///
    /// `name` is the full service name, e.g., `_xmpp-server._tcp.example.com`.
    /// The response has its `srv_addresses` filled in.
    pub fn service<F>(
        &self,
        name: &str,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.issue(
            name,
            Rtype::SRV,
            QueryKind::Service,
            extensions,
            Box::new(callback),
        )
    }

    /// Looks up the host names of an IP address.
    ///
    /// Fails right away if the context was destroyed or `address` isn't an
    /// IPv4 or IPv6 address.
    pub fn hostname<F>(
        &self,
        address: &str,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.check_alive()?;
        let addr = address
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| Error::BadDomainName(address.into()))?;
        self.issue(
            &reverse_name(addr),
            Rtype::PTR,
            QueryKind::Hostname,
            extensions,
            Box::new(callback),
        )
    }

    //--- Old names

    /// Old name of [`general`][Self::general].
    #[deprecated(note = "use general")]
    pub fn lookup<F>(
        &self,
        name: &str,
        rtype: Rtype,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.general(name, rtype, extensions, callback)
    }

    /// Old name of [`address`][Self::address].
    #[deprecated(note = "use address")]
    pub fn get_address<F>(
        &self,
        name: &str,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.address(name, extensions, callback)
    }

    /// Old name of [`service`][Self::service].
    #[deprecated(note = "use service")]
    pub fn get_service<F>(
        &self,
        name: &str,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.service(name, extensions, callback)
    }

    /// Old name of [`hostname`][Self::hostname].
    #[deprecated(note = "use hostname")]
    pub fn get_hostname<F>(
        &self,
        address: &str,
        extensions: Option<&Value>,
        callback: F,
    ) -> Result<TransactionId, Error>
    where
        F: FnOnce(Result<Response, Error>, TransactionId) + Send + 'static,
    {
        self.hostname(address, extensions, callback)
    }
}

//------------ reverse_name --------------------------------------------------

/// Returns the name for reverse lookups of an address.
pub fn reverse_name(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(addr) => {
            let octets = addr.octets();
            format!(
                "{}.{}.{}.{}.in-addr.arpa.",
                octets[3], octets[2], octets[1], octets[0]
            )
        }
        IpAddr::V6(addr) => {
            let mut res = String::with_capacity(73);
            for &item in addr.octets().iter().rev() {
                let _ = write!(res, "{:x}.{:x}.", item & 0x0F, item >> 4);
            }
            res.push_str("ip6.arpa.");
            res
        }
    }
}

//============ Tests =========================================================
