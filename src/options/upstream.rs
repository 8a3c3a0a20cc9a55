//! Upstream recursive servers.
//!
//! The `upstream_recursive_servers` option is a sequence whose elements
//! are either strings or small sequences:
//!
//! * `"192.0.2.1"` or `"2001:db8::1"` adds a server,
//! * `"~example.com,example.net"` replaces the suffix list,
//! * `"^[algorithm:]name:secret"` attaches a TSIG key to the server added
//!   last,
//! * `["192.0.2.1", 853, "dns.example"]` adds a server with a port and
//!   either a TLS authentication name, a TSIG key (`^...`) or a suffix list
//!   (`~...`) as its last element. The port may be left out.

use super::{parse_suffix, Key};
use crate::error::Error;
use crate::utils::base64;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::net::IpAddr;
use std::{fmt, str};
use tracing::debug;

//------------ Upstream ------------------------------------------------------

/// A single upstream recursive server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Upstream {
    /// The address of the server.
    addr: IpAddr,

    /// The port if one was given.
    port: Option<u16>,

    /// The name the server's TLS certificate must be valid for.
    tls_auth_name: Option<String>,

    /// The key to sign queries to this server with.
    tsig: Option<TsigKey>,
}

impl Upstream {
    /// Creates a new upstream for the given address.
    pub fn new(addr: IpAddr) -> Self {
        Upstream {
            addr,
            port: None,
            tls_auth_name: None,
            tsig: None,
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the TLS authentication name.
    pub fn with_tls_auth_name(mut self, name: impl Into<String>) -> Self {
        self.tls_auth_name = Some(name.into());
        self
    }

    /// Sets the TSIG key.
    pub fn with_tsig(mut self, key: TsigKey) -> Self {
        self.tsig = Some(key);
        self
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn tls_auth_name(&self) -> Option<&str> {
        self.tls_auth_name.as_deref()
    }

    pub fn tsig(&self) -> Option<&TsigKey> {
        self.tsig.as_ref()
    }
}

//------------ UpstreamList --------------------------------------------------

/// The outcome of parsing an upstream option.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UpstreamList {
    /// The servers in the order they were given.
    pub servers: Vec<Upstream>,

    /// A suffix list given via a `~` entry.
    ///
    /// The last such entry wins.
    pub suffix: Option<Vec<String>>,
}

impl UpstreamList {
    /// Parses the value of the upstream option named `key`.
    pub(crate) fn parse(key: Key, value: &Value) -> Result<Self, Error> {
        let entries = match value.as_array() {
            Some(entries) => entries,
            None => return Err(key.invalid()),
        };
        let mut res = UpstreamList::default();
        for entry in entries {
            match entry {
                Value::String(s) => res.push_str(key, s)?,
                Value::Array(tuple) => res.push_tuple(key, tuple)?,
                _ => return Err(key.invalid()),
            }
        }
        Ok(res)
    }

    /// Processes a string entry.
    fn push_str(&mut self, key: Key, s: &str) -> Result<(), Error> {
        if let Some(spec) = s.strip_prefix('^') {
            let tsig = TsigKey::from_spec(spec).map_err(|err| {
                debug!(option = %key, "bad TSIG key: {err}");
                key.update_fail()
            })?;
            match self.servers.last_mut() {
                Some(server) => server.tsig = Some(tsig),
                None => {
                    debug!(option = %key, "TSIG key without a server");
                    return Err(key.update_fail());
                }
            }
        } else if let Some(list) = s.strip_prefix('~') {
            self.suffix = Some(parse_suffix(list));
        } else {
            self.servers.push(Upstream::new(parse_addr(key, s)?));
        }
        Ok(())
    }

    /// Processes a sequence entry.
    fn push_tuple(&mut self, key: Key, tuple: &[Value]) -> Result<(), Error> {
        let mut items = tuple.iter();
        let addr = match items.next() {
            Some(Value::String(addr)) => parse_addr(key, addr)?,
            Some(_) => return Err(key.invalid()),
            None => return Err(key.update_fail()),
        };
        let mut server = Upstream::new(addr);
        let mut next = items.next();
        if let Some(port) = next.and_then(Value::as_u64) {
            server.port = match u16::try_from(port) {
                Ok(port) if port != 0 => Some(port),
                _ => return Err(key.update_fail()),
            };
            next = items.next();
        }
        match next {
            Some(Value::String(extra)) => {
                if let Some(spec) = extra.strip_prefix('^') {
                    server.tsig = Some(
                        TsigKey::from_spec(spec)
                            .map_err(|_| key.update_fail())?,
                    );
                } else if let Some(list) = extra.strip_prefix('~') {
                    self.suffix = Some(parse_suffix(list));
                } else if !extra.is_empty() {
                    server.tls_auth_name = Some(extra.clone());
                }
            }
            Some(_) => return Err(key.invalid()),
            None => {}
        }
        if items.next().is_some() {
            return Err(key.invalid());
        }
        self.servers.push(server);
        Ok(())
    }
}

/// Parses an address string.
fn parse_addr(key: Key, s: &str) -> Result<IpAddr, Error> {
    s.trim().parse().map_err(|_| {
        debug!(option = %key, "unusable upstream address '{s}'");
        key.update_fail()
    })
}

//------------ TsigKey -------------------------------------------------------

/// A TSIG key for signing queries to an upstream.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TsigKey {
    /// The name of the key.
    name: String,

    /// The MAC algorithm.
    algorithm: TsigAlgorithm,

    /// The shared secret.
    #[serde(skip)]
    secret: Bytes,
}

impl TsigKey {
    /// Creates a key from its parts.
    pub fn new(
        name: impl Into<String>,
        algorithm: TsigAlgorithm,
        secret: Bytes,
    ) -> Self {
        TsigKey {
            name: name.into(),
            algorithm,
            secret,
        }
    }

    /// Parses a key from `[algorithm:]name:secret` with a base64 secret.
    pub fn from_spec(spec: &str) -> Result<Self, TsigSpecError> {
        let parts: Vec<_> = spec.split(':').collect();
        let (algorithm, name, secret) = match parts.as_slice() {
            [name, secret] => (TsigAlgorithm::default(), *name, *secret),
            [alg, name, secret] => (alg.parse()?, *name, *secret),
            _ => return Err(TsigSpecError::Format),
        };
        if name.is_empty() {
            return Err(TsigSpecError::Format);
        }
        let secret = base64::decode(secret)
            .map_err(|_| TsigSpecError::Secret)?;
        if secret.is_empty() {
            return Err(TsigSpecError::Secret);
        }
        Ok(TsigKey::new(name, algorithm, secret))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> TsigAlgorithm {
        self.algorithm
    }

    pub fn secret(&self) -> &Bytes {
        &self.secret
    }
}

//------------ TsigAlgorithm -------------------------------------------------

/// The MAC algorithms a TSIG key can use.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TsigAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl TsigAlgorithm {
    /// Returns the name of the algorithm as used in TSIG records.
    pub fn as_str(self) -> &'static str {
        match self {
            TsigAlgorithm::Md5 => "hmac-md5.sig-alg.reg.int",
            TsigAlgorithm::Sha1 => "hmac-sha1",
            TsigAlgorithm::Sha224 => "hmac-sha224",
            TsigAlgorithm::Sha256 => "hmac-sha256",
            TsigAlgorithm::Sha384 => "hmac-sha384",
            TsigAlgorithm::Sha512 => "hmac-sha512",
        }
    }
}

//--- FromStr

impl str::FromStr for TsigAlgorithm {
    type Err = TsigSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches('.').to_ascii_lowercase().as_str() {
            "hmac-md5" | "hmac-md5.sig-alg.reg.int" => Ok(TsigAlgorithm::Md5),
            "hmac-sha1" => Ok(TsigAlgorithm::Sha1),
            "hmac-sha224" => Ok(TsigAlgorithm::Sha224),
            "hmac-sha256" => Ok(TsigAlgorithm::Sha256),
            "hmac-sha384" => Ok(TsigAlgorithm::Sha384),
            "hmac-sha512" => Ok(TsigAlgorithm::Sha512),
            _ => Err(TsigSpecError::Algorithm),
        }
    }
}

//--- Display and Serialize

impl fmt::Display for TsigAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TsigAlgorithm {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

//------------ TsigSpecError -------------------------------------------------

/// A TSIG key specification could not be used.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TsigSpecError {
    /// The name or the separators are missing.
    Format,

    /// The algorithm is not known.
    Algorithm,

    /// The secret is not valid base64.
    Secret,
}

impl fmt::Display for TsigSpecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TsigSpecError::Format => f.write_str("expected [alg:]name:secret"),
            TsigSpecError::Algorithm => f.write_str("unknown algorithm"),
            TsigSpecError::Secret => f.write_str("bad secret"),
        }
    }
}

impl std::error::Error for TsigSpecError {}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    const KEY: Key = Key::UpstreamRecursiveServers;

    #[test]
    fn plain_addresses() {
        let list =
            UpstreamList::parse(KEY, &json!(["8.8.8.8", "2001:db8::53"]))
                .unwrap();
        assert_eq!(list.servers.len(), 2);
        assert_eq!(list.servers[0].addr(), "8.8.8.8".parse::<IpAddr>().unwrap());
        assert_eq!(list.servers[1].port(), None);
        assert_eq!(list.suffix, None);
    }

    #[test]
    fn tuples() {
        let list = UpstreamList::parse(
            KEY,
            &json!([
                ["185.49.141.38", 853, "getdnsapi.net"],
                ["127.0.0.1", 53],
                ["192.0.2.1", "^hmac-sha256:key.example:Zm9vYmFy"],
                ["192.0.2.2", "~example.com,example.net"],
            ]),
        )
        .unwrap();
        assert_eq!(list.servers.len(), 4);
        assert_eq!(list.servers[0].port(), Some(853));
        assert_eq!(list.servers[0].tls_auth_name(), Some("getdnsapi.net"));
        assert_eq!(list.servers[1].port(), Some(53));
        assert_eq!(list.servers[1].tls_auth_name(), None);
        let tsig = list.servers[2].tsig().unwrap();
        assert_eq!(tsig.name(), "key.example");
        assert_eq!(tsig.algorithm(), TsigAlgorithm::Sha256);
        assert_eq!(tsig.secret().as_ref(), b"foobar");
        assert_eq!(
            list.suffix,
            Some(vec!["example.com".into(), "example.net".into()])
        );
    }

    #[test]
    fn tsig_string_attaches_to_previous() {
        let list = UpstreamList::parse(
            KEY,
            &json!(["185.49.141.37", "^hmac-md5.tsigs.getdnsapi.net:16G69OTeXW6xSQ=="]),
        )
        .unwrap();
        let tsig = list.servers[0].tsig().unwrap();
        assert_eq!(tsig.name(), "hmac-md5.tsigs.getdnsapi.net");
        assert_eq!(tsig.algorithm(), TsigAlgorithm::Md5);

        assert_eq!(
            UpstreamList::parse(KEY, &json!(["^name:Zm9v"])),
            Err(Error::ContextUpdateFail(KEY.to_string()))
        );
    }

    #[test]
    fn rejects() {
        assert_eq!(
            UpstreamList::parse(KEY, &json!("8.8.8.8")),
            Err(Error::InvalidParameter(KEY.to_string()))
        );
        assert_eq!(
            UpstreamList::parse(KEY, &json!([{ "address": "8.8.8.8" }])),
            Err(Error::InvalidParameter(KEY.to_string()))
        );
        assert_eq!(
            UpstreamList::parse(KEY, &json!(["not-an-address"])),
            Err(Error::ContextUpdateFail(KEY.to_string()))
        );
        assert_eq!(
            UpstreamList::parse(KEY, &json!([["192.0.2.1", 70000]])),
            Err(Error::ContextUpdateFail(KEY.to_string()))
        );
        assert_eq!(
            UpstreamList::parse(KEY, &json!([["192.0.2.1", "^hmac-foo:n:Zm9v"]])),
            Err(Error::ContextUpdateFail(KEY.to_string()))
        );
    }

    #[test]
    fn tsig_spec() {
        assert_eq!(TsigKey::from_spec("nocolon"), Err(TsigSpecError::Format));
        assert_eq!(TsigKey::from_spec(":Zm9v"), Err(TsigSpecError::Format));
        assert_eq!(TsigKey::from_spec("n:!!"), Err(TsigSpecError::Secret));
        assert_eq!(
            TsigKey::from_spec("hmac-sha384:n:Zm9v").unwrap().algorithm(),
            TsigAlgorithm::Sha384
        );
    }
}
