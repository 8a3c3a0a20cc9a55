//! Context configuration.
//!
//! Applications describe a context with a free-form mapping, usually
//! written with [`serde_json::json!`]. [`Config::from_options`] checks that
//! mapping against the fixed set of recognized options, listed by [`Key`],
//! and turns it into a typed [`Config`]. Individual options can later be
//! changed through [`Config::apply`] or the typed setters.
//!
//! Shape errors, such as a string where a number is expected or an unknown
//! key, are reported as [`Error::InvalidParameter`]. Values of the right
//! shape that still can't be used, such as an unparseable upstream address,
//! are reported as [`Error::ContextUpdateFail`]. Both carry the name of the
//! offending option and nothing else.

pub use self::extensions::Extensions;
pub use self::pin::{PinError, PubkeyPin};
pub use self::upstream::{
    TsigAlgorithm, TsigKey, TsigSpecError, Upstream, UpstreamList,
};

use crate::consts::{
    AppendName, Extension, Namespace, Redirects, Resolution,
    TlsAuthentication, Transport, TransportProto,
};
use crate::error::Error;
use crate::utils::config::DefMinMax;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub mod extensions;
mod pin;
mod upstream;

//------------ Configuration Constants ---------------------------------------

/// How long the engine may take for a query.
///
/// Five seconds is what the original bindings used in all their samples.
/// Values beyond an hour are trimmed.
const TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_millis(5000),
    Duration::from_millis(1),
    Duration::from_secs(3600),
);

/// The EDNS maximum UDP payload size.
///
/// The default follows the DNS flag day 2020 recommendation.
const EDNS_UDP_PAYLOAD: DefMinMax<u16> = DefMinMax::new(1232, 512, 4096);

//------------ Key -----------------------------------------------------------

/// The recognized option names.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    Stub,
    Upstreams,
    UpstreamRecursiveServers,
    Timeout,
    DnssecAllowedSkew,
    UseThreads,
    ReturnDnssecStatus,
    DnsTransport,
    DnsTransportList,
    FollowRedirects,
    TlsAuthentication,
    ResolutionType,
    AppendName,
    Namespaces,
    Suffix,
    Pinset,
    TrustAnchor,
    DnsRootServer,
    DnsRootServerAlias,
    EdnsExtendedRcode,
    EdnsVersion,
    EdnsDoBit,
    LimitOutstandingQueries,
    EdnsMaximumUdpPayloadSize,
    AddWarningForBadDns,
    ReturnCallReporting,
    DnssecReturnAllStatuses,
}

impl Key {
    /// All recognized options.
    pub const ALL: [Key; 27] = [
        Key::Stub,
        Key::Upstreams,
        Key::UpstreamRecursiveServers,
        Key::Timeout,
        Key::DnssecAllowedSkew,
        Key::UseThreads,
        Key::ReturnDnssecStatus,
        Key::DnsTransport,
        Key::DnsTransportList,
        Key::FollowRedirects,
        Key::TlsAuthentication,
        Key::ResolutionType,
        Key::AppendName,
        Key::Namespaces,
        Key::Suffix,
        Key::Pinset,
        Key::TrustAnchor,
        Key::DnsRootServer,
        Key::DnsRootServerAlias,
        Key::EdnsExtendedRcode,
        Key::EdnsVersion,
        Key::EdnsDoBit,
        Key::LimitOutstandingQueries,
        Key::EdnsMaximumUdpPayloadSize,
        Key::AddWarningForBadDns,
        Key::ReturnCallReporting,
        Key::DnssecReturnAllStatuses,
    ];

    /// Returns the key for an option name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Returns the option name.
    pub fn as_str(self) -> &'static str {
        match self {
            Key::Stub => "stub",
            Key::Upstreams => "upstreams",
            Key::UpstreamRecursiveServers => "upstream_recursive_servers",
            Key::Timeout => "timeout",
            Key::DnssecAllowedSkew => "dnssecallowedskew",
            Key::UseThreads => "use_threads",
            Key::ReturnDnssecStatus => "return_dnssec_status",
            Key::DnsTransport => "dns_transport",
            Key::DnsTransportList => "dns_transport_list",
            Key::FollowRedirects => "follow_redirects",
            Key::TlsAuthentication => "tls_authentication",
            Key::ResolutionType => "resolution_type",
            Key::AppendName => "append_name",
            Key::Namespaces => "namespaces",
            Key::Suffix => "suffix",
            Key::Pinset => "pinset",
            Key::TrustAnchor => "trustanchor",
            Key::DnsRootServer => "dnsrootserver",
            Key::DnsRootServerAlias => "dns_root_server",
            Key::EdnsExtendedRcode => "edns_extended_rcode",
            Key::EdnsVersion => "edns_version",
            Key::EdnsDoBit => "edns_do_bit",
            Key::LimitOutstandingQueries => "limit_outstanding_queries",
            Key::EdnsMaximumUdpPayloadSize => "edns_maximum_udp_payloadSize",
            Key::AddWarningForBadDns => "add_warning_for_bad_dns",
            Key::ReturnCallReporting => "return_call_reporting",
            Key::DnssecReturnAllStatuses => "dnssec_return_all_statuses",
        }
    }

    /// Returns the error for a value of the wrong shape.
    pub(crate) fn invalid(self) -> Error {
        Error::InvalidParameter(self.as_str().into())
    }

    /// Returns the error for a value that can't be used.
    pub(crate) fn update_fail(self) -> Error {
        Error::ContextUpdateFail(self.as_str().into())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//------------ Config --------------------------------------------------------

/// The configuration of a context.
///
/// A value of this type is immutable once a transaction captured it. The
/// context keeps the current version and hands out shared snapshots.
#[derive(Clone, Debug, Serialize)]
pub struct Config {
    /// Stub or recursing resolution.
    resolution_type: Resolution,

    /// The upstreams used in stub mode.
    upstream_recursive_servers: Vec<Upstream>,

    /// Time the engine may spend on a query.
    #[serde(serialize_with = "serialize_millis")]
    timeout: Duration,

    /// Allowed clock skew for signature validity in seconds.
    dnssec_allowed_skew: u32,

    /// Whether the engine may use its own threads.
    use_threads: bool,

    /// Whether replies carry their DNSSEC status.
    return_dnssec_status: bool,

    /// The transports in order of preference.
    dns_transport_list: Vec<TransportProto>,

    follow_redirects: Redirects,

    tls_authentication: TlsAuthentication,

    append_name: AppendName,

    namespaces: Vec<Namespace>,

    /// Domains appended to a query name according to `append_name`.
    suffix: Vec<String>,

    pinset: Vec<PubkeyPin>,

    /// A file with DNSSEC trust anchors.
    trust_anchor: Option<PathBuf>,

    /// A root hints file.
    dns_root_servers: Option<PathBuf>,

    edns_extended_rcode: u8,

    edns_version: u8,

    edns_do_bit: u8,

    /// Maximum number of queries in flight, zero for no limit.
    limit_outstanding_queries: u16,

    edns_maximum_udp_payload_size: u16,

    /// Default for the `add_warning_for_bad_dns` extension.
    add_warning_for_bad_dns: bool,

    /// Default for the `return_call_reporting` extension.
    return_call_reporting: bool,

    /// Default for the `dnssec_return_all_statuses` extension.
    dnssec_return_all_statuses: bool,
}

impl Config {
    /// Creates a new, default config.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a config from an option mapping.
    ///
    /// `None` and JSON `null` both give the default config. Anything but a
    /// mapping fails with `InvalidParameter("options")`. All keys are
    /// checked before any value is looked at, so an unknown key is always
    /// reported even if an earlier value is broken.
    pub fn from_options(options: Option<&Value>) -> Result<Self, Error> {
        let mut config = Config::default();
        let map = match options {
            None | Some(Value::Null) => return Ok(config),
            Some(Value::Object(map)) => map,
            Some(_) => {
                debug!("options are not a mapping");
                return Err(Error::InvalidParameter("options".into()));
            }
        };
        let mut keys = Vec::with_capacity(map.len());
        for (name, value) in map {
            match Key::from_name(name) {
                Some(key) => keys.push((key, value)),
                None => {
                    debug!(option = %name, "unknown option");
                    return Err(Error::InvalidParameter(name.clone()));
                }
            }
        }
        for (key, value) in keys {
            config.apply(key, value)?;
        }
        Ok(config)
    }

    /// Changes a single option.
    ///
    /// On error, the config is left unchanged.
    pub fn apply(&mut self, key: Key, value: &Value) -> Result<(), Error> {
        match key {
            Key::Stub => {
                self.resolution_type = if bool_value(key, value)? {
                    Resolution::STUB
                } else {
                    Resolution::RECURSING
                }
            }
            Key::Upstreams | Key::UpstreamRecursiveServers => {
                let list = UpstreamList::parse(key, value)?;
                self.upstream_recursive_servers = list.servers;
                if let Some(suffix) = list.suffix {
                    self.suffix = suffix;
                }
            }
            Key::Timeout => {
                let ms = int_value::<u64>(key, value)?;
                if ms == 0 {
                    return Err(key.invalid());
                }
                self.set_timeout(Duration::from_millis(ms));
            }
            Key::DnssecAllowedSkew => {
                self.dnssec_allowed_skew = int_value(key, value)?
            }
            Key::UseThreads => self.use_threads = bool_value(key, value)?,
            Key::ReturnDnssecStatus => {
                self.return_dnssec_status = bool_value(key, value)?
            }
            Key::DnsTransport => {
                let transport = Transport::from_int(int_value(key, value)?);
                match transport.to_list() {
                    Some(list) => self.dns_transport_list = list,
                    None => return Err(key.invalid()),
                }
            }
            Key::DnsTransportList => {
                let list = known_list(key, value, TransportProto::from_int)?;
                if list.is_empty() {
                    return Err(key.invalid());
                }
                self.dns_transport_list = list;
            }
            Key::FollowRedirects => {
                self.follow_redirects =
                    known_value(key, value, Redirects::from_int)?
            }
            Key::TlsAuthentication => {
                self.tls_authentication =
                    known_value(key, value, TlsAuthentication::from_int)?
            }
            Key::ResolutionType => {
                self.resolution_type =
                    known_value(key, value, Resolution::from_int)?
            }
            Key::AppendName => {
                self.append_name =
                    known_value(key, value, AppendName::from_int)?
            }
            Key::Namespaces => {
                self.namespaces =
                    known_list(key, value, Namespace::from_int)?
            }
            Key::Suffix => match value {
                Value::String(s) => self.suffix = parse_suffix(s),
                _ => return Err(key.invalid()),
            },
            Key::Pinset => self.pinset = parse_pinset(key, value)?,
            Key::TrustAnchor => {
                self.trust_anchor = Some(readable_file(key, value)?)
            }
            Key::DnsRootServer | Key::DnsRootServerAlias => {
                self.dns_root_servers = Some(readable_file(key, value)?)
            }
            Key::EdnsExtendedRcode => {
                self.edns_extended_rcode = int_value(key, value)?
            }
            Key::EdnsVersion => self.edns_version = int_value(key, value)?,
            Key::EdnsDoBit => {
                let bit = int_value::<u8>(key, value)?;
                if bit > 1 {
                    return Err(key.invalid());
                }
                self.edns_do_bit = bit;
            }
            Key::LimitOutstandingQueries => {
                self.limit_outstanding_queries = int_value(key, value)?
            }
            Key::EdnsMaximumUdpPayloadSize => {
                self.set_edns_maximum_udp_payload_size(int_value(key, value)?)
            }
            Key::AddWarningForBadDns => {
                self.add_warning_for_bad_dns = flag_value(key, value)?
            }
            Key::ReturnCallReporting => {
                self.return_call_reporting = flag_value(key, value)?
            }
            Key::DnssecReturnAllStatuses => {
                self.dnssec_return_all_statuses = flag_value(key, value)?
            }
        }
        Ok(())
    }

    /// Checks that the transports can actually be used.
    ///
    /// A recursing engine can't talk TLS to authoritative servers, so a
    /// TLS-only transport list needs stub mode. With hostname
    /// authentication every upstream needs a name to check. As soon as
    /// there is a non-TLS fallback, everything goes.
    pub fn check_transports(&self) -> Result<(), Error> {
        let tls_only = !self.dns_transport_list.is_empty()
            && self
                .dns_transport_list
                .iter()
                .all(|proto| *proto == TransportProto::TLS);
        if !tls_only {
            return Ok(());
        }
        if self.resolution_type != Resolution::STUB {
            return Err(Error::BadContext(
                "TLS-only transport requires stub resolution",
            ));
        }
        if self.tls_authentication == TlsAuthentication::HOSTNAME
            && self
                .upstream_recursive_servers
                .iter()
                .any(|upstream| upstream.tls_auth_name().is_none())
        {
            return Err(Error::BadContext(
                "upstream without TLS authentication name",
            ));
        }
        Ok(())
    }

    /// Returns the resolution type.
    pub fn resolution_type(&self) -> Resolution {
        self.resolution_type
    }

    /// Sets the resolution type.
    pub fn set_resolution_type(&mut self, value: Resolution) {
        self.resolution_type = value
    }

    /// Returns the upstream recursive servers.
    pub fn upstream_recursive_servers(&self) -> &[Upstream] {
        &self.upstream_recursive_servers
    }

    /// Sets the upstream recursive servers.
    pub fn set_upstream_recursive_servers(&mut self, value: Vec<Upstream>) {
        self.upstream_recursive_servers = value
    }

    /// Returns the query timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the query timeout.
    ///
    /// Excessive values are quietly trimmed.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = TIMEOUT.limit(timeout)
    }

    pub fn dnssec_allowed_skew(&self) -> u32 {
        self.dnssec_allowed_skew
    }

    pub fn use_threads(&self) -> bool {
        self.use_threads
    }

    pub fn return_dnssec_status(&self) -> bool {
        self.return_dnssec_status
    }

    /// Returns the transports in order of preference.
    pub fn dns_transport_list(&self) -> &[TransportProto] {
        &self.dns_transport_list
    }

    /// Sets the transports in order of preference.
    pub fn set_dns_transport_list(&mut self, value: Vec<TransportProto>) {
        self.dns_transport_list = value
    }

    pub fn follow_redirects(&self) -> Redirects {
        self.follow_redirects
    }

    pub fn tls_authentication(&self) -> TlsAuthentication {
        self.tls_authentication
    }

    pub fn set_tls_authentication(&mut self, value: TlsAuthentication) {
        self.tls_authentication = value
    }

    pub fn append_name(&self) -> AppendName {
        self.append_name
    }

    pub fn set_append_name(&mut self, value: AppendName) {
        self.append_name = value
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Returns the suffix list.
    pub fn suffix(&self) -> &[String] {
        &self.suffix
    }

    /// Sets the suffix list.
    pub fn set_suffix(&mut self, value: Vec<String>) {
        self.suffix = value
    }

    pub fn pinset(&self) -> &[PubkeyPin] {
        &self.pinset
    }

    pub fn trust_anchor(&self) -> Option<&Path> {
        self.trust_anchor.as_deref()
    }

    pub fn dns_root_servers(&self) -> Option<&Path> {
        self.dns_root_servers.as_deref()
    }

    pub fn edns_extended_rcode(&self) -> u8 {
        self.edns_extended_rcode
    }

    pub fn edns_version(&self) -> u8 {
        self.edns_version
    }

    pub fn edns_do_bit(&self) -> u8 {
        self.edns_do_bit
    }

    pub fn limit_outstanding_queries(&self) -> u16 {
        self.limit_outstanding_queries
    }

    /// Returns the EDNS maximum UDP payload size.
    pub fn edns_maximum_udp_payload_size(&self) -> u16 {
        self.edns_maximum_udp_payload_size
    }

    /// Sets the EDNS maximum UDP payload size.
    ///
    /// Values outside of 512 to 4096 are quietly trimmed.
    pub fn set_edns_maximum_udp_payload_size(&mut self, value: u16) {
        self.edns_maximum_udp_payload_size = EDNS_UDP_PAYLOAD.limit(value)
    }

    pub fn add_warning_for_bad_dns(&self) -> bool {
        self.add_warning_for_bad_dns
    }

    pub fn return_call_reporting(&self) -> bool {
        self.return_call_reporting
    }

    pub fn dnssec_return_all_statuses(&self) -> bool {
        self.dnssec_return_all_statuses
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution_type: Resolution::RECURSING,
            upstream_recursive_servers: Vec::new(),
            timeout: TIMEOUT.default(),
            dnssec_allowed_skew: 0,
            use_threads: false,
            return_dnssec_status: false,
            dns_transport_list: vec![TransportProto::UDP, TransportProto::TCP],
            follow_redirects: Redirects::FOLLOW,
            tls_authentication: TlsAuthentication::NONE,
            append_name: AppendName::ONLY_TO_SINGLE_LABEL_AFTER_FAILURE,
            namespaces: vec![Namespace::DNS],
            suffix: Vec::new(),
            pinset: Vec::new(),
            trust_anchor: None,
            dns_root_servers: None,
            edns_extended_rcode: 0,
            edns_version: 0,
            edns_do_bit: 0,
            limit_outstanding_queries: 0,
            edns_maximum_udp_payload_size: EDNS_UDP_PAYLOAD.default(),
            add_warning_for_bad_dns: false,
            return_call_reporting: false,
            dnssec_return_all_statuses: false,
        }
    }
}

//------------ Value Helpers -------------------------------------------------

/// Returns a strict boolean.
fn bool_value(key: Key, value: &Value) -> Result<bool, Error> {
    value.as_bool().ok_or_else(|| key.invalid())
}

/// Returns a flag given as a boolean or as an extension constant.
pub(crate) fn flag_value(key: Key, value: &Value) -> Result<bool, Error> {
    parse_flag(value).ok_or_else(|| key.invalid())
}

/// Parses a boolean or `Extension::TRUE`/`Extension::FALSE`.
pub(crate) fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(_) => {
            match Extension::from_int(parse_int(value)?) {
                Extension::TRUE => Some(true),
                Extension::FALSE => Some(false),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Parses a non-negative integer that fits into `T`.
pub(crate) fn parse_int<T: TryFrom<u64>>(value: &Value) -> Option<T> {
    let int = match value.as_u64() {
        Some(int) => int,
        None => {
            let float = value.as_f64()?;
            if !(float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64)
            {
                return None;
            }
            float as u64
        }
    };
    T::try_from(int).ok()
}

/// Returns an integer option.
fn int_value<T: TryFrom<u64>>(key: Key, value: &Value) -> Result<T, Error> {
    parse_int(value).ok_or_else(|| key.invalid())
}

/// Returns a registry value that must be one of the well-known ones.
fn known_value<T: Known>(
    key: Key,
    value: &Value,
    from_int: fn(u32) -> T,
) -> Result<T, Error> {
    let res = from_int(int_value(key, value)?);
    if res.known() {
        Ok(res)
    } else {
        Err(key.invalid())
    }
}

/// Returns a sequence of well-known registry values.
fn known_list<T: Known>(
    key: Key,
    value: &Value,
    from_int: fn(u32) -> T,
) -> Result<Vec<T>, Error> {
    value
        .as_array()
        .ok_or_else(|| key.invalid())?
        .iter()
        .map(|item| known_value(key, item, from_int))
        .collect()
}

/// Splits a comma separated suffix list.
pub(crate) fn parse_suffix(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|suffix| !suffix.is_empty())
        .map(Into::into)
        .collect()
}

/// Parses a single pin or a sequence of pins.
fn parse_pinset(key: Key, value: &Value) -> Result<Vec<PubkeyPin>, Error> {
    let parse = |item: &Value| match item {
        Value::String(s) => s.parse::<PubkeyPin>().map_err(|_| {
            debug!(option = %key, "unusable pin '{s}'");
            key.update_fail()
        }),
        _ => Err(key.invalid()),
    };
    match value {
        Value::Array(items) => items.iter().map(parse).collect(),
        item => Ok(vec![parse(item)?]),
    }
}

/// Returns the path of a file that must exist.
fn readable_file(key: Key, value: &Value) -> Result<PathBuf, Error> {
    let path = match value {
        Value::String(path) => PathBuf::from(path),
        _ => return Err(key.invalid()),
    };
    match std::fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(err) => {
            debug!(option = %key, "cannot read {}: {err}", path.display());
            Err(key.update_fail())
        }
    }
}

fn serialize_millis<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(value.as_millis())
}

//------------ Known ---------------------------------------------------------

/// Registry types that know their well-defined values.
trait Known: Copy {
    fn known(self) -> bool;
}

macro_rules! known {
    ( $( $ty:ty ),* ) => {
        $(
            impl Known for $ty {
                fn known(self) -> bool {
                    self.is_known()
                }
            }
        )*
    }
}

known!(AppendName, Namespace, Redirects, Resolution, TlsAuthentication, TransportProto);

//============ Tests =========================================================
