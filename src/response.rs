//! Responses delivered to transaction callbacks.
//!
//! The resolution engine hands back a [`RawResponse`] that carries
//! everything it learned. [`shape`] turns that into the [`Response`] the
//! application sees: it derives the convenience fields for address and
//! service lookups and drops the per-reply fields the query's extensions
//! didn't ask for. Nothing else is added or removed.
//!
//! All types here implement `Serialize`, so a response can be printed as
//! JSON via `serde_json`.
//!
//! [`RawResponse`]: crate::engine::RawResponse

use crate::base::iana::{Class, Opcode, Rcode, Rtype};
use crate::consts::{BadDns, DnssecStatus, NameType, RespStatus, TransportProto};
use crate::engine::{QueryKind, RawReply, RawResponse};
use crate::options::Extensions;
use crate::utils::base64;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

//------------ Response ------------------------------------------------------

/// The outcome of a successful transaction.
#[derive(Clone, Debug, Serialize)]
pub struct Response {
    /// The overall status.
    status: RespStatus,

    /// The kind of name the answer carries.
    answer_type: NameType,

    /// The name the query ended up at after following redirects.
    canonical_name: Option<String>,

    /// The addresses found by an address lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    just_address_answers: Option<Vec<IpAddr>>,

    /// The servers found by a service lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    srv_addresses: Option<Vec<SrvAddress>>,

    /// The wire format of each reply.
    #[serde(serialize_with = "serialize_wire")]
    replies_full: Vec<Bytes>,

    /// The parsed form of each reply.
    replies_tree: Vec<Reply>,

    /// What the engine did to get here.
    #[serde(skip_serializing_if = "Option::is_none")]
    call_reporting: Option<Vec<CallReport>>,
}

impl Response {
    pub fn status(&self) -> RespStatus {
        self.status
    }

    pub fn answer_type(&self) -> NameType {
        self.answer_type
    }

    pub fn canonical_name(&self) -> Option<&str> {
        self.canonical_name.as_deref()
    }

    /// Returns the addresses of an address lookup in engine order.
    ///
    /// This is `None` for lookups that aren't about addresses.
    pub fn just_address_answers(&self) -> Option<&[IpAddr]> {
        self.just_address_answers.as_deref()
    }

    /// Returns the servers of a service lookup.
    pub fn srv_addresses(&self) -> Option<&[SrvAddress]> {
        self.srv_addresses.as_deref()
    }

    pub fn replies_full(&self) -> &[Bytes] {
        &self.replies_full
    }

    pub fn replies_tree(&self) -> &[Reply] {
        &self.replies_tree
    }

    pub fn call_reporting(&self) -> Option<&[CallReport]> {
        self.call_reporting.as_deref()
    }
}

//------------ Reply ---------------------------------------------------------

/// A single parsed reply.
#[derive(Clone, Debug, Serialize)]
pub struct Reply {
    header: Header,
    question: Question,
    answer: Vec<Record>,
    authority: Vec<Record>,
    additional: Vec<Record>,
    canonical_name: Option<String>,
    answer_type: NameType,

    /// Only present if a DNSSEC status was asked for.
    #[serde(skip_serializing_if = "Option::is_none")]
    dnssec_status: Option<DnssecStatus>,

    /// Only present if warnings were asked for and there are some.
    #[serde(skip_serializing_if = "Option::is_none")]
    bad_dns: Option<Vec<BadDns>>,

    /// Present whenever the upstream was asked with a TSIG key.
    #[serde(skip_serializing_if = "Option::is_none")]
    tsig_status: Option<DnssecStatus>,
}

impl Reply {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn answer(&self) -> &[Record] {
        &self.answer
    }

    pub fn authority(&self) -> &[Record] {
        &self.authority
    }

    pub fn additional(&self) -> &[Record] {
        &self.additional
    }

    pub fn canonical_name(&self) -> Option<&str> {
        self.canonical_name.as_deref()
    }

    pub fn answer_type(&self) -> NameType {
        self.answer_type
    }

    pub fn dnssec_status(&self) -> Option<DnssecStatus> {
        self.dnssec_status
    }

    pub fn bad_dns(&self) -> Option<&[BadDns]> {
        self.bad_dns.as_deref()
    }

    pub fn tsig_status(&self) -> Option<DnssecStatus> {
        self.tsig_status
    }
}

//------------ Header --------------------------------------------------------

/// The header section of a reply.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Header {
    pub id: u16,
    pub opcode: Opcode,
    pub rcode: Rcode,
    pub qr: bool,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub ad: bool,
    pub cd: bool,
}

//------------ Question ------------------------------------------------------

/// The question section of a reply.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Question {
    pub qname: String,
    pub qtype: Rtype,
    pub qclass: Class,
}

//------------ Record --------------------------------------------------------

/// A resource record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Record {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: Rtype,
    pub class: Class,
    pub ttl: u32,
    pub rdata: RecordData,
}

impl Record {
    /// Creates an IN record, taking the type from the data.
    pub fn new(name: impl Into<String>, ttl: u32, rdata: RecordData) -> Self {
        Record {
            name: name.into(),
            rtype: rdata.rtype(),
            class: Class::IN,
            ttl,
            rdata,
        }
    }

    /// Returns the address if this is an address record.
    pub fn addr(&self) -> Option<IpAddr> {
        match self.rdata {
            RecordData::A(addr) => Some(addr.into()),
            RecordData::Aaaa(addr) => Some(addr.into()),
            _ => None,
        }
    }
}

//------------ RecordData ----------------------------------------------------

/// The data of a resource record.
///
/// Types without a variant of their own are kept in their wire format.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Ns(String),
    Ptr(String),
    Mx {
        preference: u16,
        exchange: String,
    },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Txt(Vec<String>),
    Unknown {
        rtype: Rtype,
        #[serde(serialize_with = "serialize_bytes")]
        data: Bytes,
    },
}

impl RecordData {
    /// Returns the record type of the data.
    pub fn rtype(&self) -> Rtype {
        match self {
            RecordData::A(_) => Rtype::A,
            RecordData::Aaaa(_) => Rtype::AAAA,
            RecordData::Cname(_) => Rtype::CNAME,
            RecordData::Ns(_) => Rtype::NS,
            RecordData::Ptr(_) => Rtype::PTR,
            RecordData::Mx { .. } => Rtype::MX,
            RecordData::Srv { .. } => Rtype::SRV,
            RecordData::Txt(_) => Rtype::TXT,
            RecordData::Unknown { rtype, .. } => *rtype,
        }
    }
}

//------------ SrvAddress ----------------------------------------------------

/// A server found by a service lookup.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SrvAddress {
    pub domain_name: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,

    /// The target's addresses from the additional sections.
    pub addresses: Vec<IpAddr>,
}

//------------ CallReport ----------------------------------------------------

/// One query the engine sent on behalf of a transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CallReport {
    pub query_name: String,
    pub query_type: Rtype,
    pub query_to: Option<IpAddr>,
    pub transport: TransportProto,
    #[serde(rename = "run_time/ms", serialize_with = "serialize_millis")]
    pub run_time: Duration,
}

//------------ shape ---------------------------------------------------------

/// Turns the engine's output into the response for the application.
pub fn shape(
    raw: RawResponse,
    kind: QueryKind,
    rtype: Rtype,
    extensions: &Extensions,
) -> Response {
    let just_address_answers = match kind {
        QueryKind::Address => Some(address_answers(&raw.replies)),
        QueryKind::General if rtype.is_address() => {
            Some(address_answers(&raw.replies))
        }
        _ => None,
    };
    let srv_addresses = match kind {
        QueryKind::Service => Some(srv_addresses(&raw.replies)),
        _ => None,
    };
    let call_reporting = if extensions.return_call_reporting {
        Some(raw.call_reporting)
    } else {
        None
    };

    let mut replies_full = Vec::with_capacity(raw.replies.len());
    let mut replies_tree = Vec::with_capacity(raw.replies.len());
    for reply in raw.replies {
        replies_full.push(reply.wire);
        replies_tree.push(Reply {
            header: reply.header,
            question: reply.question,
            answer: reply.answer,
            authority: reply.authority,
            additional: reply.additional,
            canonical_name: reply.canonical_name,
            answer_type: reply.answer_type,
            dnssec_status: reply
                .dnssec_status
                .filter(|_| extensions.wants_dnssec_status()),
            bad_dns: Some(reply.bad_dns).filter(|bad_dns| {
                extensions.add_warning_for_bad_dns && !bad_dns.is_empty()
            }),
            tsig_status: reply.tsig_status,
        })
    }

    Response {
        status: raw.status,
        answer_type: raw.answer_type,
        canonical_name: raw.canonical_name,
        just_address_answers,
        srv_addresses,
        replies_full,
        replies_tree,
        call_reporting,
    }
}

/// Collects the addresses in all answer sections.
fn address_answers(replies: &[RawReply]) -> Vec<IpAddr> {
    replies
        .iter()
        .flat_map(|reply| reply.answer.iter())
        .filter_map(Record::addr)
        .collect()
}

/// Pairs every SRV answer with the addresses of its target.
fn srv_addresses(replies: &[RawReply]) -> Vec<SrvAddress> {
    let mut res = Vec::new();
    for record in replies.iter().flat_map(|reply| reply.answer.iter()) {
        if let RecordData::Srv {
            priority,
            weight,
            port,
            ref target,
        } = record.rdata
        {
            let addresses = replies
                .iter()
                .flat_map(|reply| reply.additional.iter())
                .filter(|additional| same_name(&additional.name, target))
                .filter_map(Record::addr)
                .collect();
            res.push(SrvAddress {
                domain_name: target.clone(),
                port,
                priority,
                weight,
                addresses,
            })
        }
    }
    res
}

/// Compares two domain names ignoring case and a final dot.
pub(crate) fn same_name(left: &str, right: &str) -> bool {
    left.trim_end_matches('.')
        .eq_ignore_ascii_case(right.trim_end_matches('.'))
}

//------------ Serialization Helpers -----------------------------------------

fn serialize_wire<S: Serializer>(
    replies: &[Bytes],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(replies.iter().map(base64::encode_string))
}

fn serialize_bytes<S: Serializer>(
    data: &Bytes,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::encode_string(data))
}

fn serialize_millis<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(value.as_millis())
}

//============ Tests =========================================================
