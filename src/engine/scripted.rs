//! An engine that answers from a script.
//!
//! A [`ScriptedEngine`] knows a set of names with their records and a few
//! properties per name: how long answering takes, the DNSSEC status,
//! bad-DNS warnings and outright failures. Queries for anything else get a
//! negative answer. It is cheap to clone and all clones share the script,
//! so a test can keep one to inspect what happened.
//!
//! ```
//! use domain_context::engine::scripted::ScriptedEngine;
//! use domain_context::response::RecordData;
//!
//! let engine = ScriptedEngine::new();
//! engine
//!     .add("example.test", RecordData::A([192, 0, 2, 1].into()))
//!     .add("example.test", RecordData::Aaaa("2001:db8::1".parse().unwrap()));
//! ```

use super::{
    Engine, EngineError, EngineRequest, QueryKind, RawReply, RawResponse,
    ResolveFuture,
};
use crate::base::iana::{Rcode, Rtype};
use crate::consts::{
    AppendName, BadDns, DnssecStatus, NameType, Resolution, RespStatus,
    TransportProto,
};
use crate::context::TransactionId;
use crate::response::{CallReport, Header, Question, Record, RecordData};
use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// The TTL of scripted records.
const TTL: u32 = 3600;

/// How many CNAMEs are followed before giving up.
const MAX_CNAME_CHAIN: usize = 8;

//------------ ScriptedEngine ------------------------------------------------

/// An engine answering from a prepared table.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEngine {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// The script, keyed by normalized name.
    names: RwLock<HashMap<String, NameScript>>,

    /// Transactions currently being resolved.
    in_flight: Mutex<HashSet<TransactionId>>,

    /// Every transaction the context asked to cancel.
    cancelled: Mutex<Vec<TransactionId>>,

    /// Every name and type actually looked up.
    lookups: Mutex<Vec<(String, Rtype)>>,
}

/// What the script says about a name.
#[derive(Clone, Debug, Default)]
struct NameScript {
    records: Vec<RecordData>,
    dnssec_status: Option<DnssecStatus>,
    bad_dns: Vec<BadDns>,
    delay: Option<Duration>,
    failure: Option<EngineError>,
}

impl ScriptedEngine {
    /// Creates an engine with an empty script.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a record for a name.
    pub fn add(&self, name: &str, rdata: RecordData) -> &Self {
        self.script(name, |script| script.records.push(rdata));
        self
    }

    /// Sets the DNSSEC status of all answers for a name.
    ///
    /// Without this, answers are insecure.
    pub fn set_dnssec_status(&self, name: &str, status: DnssecStatus) -> &Self {
        self.script(name, |script| script.dnssec_status = Some(status));
        self
    }

    /// Adds a bad-DNS warning to all answers for a name.
    pub fn add_bad_dns(&self, name: &str, warning: BadDns) -> &Self {
        self.script(name, |script| script.bad_dns.push(warning));
        self
    }

    /// Makes answering queries for a name take some time.
    ///
    /// If the delay isn't shorter than the query's timeout, the query
    /// fails with a timeout once the timeout has passed.
    pub fn set_delay(&self, name: &str, delay: Duration) -> &Self {
        self.script(name, |script| script.delay = Some(delay));
        self
    }

    /// Makes queries for a name fail.
    pub fn set_failure(&self, name: &str, err: EngineError) -> &Self {
        self.script(name, |script| script.failure = Some(err));
        self
    }

    /// Returns the transactions the engine was asked to cancel.
    pub fn cancelled(&self) -> Vec<TransactionId> {
        self.inner.cancelled.lock().clone()
    }

    /// Returns the names and types that were looked up, in order.
    pub fn lookups(&self) -> Vec<(String, Rtype)> {
        self.inner.lookups.lock().clone()
    }

    /// Returns the number of transactions currently being resolved.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    fn script(&self, name: &str, op: impl FnOnce(&mut NameScript)) {
        op(self.inner.names.write().entry(normalize(name)).or_default())
    }

    fn lookup(&self, name: &str) -> Option<NameScript> {
        self.inner.names.read().get(&normalize(name)).cloned()
    }

    /// Resolves a request.
    async fn run(
        &self,
        request: EngineRequest,
    ) -> Result<RawResponse, EngineError> {
        let _guard = InFlight::new(&self.inner, request.id);
        let started = Instant::now();
        let config = &request.config;
        let ext = &request.extensions;

        let (qname, script) = self.candidate(&request);
        let script = script.unwrap_or_default();
        if let Some(delay) = script.delay {
            if delay >= config.timeout() {
                sleep(config.timeout()).await;
                trace!(id = %request.id, "scripted timeout");
                return Err(EngineError::timeout());
            }
            sleep(delay).await;
        }
        if let Some(err) = script.failure.clone() {
            return Err(err);
        }

        let rtypes = if ext.return_both_v4_and_v6
            && (request.kind == QueryKind::Address || request.rtype.is_address())
        {
            vec![Rtype::A, Rtype::AAAA]
        } else {
            vec![request.rtype]
        };

        let stub = config.resolution_type() == Resolution::STUB;
        let upstream = config.upstream_recursive_servers().first();
        let tsig_status = upstream
            .filter(|upstream| stub && upstream.tsig().is_some())
            .map(|_| DnssecStatus::SECURE);
        let dnssec_status =
            script.dnssec_status.unwrap_or(DnssecStatus::INSECURE);
        let exists = !script.records.is_empty();

        let mut replies = Vec::with_capacity(rtypes.len());
        let mut call_reporting = Vec::with_capacity(rtypes.len());
        let mut canonical_name = None;
        for rtype in rtypes {
            self.inner.lookups.lock().push((qname.clone(), rtype));
            let (answer, canonical) = self.answer(&qname, rtype);
            let additional = self.additional(&answer);
            let header = Header {
                id: (u64::from(request.id) & 0xFFFF) as u16,
                rcode: if exists { Rcode::NOERROR } else { Rcode::NXDOMAIN },
                qr: true,
                rd: true,
                ra: true,
                ad: dnssec_status == DnssecStatus::SECURE,
                ..Default::default()
            };
            let question = Question {
                qname: fqdn(&qname),
                qtype: rtype,
                qclass: ext.specify_class,
            };
            call_reporting.push(CallReport {
                query_name: fqdn(&qname),
                query_type: rtype,
                query_to: upstream.filter(|_| stub).map(|u| u.addr()),
                transport: config
                    .dns_transport_list()
                    .first()
                    .copied()
                    .unwrap_or(TransportProto::UDP),
                run_time: started.elapsed(),
            });
            replies.push(RawReply {
                wire: compose(&header, &question, &answer, &additional),
                header,
                question,
                answer,
                authority: Vec::new(),
                additional,
                canonical_name: Some(fqdn(&canonical)),
                answer_type: NameType::DNS,
                dnssec_status: Some(dnssec_status),
                bad_dns: script.bad_dns.clone(),
                tsig_status,
            });
            if canonical_name.is_none() {
                canonical_name = Some(canonical);
            }
        }

        let status = if !exists {
            RespStatus::NO_NAME
        } else if ext.dnssec_return_only_secure
            && dnssec_status != DnssecStatus::SECURE
        {
            if dnssec_status == DnssecStatus::BOGUS {
                RespStatus::ALL_BOGUS_ANSWERS
            } else {
                RespStatus::NO_SECURE_ANSWERS
            }
        } else {
            RespStatus::GOOD
        };

        Ok(RawResponse {
            status,
            answer_type: NameType::DNS,
            canonical_name: canonical_name.map(|name| fqdn(&name)),
            replies,
            call_reporting,
        })
    }

    /// Picks the name to answer for, applying the suffix list.
    fn candidate(&self, request: &EngineRequest) -> (String, Option<NameScript>) {
        let name = normalize(&request.name);
        let config = &request.config;
        let mut candidates = vec![name.clone()];
        if config.append_name() != AppendName::NEVER {
            let suffixed = config
                .suffix()
                .iter()
                .map(|suffix| format!("{}.{}", name, normalize(suffix)));
            match config.append_name() {
                AppendName::ALWAYS | AppendName::TO_SINGLE_LABEL_FIRST => {
                    candidates = suffixed.chain(candidates).collect();
                }
                _ => candidates.extend(suffixed),
            }
        }
        for candidate in candidates {
            if let Some(script) = self.lookup(&candidate) {
                return (candidate, Some(script));
            }
        }
        (name, None)
    }

    /// Collects the answer records, following CNAMEs.
    ///
    /// Returns the records and the canonical name.
    fn answer(&self, qname: &str, rtype: Rtype) -> (Vec<Record>, String) {
        let mut res = Vec::new();
        let mut name = qname.to_string();
        for _ in 0..MAX_CNAME_CHAIN {
            let records = match self.lookup(&name) {
                Some(script) => script.records,
                None => break,
            };
            let mut target = None;
            for rdata in records {
                if rdata.rtype() == rtype || rtype == Rtype::ANY {
                    res.push(Record::new(fqdn(&name), TTL, rdata));
                } else if let RecordData::Cname(ref alias) = rdata {
                    target = Some(normalize(alias));
                    res.push(Record::new(fqdn(&name), TTL, rdata));
                }
            }
            match target {
                Some(target) => name = target,
                None => break,
            }
        }
        (res, name)
    }

    /// Collects the addresses of SRV and MX targets.
    fn additional(&self, answer: &[Record]) -> Vec<Record> {
        let mut res = Vec::new();
        for record in answer {
            let target = match record.rdata {
                RecordData::Srv { ref target, .. } => target,
                RecordData::Mx { ref exchange, .. } => exchange,
                _ => continue,
            };
            if let Some(script) = self.lookup(target) {
                res.extend(
                    script
                        .records
                        .into_iter()
                        .filter(|rdata| rdata.rtype().is_address())
                        .map(|rdata| Record::new(fqdn(target), TTL, rdata)),
                );
            }
        }
        res
    }
}

impl Engine for ScriptedEngine {
    fn resolve(&self, request: EngineRequest) -> ResolveFuture<'_> {
        Box::pin(self.run(request))
    }

    fn cancel_pending(&self, id: TransactionId) -> bool {
        self.inner.cancelled.lock().push(id);
        self.inner.in_flight.lock().contains(&id)
    }
}

//------------ InFlight ------------------------------------------------------

/// Marks a transaction as being resolved while alive.
struct InFlight<'a> {
    inner: &'a Inner,
    id: TransactionId,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a Inner, id: TransactionId) -> Self {
        inner.in_flight.lock().insert(id);
        InFlight { inner, id }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.lock().remove(&self.id);
    }
}

//------------ Helper Functions ----------------------------------------------

/// Returns the lower case name without the final dot.
fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Returns the name with a final dot.
fn fqdn(name: &str) -> String {
    format!("{}.", name.trim_end_matches('.'))
}

/// Composes a reply in wire format.
///
/// Names are not compressed.
fn compose(
    header: &Header,
    question: &Question,
    answer: &[Record],
    additional: &[Record],
) -> Bytes {
    let mut buf = BytesMut::with_capacity(512);
    let mut flags = u16::from(header.opcode.to_int() & 0x0F) << 11
        | u16::from(header.rcode.to_int() & 0x0F);
    for (set, bit) in [
        (header.qr, 0x8000),
        (header.aa, 0x0400),
        (header.tc, 0x0200),
        (header.rd, 0x0100),
        (header.ra, 0x0080),
        (header.ad, 0x0020),
        (header.cd, 0x0010),
    ] {
        if set {
            flags |= bit
        }
    }
    buf.put_u16(header.id);
    buf.put_u16(flags);
    buf.put_u16(1);
    buf.put_u16(count(answer.len()));
    buf.put_u16(0);
    buf.put_u16(count(additional.len()));

    put_name(&mut buf, &question.qname);
    buf.put_u16(question.qtype.to_int());
    buf.put_u16(question.qclass.to_int());

    for record in answer.iter().chain(additional) {
        put_name(&mut buf, &record.name);
        buf.put_u16(record.rtype.to_int());
        buf.put_u16(record.class.to_int());
        buf.put_u32(record.ttl);
        let mut rdata = BytesMut::new();
        match record.rdata {
            RecordData::A(addr) => rdata.put_slice(&addr.octets()),
            RecordData::Aaaa(addr) => rdata.put_slice(&addr.octets()),
            RecordData::Cname(ref name)
            | RecordData::Ns(ref name)
            | RecordData::Ptr(ref name) => put_name(&mut rdata, name),
            RecordData::Mx {
                preference,
                ref exchange,
            } => {
                rdata.put_u16(preference);
                put_name(&mut rdata, exchange);
            }
            RecordData::Srv {
                priority,
                weight,
                port,
                ref target,
            } => {
                rdata.put_u16(priority);
                rdata.put_u16(weight);
                rdata.put_u16(port);
                put_name(&mut rdata, target);
            }
            RecordData::Txt(ref strings) => {
                for s in strings {
                    let s = &s.as_bytes()[..s.len().min(255)];
                    rdata.put_u8(s.len() as u8);
                    rdata.put_slice(s);
                }
            }
            RecordData::Unknown { ref data, .. } => rdata.put_slice(data),
        }
        buf.put_u16(count(rdata.len()));
        buf.put_slice(&rdata);
    }
    buf.freeze()
}

/// Appends an uncompressed domain name.
fn put_name(buf: &mut BytesMut, name: &str) {
    for label in name.split('.').filter(|label| !label.is_empty()) {
        let label = &label.as_bytes()[..label.len().min(63)];
        buf.put_u8(label.len() as u8);
        buf.put_slice(label);
    }
    buf.put_u8(0);
}

fn count(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

//============ Tests =========================================================
