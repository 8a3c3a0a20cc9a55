//! Behaviour of contexts and their transactions.

use domain_context::base::iana::Rtype;
use domain_context::consts::{
    BadDns, CallbackType, DnssecStatus, ReturnCode, RespStatus,
    TransportProto,
};
use domain_context::engine::scripted::ScriptedEngine;
use domain_context::engine::EngineError;
use domain_context::logging::init_logging;
use domain_context::options::Upstream;
use domain_context::response::{RecordData, Response};
use domain_context::{Context, Error, TransactionId};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep, Instant};

type Outcome = (Result<Response, Error>, TransactionId);

//------------ Helpers -------------------------------------------------------

/// Returns an engine knowing a handful of names.
fn engine() -> ScriptedEngine {
    let engine = ScriptedEngine::new();
    engine
        .add("getdnsapi.net", RecordData::A([185, 49, 141, 37].into()))
        .add(
            "getdnsapi.net",
            RecordData::Aaaa("2a04:b900:0:100::37".parse().unwrap()),
        )
        .add("example.test", RecordData::A([192, 0, 2, 1].into()))
        .add("slow.test", RecordData::A([192, 0, 2, 2].into()))
        .set_delay("slow.test", Duration::from_secs(2))
        .add(
            "_xmpp-server._tcp.example.test",
            RecordData::Srv {
                priority: 5,
                weight: 0,
                port: 5269,
                target: "xmpp.example.test.".into(),
            },
        )
        .add("xmpp.example.test", RecordData::A([192, 0, 2, 5].into()))
        .add(
            "xmpp.example.test",
            RecordData::Aaaa("2001:db8::5".parse().unwrap()),
        )
        .add(
            "37.141.49.185.in-addr.arpa",
            RecordData::Ptr("getdnsapi.net.".into()),
        )
        .add("secure.test", RecordData::A([192, 0, 2, 3].into()))
        .set_dnssec_status("secure.test", DnssecStatus::SECURE)
        .add("1.2.test", RecordData::A([192, 0, 2, 4].into()))
        .add_bad_dns("1.2.test", BadDns::ALL_NUMERIC_LABEL)
        .add("broken.test", RecordData::A([192, 0, 2, 6].into()))
        .set_failure("broken.test", EngineError::new(1, "generic error"));
    engine
}

fn create(engine: &ScriptedEngine, options: Value) -> Context {
    init_logging();
    Context::create(engine.clone(), Some(&options)).unwrap()
}

fn outcomes() -> (UnboundedSender<Outcome>, UnboundedReceiver<Outcome>) {
    mpsc::unbounded_channel()
}

/// Returns a callback forwarding the outcome to `tx`.
fn sink(
    tx: &UnboundedSender<Outcome>,
) -> impl FnOnce(Result<Response, Error>, TransactionId) + Send + 'static {
    let tx = tx.clone();
    move |res, id| {
        let _ = tx.send((res, id));
    }
}

async fn next(rx: &mut UnboundedReceiver<Outcome>) -> Outcome {
    rx.recv().await.expect("outcome channel closed")
}

//------------ Lifecycle -----------------------------------------------------

#[tokio::test]
async fn create_and_destroy() {
    let ctx = Context::create(engine(), None).unwrap();
    assert!(!ctx.is_destroyed());
    assert!(ctx.destroy());
    assert!(ctx.is_destroyed());
    assert!(!ctx.destroy());
    assert!(!ctx.destroy());

    let ctx = create(
        &engine(),
        json!({
            "stub": true,
            "upstream_recursive_servers": [["185.49.141.37", 53]],
            "timeout": 10000,
            "return_dnssec_status": true,
            "dns_transport": 541,
        }),
    );
    assert_eq!(ctx.config().timeout(), Duration::from_secs(10));
    assert_eq!(ctx.config().dns_transport_list(), &[TransportProto::UDP]);
    assert!(ctx.destroy());
    assert!(!ctx.destroy());
}

#[tokio::test]
async fn unknown_option() {
    let err = Context::create(
        engine(),
        Some(&json!({"timeout": 1000, "mispeled_option": true})),
    )
    .unwrap_err();
    assert_eq!(err, Error::InvalidParameter("mispeled_option".into()));
    assert_eq!(err.msg(), "mispeled_option");
    assert_eq!(err.code(), ReturnCode::INVALID_PARAMETER.to_int());
}

#[tokio::test]
async fn invalid_options() {
    for (options, key) in [
        (json!({"timeout": "5000"}), "timeout"),
        (json!({"resolution_type": true}), "resolution_type"),
        (json!({"upstream_recursive_servers": "8.8.8.8"}), "upstream_recursive_servers"),
        (json!({"dns_transport_list": {"udp": true}}), "dns_transport_list"),
        (json!(["timeout"]), "options"),
    ] {
        assert_eq!(
            Context::create(engine(), Some(&options)).unwrap_err(),
            Error::InvalidParameter(key.into())
        );
    }
}

#[tokio::test]
async fn destroyed_context() {
    let ctx = Context::create(engine(), None).unwrap();
    let (tx, mut rx) = outcomes();
    let id = ctx.address("example.test", None, sink(&tx)).unwrap();
    let _ = next(&mut rx).await;

    assert!(ctx.destroy());
    assert!(matches!(
        ctx.address("example.test", None, sink(&tx)),
        Err(Error::BadContext(_))
    ));
    assert!(matches!(
        ctx.set_option("timeout", &json!(1000)),
        Err(Error::BadContext(_))
    ));
    assert!(matches!(
        ctx.set_timeout(Duration::from_secs(1)),
        Err(Error::BadContext(_))
    ));

    // Being destroyed trumps any problem with the arguments.
    assert!(matches!(
        ctx.general("", Rtype::A, None, sink(&tx)),
        Err(Error::BadContext(_))
    ));
    assert!(matches!(
        ctx.hostname("not an address", None, sink(&tx)),
        Err(Error::BadContext(_))
    ));
    assert!(matches!(
        ctx.set_option("mispeled_option", &json!(true)),
        Err(Error::BadContext(_))
    ));
    assert!(!ctx.cancel(id));
}

#[tokio::test(start_paused = true)]
async fn destroy_cancels_pending() {
    let engine = engine();
    let ctx = create(&engine, json!({}));
    let (tx, mut rx) = outcomes();
    let mut ids = HashSet::new();
    for _ in 0..3 {
        ids.insert(ctx.address("slow.test", None, sink(&tx)).unwrap());
    }
    assert_eq!(ctx.pending(), 3);

    assert!(ctx.destroy());
    assert_eq!(ctx.pending(), 0);
    for _ in 0..3 {
        let (res, id) = next(&mut rx).await;
        assert_eq!(res.unwrap_err(), Error::Cancelled);
        assert!(ids.remove(&id));
    }
    assert_eq!(engine.cancelled().len(), 3);

    sleep(Duration::from_secs(10)).await;
    assert!(rx.try_recv().is_err());
    assert!(!ctx.destroy());
}

//------------ Queries -------------------------------------------------------

#[tokio::test]
async fn address_lookup() {
    let ctx = create(
        &engine(),
        json!({"timeout": 5000, "upstreams": ["8.8.8.8"]}),
    );
    let (tx, mut rx) = outcomes();
    let id = ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    assert_ne!(id.to_u64(), 0);

    let (res, got) = next(&mut rx).await;
    assert_eq!(got, id);
    let response = res.unwrap();
    assert_eq!(response.status(), RespStatus::GOOD);
    let addrs = response.just_address_answers().unwrap();
    assert_eq!(
        addrs,
        [
            "185.49.141.37".parse::<std::net::IpAddr>().unwrap(),
            "2a04:b900:0:100::37".parse().unwrap(),
        ]
    );
    assert_eq!(response.replies_full().len(), addrs.len());
    assert_eq!(response.replies_tree().len(), addrs.len());
    assert!(!ctx.is_pending(id));
    assert!(ctx.destroy());
}

#[tokio::test]
async fn general_lookup() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.general("getdnsapi.net", Rtype::AAAA, None, sink(&tx))
        .unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.replies_tree().len(), 1);
    let reply = &response.replies_tree()[0];
    assert_eq!(reply.question().qtype, Rtype::AAAA);
    assert_eq!(reply.answer().len(), 1);
    assert_eq!(reply.answer()[0].rtype, Rtype::AAAA);
    assert_eq!(response.just_address_answers().map(<[_]>::len), Some(1));

    ctx.general("getdnsapi.net", Rtype::TXT, None, sink(&tx))
        .unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert!(response.just_address_answers().is_none());
    assert!(response.replies_tree()[0].answer().is_empty());

    ctx.general("nowhere.test", Rtype::A, None, sink(&tx))
        .unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.status(), RespStatus::NO_NAME);
}

#[tokio::test]
async fn service_lookup() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.service("_xmpp-server._tcp.example.test", None, sink(&tx))
        .unwrap();
    let response = next(&mut rx).await.0.unwrap();
    let srv = response.srv_addresses().unwrap();
    assert_eq!(srv.len(), 1);
    assert_eq!(srv[0].domain_name, "xmpp.example.test.");
    assert_eq!(srv[0].port, 5269);
    assert_eq!(srv[0].priority, 5);
    assert_eq!(
        srv[0].addresses,
        [
            "192.0.2.5".parse::<std::net::IpAddr>().unwrap(),
            "2001:db8::5".parse().unwrap(),
        ]
    );
}

#[tokio::test]
async fn hostname_lookup() {
    let engine = engine();
    let ctx = create(&engine, json!({}));
    let (tx, mut rx) = outcomes();
    ctx.hostname("185.49.141.37", None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    let reply = &response.replies_tree()[0];
    assert_eq!(reply.question().qtype, Rtype::PTR);
    assert_eq!(
        reply.answer()[0].rdata,
        RecordData::Ptr("getdnsapi.net.".into())
    );

    assert_eq!(
        ctx.hostname("getdnsapi.net", None, sink(&tx)),
        Err(Error::BadDomainName("getdnsapi.net".into()))
    );
}

#[tokio::test]
#[allow(deprecated)]
async fn old_names() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.get_address("getdnsapi.net", None, sink(&tx)).unwrap();
    assert!(next(&mut rx).await.0.unwrap().just_address_answers().is_some());
    ctx.lookup("getdnsapi.net", Rtype::A, None, sink(&tx)).unwrap();
    assert!(next(&mut rx).await.0.is_ok());
    ctx.get_service("_xmpp-server._tcp.example.test", None, sink(&tx))
        .unwrap();
    assert!(next(&mut rx).await.0.unwrap().srv_addresses().is_some());
    ctx.get_hostname("185.49.141.37", None, sink(&tx)).unwrap();
    assert!(next(&mut rx).await.0.is_ok());
}

#[tokio::test]
async fn bad_names() {
    let ctx = create(&engine(), json!({}));
    let (tx, _rx) = outcomes();
    for name in ["", "a..b"] {
        assert_eq!(
            ctx.general(name, Rtype::A, None, sink(&tx)),
            Err(Error::BadDomainName(name.into()))
        );
    }
    assert_eq!(ctx.pending(), 0);
}

#[tokio::test]
async fn engine_failure() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.address("broken.test", None, sink(&tx)).unwrap();
    let err = next(&mut rx).await.0.unwrap_err();
    assert_eq!(err.code(), 1);
    assert_eq!(err.msg(), "generic error");
}

#[tokio::test]
async fn json_output() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value["just_address_answers"],
        json!(["185.49.141.37", "2a04:b900:0:100::37"])
    );
    assert_eq!(value["status"], json!(900));
    assert_eq!(value["replies_full"].as_array().unwrap().len(), 2);
}

//------------ Cancellation --------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_before_completion() {
    let engine = engine();
    let ctx = create(&engine, json!({}));
    let (tx, mut rx) = outcomes();
    let id = ctx.address("slow.test", None, sink(&tx)).unwrap();
    assert!(ctx.is_pending(id));
    assert!(ctx.cancel(id));
    assert!(!ctx.cancel(id));
    assert!(!ctx.is_pending(id));

    let (res, got) = next(&mut rx).await;
    assert_eq!(got, id);
    let err = res.unwrap_err();
    assert_eq!(err, Error::Cancelled);
    assert_eq!(err.code(), CallbackType::CANCEL.to_int());
    assert_eq!(engine.cancelled(), [id]);

    // Nothing else arrives, not even after the engine would have answered.
    sleep(Duration::from_secs(10)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(engine.in_flight(), 0);
}

#[tokio::test]
async fn cancel_after_completion() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    let id = ctx.address("example.test", None, sink(&tx)).unwrap();
    assert!(next(&mut rx).await.0.is_ok());
    assert!(!ctx.cancel(id));
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn cancel_foreign_ids() {
    let one = create(&engine(), json!({}));
    let two = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    let id = two.address("slow.test", None, sink(&tx)).unwrap();
    assert!(!one.cancel(id));
    assert!(two.cancel(id));
    assert_eq!(next(&mut rx).await.0.unwrap_err(), Error::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_races_completion() {
    // Whichever way each race goes, every callback runs exactly once and
    // a successful cancel always means a cancelled outcome.
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    let mut cancelled = HashSet::new();
    let mut ids = Vec::new();
    for _ in 0..200 {
        let id = ctx.address("example.test", None, sink(&tx)).unwrap();
        ids.push(id);
        if ctx.cancel(id) {
            cancelled.insert(id);
        }
    }
    let mut seen = HashSet::new();
    for _ in 0..ids.len() {
        let (res, id) = next(&mut rx).await;
        assert!(seen.insert(id));
        assert_eq!(cancelled.contains(&id), res.is_err());
    }
    sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

//------------ Concurrency ---------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_queries() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    let names = ["getdnsapi.net", "example.test", "xmpp.example.test"];
    let mut ids = HashSet::new();
    for i in 0..30 {
        ids.insert(ctx.address(names[i % 3], None, sink(&tx)).unwrap());
    }
    assert_eq!(ids.len(), 30);
    for _ in 0..30 {
        let (res, id) = next(&mut rx).await;
        assert!(ids.remove(&id));
        assert!(!res.unwrap().just_address_answers().unwrap().is_empty());
    }
    assert_eq!(ctx.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_contexts() {
    let engine = engine();
    let (tx, mut rx) = outcomes();
    let mut contexts = Vec::new();
    let mut ids = HashSet::new();
    for _ in 0..10 {
        let ctx = create(&engine, json!({"timeout": 5000}));
        ids.insert(ctx.address("getdnsapi.net", None, sink(&tx)).unwrap());
        contexts.push(ctx);
    }
    assert_eq!(ids.len(), 10);
    for _ in 0..10 {
        let (res, id) = next(&mut rx).await;
        assert!(ids.remove(&id));
        assert_eq!(res.unwrap().just_address_answers().unwrap().len(), 2);
    }
    for ctx in contexts {
        assert!(ctx.destroy());
    }
}

#[tokio::test]
async fn ids_come_before_callbacks() {
    // On a current-thread runtime the caller always has the ID before the
    // callback runs.
    let ctx = create(&engine(), json!({}));
    let issued = Arc::new(Mutex::new(Vec::new()));
    let (tx, mut rx) = mpsc::unbounded_channel();
    for name in ["example.test", "getdnsapi.net", "unknown.test"] {
        let seen = issued.clone();
        let tx = tx.clone();
        let id = ctx
            .address(name, None, move |_, id| {
                let _ = tx.send(seen.lock().unwrap().contains(&id));
            })
            .unwrap();
        issued.lock().unwrap().push(id);
    }
    for _ in 0..3 {
        assert!(rx.recv().await.unwrap());
    }
}

#[tokio::test]
async fn callbacks_may_use_the_context() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    let inner = ctx.clone();
    let inner_tx = tx.clone();
    ctx.address("example.test", None, move |res, _| {
        assert!(res.is_ok());
        inner
            .address("getdnsapi.net", None, sink(&inner_tx))
            .unwrap();
    })
    .unwrap();
    assert!(next(&mut rx).await.0.is_ok());

    let inner = ctx.clone();
    ctx.address("example.test", None, move |_, _| {
        assert!(inner.destroy());
    })
    .unwrap();
    while !ctx.is_destroyed() {
        tokio::task::yield_now().await;
    }
}

//------------ Timeouts and Options ------------------------------------------

#[tokio::test(start_paused = true)]
async fn timeout() {
    let ctx = create(&engine(), json!({"timeout": 1000}));
    let (tx, mut rx) = outcomes();
    let started = Instant::now();
    ctx.address("slow.test", None, sink(&tx)).unwrap();
    let err = next(&mut rx).await.0.unwrap_err();
    assert_eq!(err, Error::Timeout);
    assert_eq!(err.code(), CallbackType::TIMEOUT.to_int());
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn changes_leave_pending_transactions_alone() {
    let ctx = create(&engine(), json!({"timeout": 5000}));
    let (tx, mut rx) = outcomes();
    let before = ctx.address("slow.test", None, sink(&tx)).unwrap();
    ctx.set_timeout(Duration::from_secs(1)).unwrap();
    let after = ctx.address("slow.test", None, sink(&tx)).unwrap();

    let (res, id) = next(&mut rx).await;
    assert_eq!(id, after);
    assert_eq!(res.unwrap_err(), Error::Timeout);
    let (res, id) = next(&mut rx).await;
    assert_eq!(id, before);
    assert!(res.is_ok());

    ctx.set_option("timeout", &json!(3000)).unwrap();
    assert_eq!(ctx.config().timeout(), Duration::from_secs(3));
    assert_eq!(
        ctx.set_option("timeout", &json!("3000")),
        Err(Error::InvalidParameter("timeout".into()))
    );
    assert_eq!(
        ctx.set_option("mispeled_option", &json!(true)),
        Err(Error::InvalidParameter("mispeled_option".into()))
    );
    assert_eq!(ctx.config().timeout(), Duration::from_secs(3));
}

#[tokio::test]
async fn suffix() {
    let engine = engine();
    let ctx = create(&engine, json!({"suffix": "nowhere,test"}));
    let (tx, mut rx) = outcomes();
    ctx.general("example", Rtype::A, None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.status(), RespStatus::GOOD);
    assert_eq!(
        response.replies_tree()[0].question().qname,
        "example.test."
    );

    ctx.set_suffix(Vec::new()).unwrap();
    ctx.general("example", Rtype::A, None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.status(), RespStatus::NO_NAME);

    let ctx = create(
        &engine,
        json!({"upstream_recursive_servers": ["8.8.8.8", "~test"]}),
    );
    ctx.general("example", Rtype::A, None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.status(), RespStatus::GOOD);
}

#[tokio::test]
async fn tls_transports() {
    let engine = engine();
    let (tx, mut rx) = outcomes();

    // TLS only needs stub mode.
    let ctx = create(&engine, json!({"dns_transport_list": [1202]}));
    ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    assert!(matches!(
        next(&mut rx).await.0,
        Err(Error::BadContext(_))
    ));

    // Unless there is a fallback.
    let ctx = create(&engine, json!({"dns_transport_list": [1202, 1201]}));
    ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    assert!(next(&mut rx).await.0.is_ok());

    let ctx = create(
        &engine,
        json!({
            "resolution_type": 520,
            "dns_transport_list": [1202],
            "tls_authentication": 1301,
            "upstream_recursive_servers": [
                ["185.49.141.37", 853, "getdnsapi.net"],
            ],
        }),
    );
    ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.just_address_answers().unwrap().len(), 2);

    // Hostname authentication needs a name for every upstream.
    ctx.set_upstream_recursive_servers(vec![Upstream::new(
        "185.49.141.38".parse().unwrap(),
    )])
    .unwrap();
    ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    assert!(matches!(
        next(&mut rx).await.0,
        Err(Error::BadContext(_))
    ));
}

//------------ Extensions ----------------------------------------------------

#[tokio::test]
async fn bad_extensions() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    let ext = json!({"dnssec_return_all_statuses": "yes"});
    let id = ctx.address("getdnsapi.net", Some(&ext), sink(&tx)).unwrap();
    let (res, got) = next(&mut rx).await;
    assert_eq!(got, id);
    let err = res.unwrap_err();
    assert_eq!(
        err,
        Error::ExtensionMisformat("dnssec_return_all_statuses".into())
    );
    assert_eq!(err.code(), ReturnCode::EXTENSION_MISFORMAT.to_int());

    let ext = json!({"return_everything": true});
    ctx.address("getdnsapi.net", Some(&ext), sink(&tx)).unwrap();
    assert_eq!(
        next(&mut rx).await.0.unwrap_err(),
        Error::NoSuchExtension("return_everything".into())
    );

    ctx.address("getdnsapi.net", Some(&json!([true])), sink(&tx))
        .unwrap();
    assert_eq!(
        next(&mut rx).await.0.unwrap_err(),
        Error::ExtensionMisformat("extensions".into())
    );
}

#[tokio::test]
async fn dnssec_status() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.general("secure.test", Rtype::A, None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.replies_tree()[0].dnssec_status(), None);

    for ext in [
        json!({"dnssec_return_status": true}),
        json!({"dnssec_return_all_statuses": 1000}),
    ] {
        ctx.general("secure.test", Rtype::A, Some(&ext), sink(&tx))
            .unwrap();
        let response = next(&mut rx).await.0.unwrap();
        assert_eq!(
            response.replies_tree()[0].dnssec_status(),
            Some(DnssecStatus::SECURE)
        );
    }

    let ext = json!({"dnssec_return_only_secure": true});
    ctx.general("example.test", Rtype::A, Some(&ext), sink(&tx))
        .unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.status(), RespStatus::NO_SECURE_ANSWERS);
}

#[tokio::test]
async fn bad_dns_warnings() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.general("1.2.test", Rtype::A, None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.replies_tree()[0].bad_dns(), None);

    let ext = json!({"add_warning_for_bad_dns": true});
    ctx.general("1.2.test", Rtype::A, Some(&ext), sink(&tx))
        .unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(
        response.replies_tree()[0].bad_dns(),
        Some(&[BadDns::ALL_NUMERIC_LABEL][..])
    );

    ctx.general("example.test", Rtype::A, Some(&ext), sink(&tx))
        .unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.replies_tree()[0].bad_dns(), None);
}

#[tokio::test]
async fn call_reporting() {
    let ctx = create(&engine(), json!({}));
    let (tx, mut rx) = outcomes();
    ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    assert!(next(&mut rx).await.0.unwrap().call_reporting().is_none());

    let ext = json!({"return_call_reporting": true});
    ctx.address("getdnsapi.net", Some(&ext), sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    let reports = response.call_reporting().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].query_name, "getdnsapi.net.");
    assert_eq!(reports[0].query_type, Rtype::A);
    assert_eq!(reports[1].query_type, Rtype::AAAA);
    assert_eq!(reports[0].transport, TransportProto::UDP);

    // Context-wide default.
    let ctx = create(&engine(), json!({"return_call_reporting": true}));
    ctx.address("getdnsapi.net", None, sink(&tx)).unwrap();
    assert!(next(&mut rx).await.0.unwrap().call_reporting().is_some());
}

#[tokio::test]
async fn tsig_upstream() {
    let ctx = create(
        &engine(),
        json!({
            "resolution_type": 520,
            "upstream_recursive_servers": [
                "185.49.141.37",
                "^hmac-md5.tsigs.getdnsapi.net:16G69OTeXW6xSQ==",
            ],
        }),
    );
    let (tx, mut rx) = outcomes();
    ctx.general("getdnsapi.net", Rtype::A, None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(
        response.replies_tree()[0].tsig_status(),
        Some(DnssecStatus::SECURE)
    );

    let ctx = create(&engine(), json!({"upstreams": ["185.49.141.37"]}));
    ctx.general("getdnsapi.net", Rtype::A, None, sink(&tx)).unwrap();
    let response = next(&mut rx).await.0.unwrap();
    assert_eq!(response.replies_tree()[0].tsig_status(), None);
}
