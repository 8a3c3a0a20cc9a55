//! Callback-driven asynchronous DNS query contexts.
//!
//! This crate provides the part of a DNS client library that sits between
//! an application and a resolution engine. The application creates a
//! [`Context`] from a mapping of options, issues queries through it and
//! receives each outcome through a callback. The engine does the actual
//! resolving: talking to servers over UDP, TCP or TLS, validating DNSSEC,
//! signing with TSIG. The crate only cares about getting queries to the
//! engine and answers back to the application, reliably.
//!
//! In particular, a context guarantees that
//!
//! * options are validated before anything happens and bad ones are
//!   reported by name,
//! * every query that was accepted leads to exactly one callback, be it
//!   with a response, an error, or the news that it was cancelled,
//! * transactions can be cancelled and contexts destroyed at any time
//!   without ever having to deal with an error.
//!
//! # Modules
//!
//! * [context] contains [`Context`] and its transactions,
//! * [options] validates options into a typed [`Config`],
//! * [engine] defines the interface to the resolution engine and provides
//!   a scripted engine for tests and deterministic lookups,
//! * [response] has the responses handed to callbacks,
//! * [consts] and [base] have the numeric constants applications use in
//!   options and find in responses, and
//! * [error] has the crate's error type.
//!
//! # Example
//!
//! ```
//! use domain_context::engine::scripted::ScriptedEngine;
//! use domain_context::response::RecordData;
//! use domain_context::Context;
//! use serde_json::json;
//! use tokio::sync::oneshot;
//!
//! # tokio_test::block_on(async {
//! let engine = ScriptedEngine::new();
//! engine.add("example.test", RecordData::A([192, 0, 2, 1].into()));
//!
//! let ctx = Context::create(engine, Some(&json!({"timeout": 5000}))).unwrap();
//! let (tx, rx) = oneshot::channel();
//! ctx.address("example.test", None, move |res, _id| {
//!     let _ = tx.send(res);
//! })
//! .unwrap();
//! let response = rx.await.unwrap().unwrap();
//! assert_eq!(
//!     response.just_address_answers(),
//!     Some(&["192.0.2.1".parse().unwrap()][..])
//! );
//! assert!(ctx.destroy());
//! # });
//! ```
//!
//! [`Config`]: options::Config

#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use self::context::{Context, TransactionId};
pub use self::error::Error;

#[macro_use]
pub mod base;
pub mod consts;
pub mod context;
pub mod engine;
pub mod error;
pub mod logging;
pub mod options;
pub mod response;
pub mod utils;
