//! Query-time extensions.
//!
//! Extensions are a second, smaller mapping handed to a single query. They
//! are checked on the transaction's own task, so problems reach the
//! callback as [`Error::ExtensionMisformat`] or [`Error::NoSuchExtension`]
//! rather than failing the call that issued the query.

use super::{parse_flag, parse_int, Config};
use crate::base::iana::Class;
use crate::error::Error;
use serde::Serialize;
use serde_json::Value;

//------------ Extensions ----------------------------------------------------

/// The extensions in effect for one query.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Extensions {
    pub dnssec_return_status: bool,
    pub dnssec_return_only_secure: bool,
    pub dnssec_return_validation_chain: bool,
    pub dnssec_return_all_statuses: bool,
    pub add_warning_for_bad_dns: bool,
    pub return_call_reporting: bool,
    pub return_both_v4_and_v6: bool,
    pub return_api_information: bool,

    /// The class to query for.
    pub specify_class: Class,
}

impl Extensions {
    /// Merges a query's extension mapping over the context defaults.
    pub fn parse(value: Option<&Value>, config: &Config) -> Result<Self, Error> {
        let mut res = Self::from_config(config);
        let map = match value {
            None | Some(Value::Null) => return Ok(res),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(Error::ExtensionMisformat("extensions".into()))
            }
        };
        for (name, value) in map {
            let misformat = || Error::ExtensionMisformat(name.clone());
            let flag = match name.as_str() {
                "dnssec_return_status" => &mut res.dnssec_return_status,
                "dnssec_return_only_secure" => {
                    &mut res.dnssec_return_only_secure
                }
                "dnssec_return_validation_chain" => {
                    &mut res.dnssec_return_validation_chain
                }
                "dnssec_return_all_statuses" => {
                    &mut res.dnssec_return_all_statuses
                }
                "add_warning_for_bad_dns" => &mut res.add_warning_for_bad_dns,
                "return_call_reporting" => &mut res.return_call_reporting,
                "return_both_v4_and_v6" => &mut res.return_both_v4_and_v6,
                "return_api_information" => &mut res.return_api_information,
                "specify_class" => {
                    res.specify_class = Class::from_int(
                        parse_int(value).ok_or_else(misformat)?,
                    );
                    continue;
                }
                _ => return Err(Error::NoSuchExtension(name.clone())),
            };
            *flag = parse_flag(value).ok_or_else(misformat)?;
        }
        Ok(res)
    }

    /// Returns the extensions a context applies when a query has none.
    pub fn from_config(config: &Config) -> Self {
        Extensions {
            dnssec_return_status: config.return_dnssec_status(),
            dnssec_return_only_secure: false,
            dnssec_return_validation_chain: false,
            dnssec_return_all_statuses: config.dnssec_return_all_statuses(),
            add_warning_for_bad_dns: config.add_warning_for_bad_dns(),
            return_call_reporting: config.return_call_reporting(),
            return_both_v4_and_v6: false,
            return_api_information: false,
            specify_class: Class::IN,
        }
    }

    /// Returns whether any DNSSEC status was asked for.
    pub fn wants_dnssec_status(&self) -> bool {
        self.dnssec_return_status
            || self.dnssec_return_only_secure
            || self.dnssec_return_validation_chain
            || self.dnssec_return_all_statuses
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

//============ Tests =========================================================
