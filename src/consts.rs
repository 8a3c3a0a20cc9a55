//! Well-known status and setting values.
//!
//! These are the numeric codes applications see in callbacks, replies and
//! option mappings. Each registry is an integer newtype so that values from
//! a newer engine survive a round trip through this crate unchanged.

//------------ ReturnCode ----------------------------------------------------

int_enum! {
    /// Result codes of context operations.
    =>
    ReturnCode, u32;

    (GOOD => 0, "GOOD")
    (GENERIC_ERROR => 1, "GENERIC_ERROR")
    (BAD_DOMAIN_NAME => 300, "BAD_DOMAIN_NAME")
    (BAD_CONTEXT => 301, "BAD_CONTEXT")
    (CONTEXT_UPDATE_FAIL => 302, "CONTEXT_UPDATE_FAIL")
    (UNKNOWN_TRANSACTION => 303, "UNKNOWN_TRANSACTION")
    (NO_SUCH_LIST_ITEM => 304, "NO_SUCH_LIST_ITEM")
    (NO_SUCH_DICT_NAME => 305, "NO_SUCH_DICT_NAME")
    (WRONG_TYPE_REQUESTED => 306, "WRONG_TYPE_REQUESTED")
    (NO_SUCH_EXTENSION => 307, "NO_SUCH_EXTENSION")
    (EXTENSION_MISFORMAT => 308, "EXTENSION_MISFORMAT")
    (DNSSEC_WITH_STUB_DISALLOWED => 309, "DNSSEC_WITH_STUB_DISALLOWED")
    (MEMORY_ERROR => 310, "MEMORY_ERROR")
    (INVALID_PARAMETER => 311, "INVALID_PARAMETER")
    (NOT_IMPLEMENTED => 312, "NOT_IMPLEMENTED")
}

//------------ DnssecStatus --------------------------------------------------

int_enum! {
    /// The outcome of DNSSEC validation for a reply.
    ///
    /// This is also used for the TSIG status of a reply, where `SECURE`
    /// means the reply carried a valid signature.
    =>
    DnssecStatus, u32;

    (SECURE => 400, "SECURE")
    (BOGUS => 401, "BOGUS")
    (INDETERMINATE => 402, "INDETERMINATE")
    (INSECURE => 403, "INSECURE")
    (NOT_PERFORMED => 404, "NOT_PERFORMED")
}

//------------ Namespace -----------------------------------------------------

int_enum! {
    /// Name spaces consulted for a lookup.
    =>
    Namespace, u32;

    (DNS => 500, "DNS")
    (LOCALNAMES => 501, "LOCALNAMES")
    (NETBIOS => 502, "NETBIOS")
    (MDNS => 503, "MDNS")
    (NIS => 504, "NIS")
}

//------------ Resolution ----------------------------------------------------

int_enum! {
    /// Whether the engine recurses itself or asks upstream resolvers.
    =>
    Resolution, u32;

    (STUB => 520, "STUB")
    (RECURSING => 521, "RECURSING")
}

//------------ Redirects -----------------------------------------------------

int_enum! {
    /// Whether to follow DNAME and CNAME redirects.
    =>
    Redirects, u32;

    (FOLLOW => 530, "FOLLOW")
    (DO_NOT_FOLLOW => 531, "DO_NOT_FOLLOW")
}

//------------ Transport -----------------------------------------------------

int_enum! {
    /// The legacy single-value transport setting.
    ///
    /// Each value is shorthand for a transport list, see
    /// [`Transport::to_list`].
    =>
    Transport, u32;

    (UDP_FIRST_AND_FALL_BACK_TO_TCP => 540, "UDP_FIRST_AND_FALL_BACK_TO_TCP")
    (UDP_ONLY => 541, "UDP_ONLY")
    (TCP_ONLY => 542, "TCP_ONLY")
    (TCP_ONLY_KEEP_CONNECTIONS_OPEN => 543, "TCP_ONLY_KEEP_CONNECTIONS_OPEN")
    (TLS_ONLY_KEEP_CONNECTIONS_OPEN => 544, "TLS_ONLY_KEEP_CONNECTIONS_OPEN")
    (
        TLS_FIRST_AND_FALL_BACK_TO_TCP_KEEP_CONNECTIONS_OPEN => 545,
        "TLS_FIRST_AND_FALL_BACK_TO_TCP_KEEP_CONNECTIONS_OPEN"
    )
}

impl Transport {
    /// Returns the transport list this setting stands for.
    ///
    /// Returns `None` for values this crate doesn't know.
    pub fn to_list(self) -> Option<Vec<TransportProto>> {
        use TransportProto as P;

        match self {
            Transport::UDP_FIRST_AND_FALL_BACK_TO_TCP => {
                Some(vec![P::UDP, P::TCP])
            }
            Transport::UDP_ONLY => Some(vec![P::UDP]),
            Transport::TCP_ONLY | Transport::TCP_ONLY_KEEP_CONNECTIONS_OPEN => {
                Some(vec![P::TCP])
            }
            Transport::TLS_ONLY_KEEP_CONNECTIONS_OPEN => Some(vec![P::TLS]),
            Transport::TLS_FIRST_AND_FALL_BACK_TO_TCP_KEEP_CONNECTIONS_OPEN => {
                Some(vec![P::TLS, P::TCP])
            }
            _ => None,
        }
    }
}

//------------ AppendName ----------------------------------------------------

int_enum! {
    /// When to append the suffix list to a query name.
    =>
    AppendName, u32;

    (ALWAYS => 550, "ALWAYS")
    (
        ONLY_TO_SINGLE_LABEL_AFTER_FAILURE => 551,
        "ONLY_TO_SINGLE_LABEL_AFTER_FAILURE"
    )
    (
        ONLY_TO_MULTIPLE_LABEL_NAME_AFTER_FAILURE => 552,
        "ONLY_TO_MULTIPLE_LABEL_NAME_AFTER_FAILURE"
    )
    (NEVER => 553, "NEVER")
    (TO_SINGLE_LABEL_FIRST => 554, "TO_SINGLE_LABEL_FIRST")
}

//------------ CallbackType --------------------------------------------------

int_enum! {
    /// How a transaction ended.
    =>
    CallbackType, u32;

    (COMPLETE => 700, "COMPLETE")
    (CANCEL => 701, "CANCEL")
    (TIMEOUT => 702, "TIMEOUT")
    (ERROR => 703, "ERROR")
}

//------------ NameType ------------------------------------------------------

int_enum! {
    /// The kind of name a hostname lookup answers with.
    =>
    NameType, u32;

    (DNS => 800, "DNS")
    (WINS => 801, "WINS")
}

//------------ RespStatus ----------------------------------------------------

int_enum! {
    /// The overall status of a response.
    =>
    RespStatus, u32;

    (GOOD => 900, "GOOD")
    (NO_NAME => 901, "NO_NAME")
    (ALL_TIMEOUT => 902, "ALL_TIMEOUT")
    (NO_SECURE_ANSWERS => 903, "NO_SECURE_ANSWERS")
    (ALL_BOGUS_ANSWERS => 904, "ALL_BOGUS_ANSWERS")
}

//------------ Extension -----------------------------------------------------

int_enum! {
    /// Numeric spelling of extension flags.
    =>
    Extension, u32;

    (TRUE => 1000, "TRUE")
    (FALSE => 1001, "FALSE")
}

//------------ BadDns --------------------------------------------------------

int_enum! {
    /// Warnings about questionable DNS data in a reply.
    =>
    BadDns, u32;

    (CNAME_IN_TARGET => 1100, "CNAME_IN_TARGET")
    (ALL_NUMERIC_LABEL => 1101, "ALL_NUMERIC_LABEL")
    (CNAME_RETURNED_FOR_OTHER_TYPE => 1102, "CNAME_RETURNED_FOR_OTHER_TYPE")
}

//------------ TransportProto ------------------------------------------------

int_enum! {
    /// One entry of a transport list.
    =>
    TransportProto, u32;

    (UDP => 1200, "UDP")
    (TCP => 1201, "TCP")
    (TLS => 1202, "TLS")
}

//------------ TlsAuthentication ---------------------------------------------

int_enum! {
    /// Whether TLS upstreams must present a certificate for their name.
    =>
    TlsAuthentication, u32;

    (NONE => 1300, "NONE")
    (HOSTNAME => 1301, "HOSTNAME")
}

//============ Tests =========================================================
