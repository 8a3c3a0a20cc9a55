//! DNS response codes.

//------------ Rcode ---------------------------------------------------------

int_enum! {
    /// DNS response codes.
    ///
    /// Only the four bit header code is kept here. Replies report it in the
    /// `rcode` field of their header.
    =>
    Rcode, u8;

    /// No error condition.
    (NOERROR => 0, "NOERROR")

    /// The server was unable to interpret the query.
    (FORMERR => 1, "FORMERR")

    /// The server had a problem processing the query.
    (SERVFAIL => 2, "SERVFAIL")

    /// The queried name does not exist.
    (NXDOMAIN => 3, "NXDOMAIN")

    /// The kind of query is not supported.
    (NOTIMP => 4, "NOTIMP")

    /// The server refuses to answer for policy reasons.
    (REFUSED => 5, "REFUSED")

    (YXDOMAIN => 6, "YXDOMAIN")
    (YXRRSET => 7, "YXRRSET")
    (NXRRSET => 8, "NXRRSET")
    (NOTAUTH => 9, "NOTAUTH")
    (NOTZONE => 10, "NOTZONE")
}

impl Default for Rcode {
    fn default() -> Self {
        Rcode::NOERROR
    }
}
