//! Resource Record (RR) TYPEs

//------------ Rtype ---------------------------------------------------------

int_enum! {
    /// Resource Record Types.
    ///
    /// Every query is for one of these types and every record in a reply
    /// carries one. The values are maintained in an [IANA registry]; the
    /// table includes the query-only types and the DNSSEC trust anchor
    /// types from the private range.
    ///
    /// [IANA registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
    =>
    Rtype, u16;

    /// A host address.
    (A => 1, "A")
    /// An authoritative name server.
    (NS => 2, "NS")
    /// A mail destination (obsolete).
    (MD => 3, "MD")
    /// A mail forwarder (obsolete).
    (MF => 4, "MF")
    /// The canonical name for an alias.
    (CNAME => 5, "CNAME")
    /// Marks the start of a zone of authority.
    (SOA => 6, "SOA")
    (MB => 7, "MB")
    (MG => 8, "MG")
    (MR => 9, "MR")
    (NULL => 10, "NULL")
    (WKS => 11, "WKS")
    /// A domain name pointer.
    (PTR => 12, "PTR")
    (HINFO => 13, "HINFO")
    (MINFO => 14, "MINFO")
    /// Mail exchange.
    (MX => 15, "MX")
    /// Text strings.
    (TXT => 16, "TXT")
    (RP => 17, "RP")
    (AFSDB => 18, "AFSDB")
    (X25 => 19, "X25")
    (ISDN => 20, "ISDN")
    (RT => 21, "RT")
    (NSAP => 22, "NSAP")
    (NSAPPTR => 23, "NSAP-PTR")
    (SIG => 24, "SIG")
    (KEY => 25, "KEY")
    (PX => 26, "PX")
    (GPOS => 27, "GPOS")
    /// An IPv6 host address.
    (AAAA => 28, "AAAA")
    (LOC => 29, "LOC")
    (NXT => 30, "NXT")
    (EID => 31, "EID")
    (NIMLOC => 32, "NIMLOC")
    /// Server selection.
    (SRV => 33, "SRV")
    (ATMA => 34, "ATMA")
    (NAPTR => 35, "NAPTR")
    (KX => 36, "KX")
    (CERT => 37, "CERT")
    (A6 => 38, "A6")
    (DNAME => 39, "DNAME")
    (SINK => 40, "SINK")
    (OPT => 41, "OPT")
    (APL => 42, "APL")
    /// Delegation signer.
    (DS => 43, "DS")
    (SSHFP => 44, "SSHFP")
    (IPSECKEY => 45, "IPSECKEY")
    /// DNSSEC signature.
    (RRSIG => 46, "RRSIG")
    /// Next secure record.
    (NSEC => 47, "NSEC")
    /// DNSSEC public key.
    (DNSKEY => 48, "DNSKEY")
    (DHCID => 49, "DHCID")
    (NSEC3 => 50, "NSEC3")
    (NSEC3PARAM => 51, "NSEC3PARAM")
    /// TLS certificate association.
    (TLSA => 52, "TLSA")
    (SMIMEA => 53, "SMIMEA")
    (HIP => 55, "HIP")
    (NINFO => 56, "NINFO")
    (RKEY => 57, "RKEY")
    (TALINK => 58, "TALINK")
    (CDS => 59, "CDS")
    (CDNSKEY => 60, "CDNSKEY")
    (OPENPGPKEY => 61, "OPENPGPKEY")
    (CSYNC => 62, "CSYNC")
    (ZONEMD => 63, "ZONEMD")
    (SVCB => 64, "SVCB")
    (HTTPS => 65, "HTTPS")
    (SPF => 99, "SPF")
    (UINFO => 100, "UINFO")
    (UID => 101, "UID")
    (GID => 102, "GID")
    (UNSPEC => 103, "UNSPEC")
    (NID => 104, "NID")
    (L32 => 105, "L32")
    (L64 => 106, "L64")
    (LP => 107, "LP")
    (EUI48 => 108, "EUI48")
    (EUI64 => 109, "EUI64")
    (TKEY => 249, "TKEY")
    (TSIG => 250, "TSIG")
    (IXFR => 251, "IXFR")
    (AXFR => 252, "AXFR")
    (MAILB => 253, "MAILB")
    (MAILA => 254, "MAILA")
    /// A request for all records the server has.
    (ANY => 255, "ANY")
    (URI => 256, "URI")
    /// Certification authority restriction.
    (CAA => 257, "CAA")
    (AVC => 258, "AVC")
    (DOA => 259, "DOA")
    (AMTRELAY => 260, "AMTRELAY")
    /// DNSSEC trust authorities.
    (TA => 32768, "TA")
    /// DNSSEC lookaside validation.
    (DLV => 32769, "DLV")
}

impl Rtype {
    /// Returns whether records of this type carry an address.
    #[must_use]
    pub fn is_address(self) -> bool {
        matches!(self, Rtype::A | Rtype::AAAA)
    }
}

//============ Tests =========================================================
