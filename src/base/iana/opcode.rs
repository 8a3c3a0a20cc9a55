//! DNS OpCodes

//------------ Opcode --------------------------------------------------------

int_enum! {
    /// DNS OpCodes.
    ///
    /// The opcode is the four bit field in a message header describing the
    /// kind of message. Replies carry it in their header section.
    =>
    Opcode, u8;

    /// A standard query.
    (QUERY => 0, "QUERY")

    /// An inverse query (obsolete).
    (IQUERY => 1, "IQUERY")

    /// A server status request.
    (STATUS => 2, "STATUS")

    /// A NOTIFY query.
    (NOTIFY => 4, "NOTIFY")

    /// An UPDATE query.
    (UPDATE => 5, "UPDATE")

    /// DNS Stateful Operations.
    (DSO => 6, "DSO")
}

impl Default for Opcode {
    fn default() -> Self {
        Opcode::QUERY
    }
}
