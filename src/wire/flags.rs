//! Bit-flag words carried by the request and reply opcodes.

use std::fmt;

macro_rules! wire_flags {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$fmeta:meta])* $flag:ident = $bit:expr => $label:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
        pub struct $name(pub i32);

        impl $name {
            $($(#[$fmeta])* pub const $flag: i32 = $bit;)+

            /// True when every bit of `flag` is set.
            pub fn contains(self, flag: i32) -> bool {
                self.0 & flag == flag
            }

            /// Names of the set bits, in bit order.
            pub fn names(self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(if self.contains(Self::$flag) {
                    names.push($label);
                })+
                names
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let names = self.names();
                if names.is_empty() {
                    write!(f, "{}", self.0)
                } else {
                    write!(f, "{}", names.join("|"))
                }
            }
        }
    };
}

wire_flags! {
    /// OP_QUERY flag word.
    QueryFlags {
        TAILABLE_CURSOR = 1 << 1 => "tailable",
        SLAVE_OK = 1 << 2 => "slaveOk",
        OPLOG_REPLAY = 1 << 3 => "oplogReplay",
        NO_CURSOR_TIMEOUT = 1 << 4 => "noCursorTimeout",
        AWAIT_DATA = 1 << 5 => "awaitData",
        EXHAUST = 1 << 6 => "exhaust",
        PARTIAL = 1 << 7 => "partial",
    }
}

wire_flags! {
    /// OP_REPLY response flag word.
    ReplyFlags {
        /// getMore on a cursor id the server no longer knows.
        CURSOR_NOT_FOUND = 1 << 0 => "cursorNotFound",
        /// The single returned document carries `$err`.
        QUERY_FAILURE = 1 << 1 => "queryFailure",
        SHARD_CONFIG_STALE = 1 << 2 => "shardConfigStale",
        AWAIT_CAPABLE = 1 << 3 => "awaitCapable",
    }
}

wire_flags! {
    /// OP_INSERT flag word.
    InsertFlags {
        CONTINUE_ON_ERROR = 1 << 0 => "continueOnError",
    }
}

wire_flags! {
    /// OP_UPDATE flag word.
    UpdateFlags {
        UPSERT = 1 << 0 => "upsert",
        MULTI_UPDATE = 1 << 1 => "multi",
    }
}

wire_flags! {
    /// OP_DELETE flag word.
    DeleteFlags {
        SINGLE_REMOVE = 1 << 0 => "singleRemove",
    }
}
