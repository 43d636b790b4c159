//! Result field selection for queries

use bitflags::bitflags;
use serde::{Serialize, Serializer};
use serde_json::Value;

bitflags! {
    /// File attributes the daemon should include for each file in a query
    /// reply. Bit values match the watchman C client header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fields: u32 {
        const NAME = 0x0000_0001;
        const EXISTS = 0x0000_0002;
        const CCLOCK = 0x0000_0004;
        const OCLOCK = 0x0000_0008;
        const CTIME = 0x0000_0010;
        const CTIME_MS = 0x0000_0020;
        const CTIME_US = 0x0000_0040;
        const CTIME_NS = 0x0000_0080;
        const CTIME_F = 0x0000_0100;
        const MTIME = 0x0000_0200;
        const MTIME_MS = 0x0000_0400;
        const MTIME_US = 0x0000_0800;
        const MTIME_NS = 0x0000_1000;
        const MTIME_F = 0x0000_2000;
        const SIZE = 0x0000_4000;
        const UID = 0x0000_8000;
        const GID = 0x0001_0000;
        const INO = 0x0002_0000;
        const DEV = 0x0004_0000;
        const NLINK = 0x0008_0000;
        const NEW = 0x0010_0000;
    }
}

/// Wire names in ascending bit order. Must stay in lock-step with the flag
/// declarations; `test_wire_names_cover_every_flag` guards the pairing.
const WIRE_NAMES: [(Fields, &str); 21] = [
    (Fields::NAME, "name"),
    (Fields::EXISTS, "exists"),
    (Fields::CCLOCK, "cclock"),
    (Fields::OCLOCK, "oclock"),
    (Fields::CTIME, "ctime"),
    (Fields::CTIME_MS, "ctime_ms"),
    (Fields::CTIME_US, "ctime_us"),
    (Fields::CTIME_NS, "ctime_ns"),
    (Fields::CTIME_F, "ctime_f"),
    (Fields::MTIME, "mtime"),
    (Fields::MTIME_MS, "mtime_ms"),
    (Fields::MTIME_US, "mtime_us"),
    (Fields::MTIME_NS, "mtime_ns"),
    (Fields::MTIME_F, "mtime_f"),
    (Fields::SIZE, "size"),
    (Fields::UID, "uid"),
    (Fields::GID, "gid"),
    (Fields::INO, "ino"),
    (Fields::DEV, "dev"),
    (Fields::NLINK, "nlink"),
    (Fields::NEW, "new"),
];

impl Fields {
    /// JSON array of wire names for every selected field, lowest bit first.
    pub fn to_json(self) -> Value {
        Value::Array(
            WIRE_NAMES
                .iter()
                .filter(|(field, _)| self.contains(*field))
                .map(|(_, name)| Value::from(*name))
                .collect(),
        )
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
