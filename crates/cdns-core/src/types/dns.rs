//! DNS opcodes and resource record types.
//!
//! Block parameters list the opcodes and RR types a collector records;
//! these enums provide the registered values and the defaults.

use serde::{Deserialize, Serialize};

/// DNS message opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// Standard query
    Query = 0,
    /// Inverse query (obsolete)
    IQuery = 1,
    /// Server status request
    Status = 2,
    /// Zone change notification
    Notify = 4,
    /// Dynamic update
    Update = 5,
    /// DNS stateful operations
    Dso = 6,
}

impl OpCode {
    /// Every registered opcode, in numeric order
    pub const ALL: [Self; 6] = [
        Self::Query,
        Self::IQuery,
        Self::Status,
        Self::Notify,
        Self::Update,
        Self::Dso,
    ];

    /// Numeric opcode value
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a registered opcode by value
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// Numeric values of every registered opcode
    #[must_use]
    pub fn all_codes() -> Vec<u8> {
        Self::ALL.iter().map(|op| op.code()).collect()
    }
}

macro_rules! rr_types {
    ($($name:ident = $value:literal),+ $(,)?) => {
        /// Resource record type
        #[allow(clippy::upper_case_acronyms, non_camel_case_types, missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum RrType {
            $($name = $value),+
        }

        impl RrType {
            /// Every registered RR type, in numeric order
            pub const ALL: &'static [Self] = &[$(Self::$name),+];

            /// Look up a registered RR type by value
            #[must_use]
            pub const fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($value => Some(Self::$name),)+
                    _ => None,
                }
            }
        }
    };
}

rr_types! {
    A = 1,
    NS = 2,
    MD = 3,
    MF = 4,
    CNAME = 5,
    SOA = 6,
    MB = 7,
    MG = 8,
    MR = 9,
    NULL = 10,
    WKS = 11,
    PTR = 12,
    HINFO = 13,
    MINFO = 14,
    MX = 15,
    TXT = 16,
    RP = 17,
    AFSDB = 18,
    X25 = 19,
    ISDN = 20,
    RT = 21,
    NSAP = 22,
    NSAP_PTR = 23,
    SIG = 24,
    KEY = 25,
    PX = 26,
    GPOS = 27,
    AAAA = 28,
    LOC = 29,
    NXT = 30,
    EID = 31,
    NIMLOC = 32,
    SRV = 33,
    ATMA = 34,
    NAPTR = 35,
    KX = 36,
    CERT = 37,
    A6 = 38,
    DNAME = 39,
    SINK = 40,
    OPT = 41,
    APL = 42,
    DS = 43,
    SSHFP = 44,
    IPSECKEY = 45,
    RRSIG = 46,
    NSEC = 47,
    DNSKEY = 48,
    DHCID = 49,
    NSEC3 = 50,
    NSEC3PARAM = 51,
    TLSA = 52,
    SMIMEA = 53,
    HIP = 55,
    NINFO = 56,
    RKEY = 57,
    TALINK = 58,
    CDS = 59,
    CDNSKEY = 60,
    OPENPGPKEY = 61,
    CSYNC = 62,
    ZONEMD = 63,
    SVCB = 64,
    HTTPS = 65,
    SPF = 99,
    UINFO = 100,
    UID = 101,
    GID = 102,
    UNSPEC = 103,
    NID = 104,
    L32 = 105,
    L64 = 106,
    LP = 107,
    EUI48 = 108,
    EUI64 = 109,
    TKEY = 249,
    TSIG = 250,
    IXFR = 251,
    AXFR = 252,
    MAILB = 253,
    MAILA = 254,
    ANY = 255,
    URI = 256,
    CAA = 257,
    AVC = 258,
    DOA = 259,
    AMTRELAY = 260,
    TA = 32768,
    DLV = 32769,
}

impl RrType {
    /// Numeric RR type value
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Numeric values of every registered RR type
    #[must_use]
    pub fn all_codes() -> Vec<u16> {
        Self::ALL.iter().map(|t| t.code()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_lookup() {
        assert_eq!(OpCode::from_code(0), Some(OpCode::Query));
        assert_eq!(OpCode::from_code(5), Some(OpCode::Update));
        // 3 is unassigned.
        assert_eq!(OpCode::from_code(3), None);
        assert_eq!(OpCode::all_codes(), vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn test_rr_type_lookup() {
        assert_eq!(RrType::from_code(28), Some(RrType::AAAA));
        assert_eq!(RrType::from_code(32769), Some(RrType::DLV));
        assert_eq!(RrType::from_code(54), None);
        assert_eq!(RrType::HTTPS.code(), 65);
    }

    #[test]
    fn test_rr_type_codes_are_sorted_and_unique() {
        let codes = RrType::all_codes();
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(codes.first(), Some(&1));
        assert_eq!(codes.last(), Some(&32769));
    }
}
