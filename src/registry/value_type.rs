//! Registry value type tags
//!
//! - REG_NONE: No type
//! - REG_SZ: Null-terminated string
//! - REG_EXPAND_SZ: Expandable string (with environment variables)
//! - REG_BINARY: Binary data
//! - REG_DWORD: 32-bit integer (little-endian)
//! - REG_DWORD_BIG_ENDIAN: 32-bit integer (big-endian)
//! - REG_LINK: Symbolic link
//! - REG_MULTI_SZ: Multiple null-terminated strings
//! - REG_QWORD: 64-bit integer

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ValueType {
    None = 0,
    /// Null-terminated string
    Sz = 1,
    /// Expandable string (with %VARIABLE% references)
    ExpandSz = 2,
    Binary = 3,
    /// 32-bit little-endian integer
    Dword = 4,
    /// 32-bit big-endian integer
    DwordBigEndian = 5,
    Link = 6,
    /// Array of null-terminated strings
    MultiSz = 7,
    ResourceList = 8,
    FullResourceDescriptor = 9,
    ResourceRequirementsList = 10,
    /// 64-bit little-endian integer
    Qword = 11,
}

impl ValueType {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Sz),
            2 => Some(Self::ExpandSz),
            3 => Some(Self::Binary),
            4 => Some(Self::Dword),
            5 => Some(Self::DwordBigEndian),
            6 => Some(Self::Link),
            7 => Some(Self::MultiSz),
            8 => Some(Self::ResourceList),
            9 => Some(Self::FullResourceDescriptor),
            10 => Some(Self::ResourceRequirementsList),
            11 => Some(Self::Qword),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }
}
