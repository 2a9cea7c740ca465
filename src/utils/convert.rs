//! Conversions between raw registry payloads and Rust values.
//!
//! String payloads are UTF-16LE. Integer payloads are little endian except
//! REG_DWORD_BIG_ENDIAN.
use std::io;

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn utf16_units(data: &[u8]) -> Vec<u16> {
    // An odd trailing byte cannot belong to a code unit and is ignored.
    data.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect()
}

fn utf16_to_string(units: &[u16]) -> io::Result<String> {
    String::from_utf16(units).map_err(|e| invalid_data(format!("invalid UTF-16 string data: {e}")))
}

/// Decodes a REG_SZ / REG_EXPAND_SZ payload, stopping at the first NUL.
pub fn decode_string(data: &[u8]) -> io::Result<String> {
    let units = utf16_units(data);
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    utf16_to_string(&units[..end])
}

/// Decodes a REG_MULTI_SZ payload.
///
/// One trailing NUL is the list terminator; every other NUL ends one string.
/// Order and duplicates are kept.
pub fn decode_multi_string(data: &[u8]) -> io::Result<Vec<String>> {
    let mut units = utf16_units(data);
    if units.last() == Some(&0) {
        units.pop();
    }

    let mut strings = Vec::new();
    let mut from = 0;
    for (i, &unit) in units.iter().enumerate() {
        if unit == 0 {
            strings.push(utf16_to_string(&units[from..i])?);
            from = i + 1;
        }
    }
    Ok(strings)
}

fn fixed<const N: usize>(data: &[u8]) -> io::Result<[u8; N]> {
    data.get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid_data(format!("expected {N} bytes of integer data, got {}", data.len())))
}

pub fn decode_dword(data: &[u8]) -> io::Result<u64> {
    Ok(u32::from_le_bytes(fixed::<4>(data)?) as u64)
}

/// REG_DWORD_BIG_ENDIAN keeps the most significant byte first.
pub fn decode_dword_big_endian(data: &[u8]) -> io::Result<u64> {
    Ok(u32::from_be_bytes(fixed::<4>(data)?) as u64)
}

pub fn decode_qword(data: &[u8]) -> io::Result<u64> {
    Ok(u64::from_le_bytes(fixed::<8>(data)?))
}

/// NUL-terminated UTF-16 code units, ready to hand to a wide-char API.
pub fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

pub fn encode_string(value: &str) -> Vec<u8> {
    to_wide(value).into_iter().flat_map(u16::to_le_bytes).collect()
}

pub fn encode_multi_string<S: AsRef<str>>(values: &[S]) -> Vec<u8> {
    let mut units: Vec<u16> = Vec::new();
    for value in values {
        units.extend(value.as_ref().encode_utf16());
        units.push(0);
    }
    units.push(0);
    units.into_iter().flat_map(u16::to_le_bytes).collect()
}
