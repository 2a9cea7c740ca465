use serial_test::serial;
use temp_env::with_vars;

use crate::convert::*;
use crate::expand_environment_strings;

#[test]
fn decode_string_should_stop_at_first_nul() {
    let data = encode_string("The quick brown fox");
    assert_eq!(decode_string(&data).unwrap(), "The quick brown fox");

    let mut data = encode_string("abc");
    data.extend_from_slice(&encode_string("garbage"));
    assert_eq!(decode_string(&data).unwrap(), "abc");
}

#[test]
fn decode_string_should_accept_missing_terminator_and_odd_length() {
    let mut data: Vec<u8> = "hi".encode_utf16().flat_map(u16::to_le_bytes).collect();
    assert_eq!(decode_string(&data).unwrap(), "hi");

    data.push(0x41);
    assert_eq!(decode_string(&data).unwrap(), "hi");
    assert_eq!(decode_string(&[]).unwrap(), "");
}

#[test]
fn decode_string_should_reject_unpaired_surrogate() {
    let data = [0x00, 0xD8, 0x41, 0x00];
    let err = decode_string(&data).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn decode_multi_string_should_keep_order_and_duplicates() {
    let data = encode_multi_string(&["Black cat", "sit on the mat", "Black cat", "the fat rat"]);
    assert_eq!(
        decode_multi_string(&data).unwrap(),
        vec!["Black cat", "sit on the mat", "Black cat", "the fat rat"]
    );
}

#[test]
fn decode_multi_string_should_keep_inner_empty_strings() {
    // "a\0\0b\0\0": one terminator dropped, the inner NUL ends an empty string
    let units: [u16; 6] = [0x61, 0, 0, 0x62, 0, 0];
    let data: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
    assert_eq!(decode_multi_string(&data).unwrap(), vec!["a", "", "b"]);
    assert!(decode_multi_string(&[]).unwrap().is_empty());
}

#[test]
fn integer_decoding_should_follow_byte_order() {
    assert_eq!(decode_dword(&4_000_000_000u32.to_le_bytes()).unwrap(), 4_000_000_000);
    assert_eq!(decode_qword(&5_000_000_000u64.to_le_bytes()).unwrap(), 5_000_000_000);
    assert_eq!(decode_dword_big_endian(&[0, 0, 0, 100]).unwrap(), 100);
    assert_eq!(decode_dword_big_endian(&[1, 0, 0, 0]).unwrap(), 16_777_216);
}

#[test]
fn integer_decoding_should_fail_on_short_payload() {
    assert!(decode_dword(&[1, 2, 3]).is_err());
    assert!(decode_qword(&[1, 2, 3, 4]).is_err());
    assert!(decode_dword_big_endian(&[]).is_err());
}

#[test]
fn to_wide_should_terminate_with_nul() {
    assert_eq!(to_wide("ab"), vec![0x61, 0x62, 0]);
}

#[test]
#[serial]
fn expand_should_replace_known_variables() {
    with_vars(vec![("WINREG_TEST_DIR", Some("C:\\data"))], || {
        assert_eq!(
            expand_environment_strings("Some %WINREG_TEST_DIR%\\logs"),
            "Some C:\\data\\logs"
        );
    });
}

#[test]
#[serial]
fn expand_should_leave_unknown_and_unterminated_references() {
    with_vars(
        vec![
            ("WINREG_TEST_DIR", Some("x")),
            ("WINREG_TEST_MISSING", None::<&str>),
        ],
        || {
            assert_eq!(
                expand_environment_strings("%WINREG_TEST_MISSING%/%WINREG_TEST_DIR%"),
                "%WINREG_TEST_MISSING%/x"
            );
            assert_eq!(expand_environment_strings("100%"), "100%");
            assert_eq!(expand_environment_strings("%%"), "%%");
        },
    );
}
