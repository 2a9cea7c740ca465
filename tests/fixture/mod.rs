//! Test subtree shared by the integration tests.
#![allow(dead_code)]

use winreg_source::MemoryRegistry;
use winreg_source::RawValue;
use winreg_source::RootKey;

pub const TEST_KEY: &str = "SOFTWARE\\{26FB54D3-C8FF-4CD8-9D78-E1365170B217}";

pub fn sub(name: &str) -> String {
    format!("{TEST_KEY}\\{name}")
}

/// Every leaf the full subtree is expected to produce with `Default` as alias.
pub const ALL_KEYS: [&str; 10] = [
    "SubKeyA.Binary",
    "SubKeyA.Expand",
    "SubKeyA.Int64",
    "SubKeyA.IntVal",
    "SubKeyA.StrList",
    "SubKeyA.StrValue",
    "SubKeyA.Sub Key",
    "SubKeyB.Default",
    "off",
    "on",
];

pub fn populate(registry: &MemoryRegistry) {
    let root = RootKey::CurrentUser;
    registry.create_key(root, TEST_KEY).unwrap();
    registry.set_value(root, TEST_KEY, "on", RawValue::dword(1)).unwrap();
    registry.set_value(root, TEST_KEY, "off", RawValue::dword(0)).unwrap();

    let a = sub("SubKeyA");
    registry.create_key(root, &a).unwrap();
    registry.set_value(root, &a, "Binary", RawValue::binary([1, 2, 3])).unwrap();
    registry
        .set_value(root, &a, "Expand", RawValue::expand_string("Some %PATH%"))
        .unwrap();
    registry.set_value(root, &a, "Int64", RawValue::qword(5_000_000_000)).unwrap();
    registry.set_value(root, &a, "IntVal", RawValue::dword(4_000_000_000)).unwrap();
    registry
        .set_value(
            root,
            &a,
            "StrList",
            RawValue::multi_string(&["Black cat", "sit on the mat", "and eat", "the fat rat"]),
        )
        .unwrap();
    registry
        .set_value(
            root,
            &a,
            "StrValue",
            RawValue::string("The quick brown fox jumps over the lazy dog"),
        )
        .unwrap();
    registry.create_key(root, &format!("{a}\\Sub Key")).unwrap();

    let b = sub("SubKeyB");
    registry.create_key(root, &b).unwrap();
    registry.set_value(root, &b, "", RawValue::string("default value")).unwrap();
}
