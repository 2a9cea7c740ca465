use config::Config;
use config::ConfigError;
use config::Source;
use config::ValueKind;

use super::*;
use crate::Error;
use crate::MemoryRegistry;
use crate::RawValue;
use crate::RootKey;

fn fixture() -> MemoryRegistry {
    let registry = MemoryRegistry::new();
    registry.create_key(RootKey::CurrentUser, "App\\SubKeyA").unwrap();
    registry.create_key(RootKey::CurrentUser, "App\\SubKeyB").unwrap();
    registry.set_value(RootKey::CurrentUser, "App", "on", RawValue::dword(1)).unwrap();

    let a = "App\\SubKeyA";
    registry.set_value(RootKey::CurrentUser, a, "Binary", RawValue::binary([1, 2, 3])).unwrap();
    registry.set_value(RootKey::CurrentUser, a, "Int64", RawValue::qword(5_000_000_000)).unwrap();
    registry
        .set_value(RootKey::CurrentUser, a, "StrList", RawValue::multi_string(&["Black cat", "the fat rat"]))
        .unwrap();
    registry
        .set_value(RootKey::CurrentUser, a, "StrValue", RawValue::string("The quick brown fox"))
        .unwrap();
    registry
        .set_value(RootKey::CurrentUser, "App\\SubKeyB", "", RawValue::string("default value"))
        .unwrap();
    registry
}

fn provider(registry: &MemoryRegistry) -> RegistryProvider<MemoryRegistry> {
    RegistryProvider::with_registry(
        registry.clone(),
        ProviderConfig::new(RootKey::CurrentUser, "App").with_default_value("Default"),
    )
}

#[test]
fn provider_should_feed_config_builder() {
    let registry = fixture();
    let settings = Config::builder().add_source(provider(&registry)).build().unwrap();

    assert_eq!(settings.get::<u64>("on").unwrap(), 1);
    assert_eq!(settings.get::<u64>("SubKeyA.Int64").unwrap(), 5_000_000_000);
    assert_eq!(settings.get_string("SubKeyA.StrValue").unwrap(), "The quick brown fox");
    assert_eq!(
        settings.get::<Vec<String>>("SubKeyA.StrList").unwrap(),
        vec!["Black cat", "the fat rat"]
    );
    assert_eq!(settings.get::<Vec<u64>>("SubKeyA.Binary").unwrap(), vec![1, 2, 3]);
    assert_eq!(settings.get_string("SubKeyB.Default").unwrap(), "default value");
}

#[test]
fn collected_values_should_carry_key_origin() {
    let registry = fixture();
    let map = provider(&registry).collect().unwrap();

    assert!(matches!(map["SubKeyA"].kind, ValueKind::Table(_)));
    assert!(matches!(map["on"].kind, ValueKind::U64(1)));
    assert_eq!(map["on"].origin(), Some("HKCU\\App"));
}

#[test]
fn read_failure_should_surface_as_foreign_error() {
    let registry = MemoryRegistry::new();
    let err = Config::builder()
        .add_source(provider(&registry))
        .build()
        .unwrap_err();

    match err {
        ConfigError::Foreign(inner) => {
            let inner = inner.downcast_ref::<Error>().unwrap();
            assert!(matches!(inner, Error::KeyOpenFailed { .. }));
            assert_eq!(inner.key(), Some("HKCU\\App"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn provider_should_expose_reader_and_watcher() {
    let registry = fixture();
    let provider = provider(&registry);

    assert_eq!(provider.config().qualified_name(), "HKCU\\App");
    assert_eq!(provider.reader().config(), provider.config());
    assert!(provider.read().unwrap().contains_key("SubKeyA"));
    assert!(matches!(provider.read_bytes(), Err(Error::Unsupported("read_bytes"))));

    let (tx, rx) = std::sync::mpsc::channel();
    let handle = provider
        .watch(move |event| {
            let _ = tx.send(event);
        })
        .unwrap();
    registry.set_value(RootKey::CurrentUser, "App", "on", RawValue::dword(0)).unwrap();
    assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap().is_ok());

    let settings = Config::builder().add_source(provider.clone()).build().unwrap();
    assert_eq!(settings.get::<u64>("on").unwrap(), 0);

    registry.abandon_watchers();
    assert_eq!(handle.join(), Some(crate::Termination::Abandoned));
}
