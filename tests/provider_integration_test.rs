mod fixture;

use std::sync::mpsc;
use std::time::Duration;

use config::Config;
use fixture::populate;
use fixture::sub;
use fixture::ALL_KEYS;
use fixture::TEST_KEY;
use winreg_source::dotted_keys;
use winreg_source::lookup;
use winreg_source::Error;
use winreg_source::MemoryRegistry;
use winreg_source::ProviderConfig;
use winreg_source::RawValue;
use winreg_source::RegistryProvider;
use winreg_source::RootKey;
use winreg_source::Termination;
use winreg_source::Value;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn provider(registry: &MemoryRegistry) -> RegistryProvider<MemoryRegistry> {
    RegistryProvider::with_registry(
        registry.clone(),
        ProviderConfig::new(RootKey::CurrentUser, TEST_KEY).with_default_value("Default"),
    )
}

#[test]
fn full_subtree_should_load_into_config() {
    let registry = MemoryRegistry::new();
    populate(&registry);
    let provider = provider(&registry);

    let node = provider.read().unwrap();
    assert_eq!(dotted_keys(&node), ALL_KEYS);

    let path = std::env::var("PATH").unwrap_or_default();
    assert_eq!(
        lookup(&node, "SubKeyA.Expand").and_then(Value::as_str),
        Some(format!("Some {path}").as_str())
    );

    let settings = Config::builder().add_source(provider).build().unwrap();
    assert_eq!(settings.get::<u64>("SubKeyA.IntVal").unwrap(), 4_000_000_000);
    assert_eq!(settings.get_string("SubKeyB.Default").unwrap(), "default value");
    assert_eq!(settings.get::<u64>("on").unwrap(), 1);
    assert_eq!(settings.get::<u64>("off").unwrap(), 0);
}

#[test]
fn missing_subtree_should_fail_with_os_message() {
    let registry = MemoryRegistry::new();
    let err = provider(&registry).read().unwrap_err();

    assert_eq!(
        err.to_string(),
        format!("HKCU\\{TEST_KEY}: The system cannot find the file specified.")
    );
    assert!(provider(&registry).watch(|_| {}).is_err());
}

#[test]
fn watch_then_reload_should_track_changes() {
    let registry = MemoryRegistry::new();
    populate(&registry);
    let provider = provider(&registry);

    let (tx, rx) = mpsc::channel();
    let reloader = provider.clone();
    let handle = provider
        .watch(move |event| {
            let reloaded = event.and_then(|()| reloader.read());
            let _ = tx.send(reloaded);
        })
        .unwrap();

    let a = sub("SubKeyA");
    registry
        .set_value(RootKey::CurrentUser, &a, "IntVal", RawValue::dword(200))
        .unwrap();
    let node = rx.recv_timeout(EVENT_TIMEOUT).unwrap().unwrap();
    assert_eq!(lookup(&node, "SubKeyA.IntVal"), Some(&Value::Integer(200)));

    registry.delete_value(RootKey::CurrentUser, &a, "IntVal").unwrap();
    let node = rx.recv_timeout(EVENT_TIMEOUT).unwrap().unwrap();
    assert!(lookup(&node, "SubKeyA.IntVal").is_none());

    registry
        .set_value(RootKey::CurrentUser, &a, "IntVal", RawValue::dword(100))
        .unwrap();
    let node = rx.recv_timeout(EVENT_TIMEOUT).unwrap().unwrap();
    assert_eq!(lookup(&node, "SubKeyA.IntVal"), Some(&Value::Integer(100)));

    registry
        .delete_key(RootKey::CurrentUser, &format!("{a}\\Sub Key"))
        .unwrap();
    let node = rx.recv_timeout(EVENT_TIMEOUT).unwrap().unwrap();
    assert!(!dotted_keys(&node).contains(&"SubKeyA.Sub Key".to_string()));

    registry.delete_key(RootKey::CurrentUser, TEST_KEY).unwrap();
    let event = rx.recv_timeout(EVENT_TIMEOUT).unwrap();
    assert!(matches!(event, Err(Error::WatchRegistrationFailed { .. })));
    assert_eq!(handle.join(), Some(Termination::RegistrationFailed));
}
