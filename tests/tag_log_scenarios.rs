//! End-to-end tag log scenarios
//!
//! Each scenario runs against the on-chip backend and against the
//! page-cached external backend.

use tagstore::{
    ByteStorage, ErrorKind, InternalEeprom, PageCache, SimulatedEeprom, StoreConfig, TagStore,
};

fn internal_store() -> TagStore<InternalEeprom<1024>> {
    TagStore::open(InternalEeprom::new(), StoreConfig::internal()).unwrap()
}

fn external_store() -> TagStore<PageCache<SimulatedEeprom>> {
    let config = StoreConfig::external();
    let bus = SimulatedEeprom::new(config.device_address);
    let cache = PageCache::from_config(bus, &config).unwrap();
    TagStore::open(cache, config).unwrap()
}

fn append_find_scenario<S: ByteStorage>(store: &mut TagStore<S>) {
    let empty_hash = store.integrity_hash();

    store.append(b"DEADBEEF 1234").unwrap();
    assert_eq!(store.find("DEADBEEF").unwrap(), "1234");
    assert_eq!(
        store.find("CAFEBABE").unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let hash = store.integrity_hash();
    assert_ne!(hash, empty_hash);
    assert_ne!(hash, 0);
}

#[test]
fn test_append_find_internal() {
    append_find_scenario(&mut internal_store());
}

#[test]
fn test_append_find_external() {
    append_find_scenario(&mut external_store());
}

fn malformed_scenario<S: ByteStorage>(store: &mut TagStore<S>) {
    store.append(b"00000001 1234").unwrap();
    let offset = store.last_offset();
    let hash = store.integrity_hash();

    let err = store.append(b"ZZZZZZZZ 1234").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(err.to_string(), "Bad tag");

    for entry in [&b"0000000 1234"[..], b"00000002_1234", b"00000002 12"] {
        let err = store.append(entry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    assert_eq!(store.last_offset(), offset);
    assert_eq!(store.integrity_hash(), hash);
    assert_eq!(store.scan().count(), 1);
}

#[test]
fn test_malformed_internal() {
    malformed_scenario(&mut internal_store());
}

#[test]
fn test_malformed_external() {
    malformed_scenario(&mut external_store());
}

#[test]
fn test_scan_yields_append_order() {
    let mut store = external_store();
    let entries = [
        "00000001 1111",
        "ABCDEF01 22222",
        "00000001 3333",
        "12345678 444444",
    ];
    for entry in entries {
        store.append(entry.as_bytes()).unwrap();
    }

    let listed: Vec<String> = store
        .scan()
        .map(|r| format!("{} {}", r.id, r.pin))
        .collect();
    assert_eq!(listed, entries);
}

#[test]
fn test_scan_is_restartable() {
    let mut store = internal_store();
    store.append(b"00000001 1111").unwrap();
    store.append(b"00000002 2222").unwrap();

    let first = store.scan().next().unwrap();
    let again = store.scan().next().unwrap();
    assert_eq!(first, again);
    assert_eq!(store.scan().count(), 2);
}

#[test]
fn test_reset_empties_log() {
    let mut store = external_store();
    let empty_hash = store.integrity_hash();
    store.append(b"DEADBEEF 1234").unwrap();

    store.reset_all();
    assert_eq!(store.scan().count(), 0);
    assert_eq!(store.last_offset(), Some(64));
    assert_eq!(store.integrity_hash(), empty_hash);
    assert_eq!(store.find("DEADBEEF").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_free_bytes_side_channel() {
    let mut store = internal_store();
    store.append(b"DEADBEEF 1234").unwrap();
    store.append(b"CAFEBABE 123456").unwrap();

    let report = store.integrity_report();
    assert_eq!(report.records, 2);
    assert_eq!(report.free_bytes, 1023 - 64 - 9 - 11);
}

#[test]
fn test_same_entries_same_hash_across_backends() {
    let mut internal = internal_store();
    let mut external = external_store();
    for entry in ["0A0B0C0D 1234", "DEADBEEF 5678"] {
        internal.append(entry.as_bytes()).unwrap();
        external.append(entry.as_bytes()).unwrap();
    }
    assert_eq!(internal.integrity_hash(), external.integrity_hash());
}

#[test]
fn test_gateway_key_list_hash() {
    let keys = ["DEADBEEF 1234", "CAFEBABE 0000", "0000FFFF 987654"];

    let mut store = external_store();
    for key in keys {
        store.append(key.as_bytes()).unwrap();
    }
    assert_eq!(store.integrity_hash(), tagstore::hash_entries(keys));

    // Lowercase identifiers are stored uppercase, so only the store side matches
    let mut lower = internal_store();
    lower.append(b"deadbeef 1234").unwrap();
    assert_eq!(lower.integrity_hash(), tagstore::hash_entries(["DEADBEEF 1234"]));
}

#[test]
fn test_layout_from_toml_drives_external_store() {
    let config = StoreConfig::from_toml_str(
        r#"
        backend = "external"
        device_address = 0x54
        end_of_region = 4095
        "#,
    )
    .unwrap();
    let cache = PageCache::from_config(SimulatedEeprom::new(0x54), &config).unwrap();
    let mut store = TagStore::open(cache, config).unwrap();

    store.append(b"DEADBEEF 1234").unwrap();
    assert_eq!(store.find("DEADBEEF").unwrap(), "1234");
    assert_eq!(store.free_bytes(), 4095 - 73);
    assert_eq!(store.storage().stats().bus_failures, 0);
}
