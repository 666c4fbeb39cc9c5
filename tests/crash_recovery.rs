//! Power-cycle recovery tests
//!
//! Uses EEPROM image files to check that the log survives a restart, that
//! the append position is rebuilt from the device, and that a foreign
//! version byte resets the log.

use std::fs;
use tagstore::{Backend, ByteStorage, ImageFile, StoreConfig, TagStore};
use tempfile::tempdir;

#[test]
fn test_reopen_rebuilds_append_position() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");

    {
        let image = ImageFile::create(&path, 1024).unwrap();
        let mut store = TagStore::open(image, StoreConfig::internal()).unwrap();
        store.append(b"00000001 1111").unwrap();
        store.append(b"00000002 222222").unwrap();
        store.append(b"00000003 3333").unwrap();
        store.into_inner().sync().unwrap();
    }

    let image = ImageFile::open(&path).unwrap();
    let mut store = TagStore::open(image, StoreConfig::internal()).unwrap();
    assert_eq!(store.last_offset(), None);

    assert_eq!(store.free_bytes(), 1023 - (64 + 9 + 11 + 9));
    assert_eq!(store.last_offset(), Some(93));
    assert_eq!(store.find("00000002").unwrap(), "222222");
}

#[test]
fn test_append_after_restart_continues_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");

    let mut store =
        TagStore::open(ImageFile::create(&path, 1024).unwrap(), StoreConfig::internal()).unwrap();
    store.append(b"DEADBEEF 1234").unwrap();
    let hash_before = store.integrity_hash();
    drop(store);

    let mut store =
        TagStore::open(ImageFile::open(&path).unwrap(), StoreConfig::internal()).unwrap();
    assert_eq!(store.integrity_hash(), hash_before);
    store.append(b"CAFEBABE 5678").unwrap();

    let ids: Vec<String> = store.scan().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["DEADBEEF", "CAFEBABE"]);
}

#[test]
fn test_blank_image_is_formatted_on_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blank.bin");

    let store = TagStore::open(
        ImageFile::open_or_create(&path, 1024).unwrap(),
        StoreConfig::internal(),
    )
    .unwrap();
    store.into_inner().sync().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 1024);
    assert_eq!(bytes[63], 1);
    assert_eq!(bytes[64], 0xFF);
}

#[test]
fn test_foreign_version_resets_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");

    {
        let image = ImageFile::create(&path, 1024).unwrap();
        let mut store = TagStore::open(image, StoreConfig::internal()).unwrap();
        store.append(b"DEADBEEF 1234").unwrap();
        store.into_inner().sync().unwrap();
    }

    // Firmware with a different layout left its own version behind
    let mut bytes = fs::read(&path).unwrap();
    bytes[63] = 7;
    fs::write(&path, &bytes).unwrap();

    let mut store =
        TagStore::open(ImageFile::open(&path).unwrap(), StoreConfig::internal()).unwrap();
    assert_eq!(store.scan().count(), 0);
    assert_eq!(store.storage_mut().read_byte(63), 1);

    // A second start sees a matching version and keeps the empty log
    drop(store);
    let mut store =
        TagStore::open(ImageFile::open(&path).unwrap(), StoreConfig::internal()).unwrap();
    assert_eq!(store.last_offset(), None);
    assert_eq!(store.scan().count(), 0);
}

#[test]
fn test_torn_append_leaves_earlier_records_readable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");

    {
        let image = ImageFile::create(&path, 1024).unwrap();
        let mut store = TagStore::open(image, StoreConfig::internal()).unwrap();
        store.append(b"00000001 1111").unwrap();
        store.into_inner().sync().unwrap();
    }

    // Power lost right after a length byte that overruns the region
    let mut bytes = fs::read(&path).unwrap();
    bytes[73] = 250;
    fs::write(&path, &bytes).unwrap();

    let config = StoreConfig {
        end_of_region: 300,
        ..StoreConfig::internal()
    };
    let mut store = TagStore::open(ImageFile::open(&path).unwrap(), config).unwrap();
    assert_eq!(store.find("00000001").unwrap(), "1111");
    assert_eq!(store.scan().count(), 1);
    assert_eq!(store.append(b"00000002 2222").unwrap(), 82);
}

#[test]
fn test_external_layout_on_image() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("store.toml");
    fs::write(&config_path, "backend = \"external\"\nend_of_region = 32767\n").unwrap();

    let config = StoreConfig::load(&config_path).unwrap();
    assert_eq!(config.backend, Backend::External);

    let path = dir.path().join("external.bin");
    let mut store =
        TagStore::open(ImageFile::create(&path, 32 * 1024).unwrap(), config.clone()).unwrap();
    for i in 0..500u32 {
        store.append(format!("{:08X} {:06}", i, i).as_bytes()).unwrap();
    }
    store.into_inner().sync().unwrap();

    let mut store = TagStore::open(ImageFile::open(&path).unwrap(), config).unwrap();
    assert_eq!(store.find("000001F3").unwrap(), "000499");
    assert_eq!(store.integrity_report().records, 500);
}
