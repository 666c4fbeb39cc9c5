#![no_main]
use libfuzzer_sys::fuzz_target;
use tagstore::{InternalEeprom, StoreConfig, TagStore};

// Any device contents must scan to completion without panicking, and
// an append afterwards must land where the scan stopped.
fuzz_target!(|data: &[u8]| {
    let mut image = [0xFFu8; 1024];
    let len = data.len().min(image.len());
    image[..len].copy_from_slice(&data[..len]);

    let mut store =
        match TagStore::open(InternalEeprom::<1024>::from_image(&image), StoreConfig::internal()) {
            Ok(store) => store,
            Err(_) => return,
        };

    let records = store.scan().count();
    let end = store.last_offset();
    let hash = store.integrity_hash();
    assert_eq!(store.scan().count(), records);
    assert_eq!(store.integrity_hash(), hash);

    if let (Some(end), Ok(next)) = (end, store.append(b"00C0FFEE 4321")) {
        assert_eq!(next, end + 9);
        assert_eq!(store.scan().count(), records + 1);
    }
});
