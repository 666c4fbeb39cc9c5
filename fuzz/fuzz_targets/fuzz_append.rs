#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tagstore::{PageCache, SimulatedEeprom, StoreConfig, TagStore};

#[derive(Arbitrary, Debug)]
enum Op {
    Append(Vec<u8>),
    Find(String),
    Hash,
    Reset,
    Reinit,
}

// Arbitrary entries must either be appended and found again or be
// rejected without changing the log.
fuzz_target!(|ops: Vec<Op>| {
    let cache = PageCache::new(SimulatedEeprom::new(0x50), 0x50);
    let mut store = match TagStore::open(cache, StoreConfig::external()) {
        Ok(store) => store,
        Err(_) => return,
    };

    for op in ops.into_iter().take(256) {
        match op {
            Op::Append(entry) => {
                let before = store.last_offset();
                match store.append(&entry) {
                    Ok(next) => {
                        assert!(next < store.config().end_of_region);
                        let id = std::str::from_utf8(&entry[..8]).unwrap();
                        assert!(store.find(id).is_ok());
                    }
                    Err(_) => assert_eq!(store.last_offset(), before),
                }
            }
            Op::Find(id) => {
                let _ = store.find(&id);
            }
            Op::Hash => {
                let report = store.integrity_report();
                assert_eq!(report.hash, store.integrity_hash());
            }
            Op::Reset => {
                store.reset_all();
                assert_eq!(store.scan().count(), 0);
            }
            Op::Reinit => store.init(),
        }
    }
});
