#![no_main]

use libfuzzer_sys::fuzz_target;
use wrapped::model::decode_listen_data;
use wrapped::stats::{ListenDataStore, SortOption, summarize};

fuzz_target!(|data: &[u8]| {
    let Some((ops, body)) = data.split_first_chunk::<4>() else {
        return;
    };

    let mut store = ListenDataStore::new();
    store.begin_fetch();
    let decoded = decode_listen_data(body);
    let expected = decoded.as_ref().ok().map(|records| summarize(records));
    store.resolve(decoded);

    for op in ops {
        store.change_sort(SortOption::ALL[usize::from(*op) % SortOption::ALL.len()]);
        assert_eq!(store.summary(), expected);
        if let Some(data) = store.data() {
            assert_eq!(data.sorted().count(), data.len());
        }
    }
});
