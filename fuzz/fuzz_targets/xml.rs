#![no_main]

use libfuzzer_sys::fuzz_target;
use sgf_reader::XmlReader;

fuzz_target!(|data: &[u8]| {
    if let Ok(reader) = XmlReader::from_bytes(data) {
        let tree = reader.tree();
        assert!(tree[tree.root()].game_info.is_some());
        assert_eq!(tree.iter().count(), tree.len());
    }
});
