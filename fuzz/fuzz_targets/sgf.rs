#![no_main]

use libfuzzer_sys::fuzz_target;
use sgf_reader::SgfReader;

fuzz_target!(|data: &[u8]| {
    let Ok(reader) = SgfReader::from_bytes(data) else {
        return;
    };
    let tree = reader.tree();
    let size = tree.board_size();
    assert!((1..=52).contains(&size));
    for (id, node) in tree.iter() {
        assert!(tree.children(id).iter().all(|child| tree.father(*child) == Some(id)));
        if let Some(p) = node.mv.and_then(|mv| mv.point) {
            assert!(p.is_on_board(size));
        }
    }
    assert_eq!(tree.iter().count(), tree.len());
});
