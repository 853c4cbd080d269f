#![no_main]

use libfuzzer_sys::fuzz_target;
use sgf_reader::{
    point::{self, Decoded},
    GamePoint,
};

fuzz_target!(|input: (GamePoint, u8)| {
    let (p, size) = input;
    let size = size % 52 + 1;
    if !p.is_on_board(size) {
        return;
    }
    let encoded = p.to_sgf(size);
    let decoded = point::parse_sgf(&encoded, size).expect("roundtrip");
    assert_eq!(decoded, Decoded::Point(p));
});
