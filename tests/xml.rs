use std::time::Duration;

use sgf_reader::{
    Color, ErrorKind, GamePoint, MarkType, Move, PlayerField, TimeSettings, XmlReader,
};

#[test]
fn test_open_game() {
    let reader = XmlReader::open("tests/data/game.xml").expect("valid xml");
    assert!(reader.warnings().is_empty(), "{:?}", reader.warnings());

    let tree = reader.tree();
    assert_eq!(tree.board_size(), 9);
    assert_eq!(tree.len(), 6);

    let root = tree.root();
    assert_eq!(
        tree[root].comment.as_deref(),
        Some("A short demo game, with a line break.\nSecond paragraph.")
    );
    assert_eq!(tree[root].raw.value("GN", 0), Ok("Demo"));

    let info = tree.game_info(root);
    assert_eq!(info.get_player(PlayerField::Name, Color::Black), Some("Black"));
    assert_eq!(info.komi.map(|k| k.value()), Some(6.5));
    assert_eq!(info.result.as_deref(), Some("B+R"));
    assert_eq!(
        info.time_settings,
        Some(TimeSettings::Byoyomi {
            main: Duration::from_secs(600),
            period: Duration::from_secs(300),
            moves: 10,
        })
    );

    let e5 = tree.child(root, 0).expect("first move");
    assert_eq!(tree[e5].mv, Some(Move::new(Color::Black, GamePoint::new(4, 4))));
    assert_eq!(*tree[e5].time_left.get(Color::Black), Some(590.0));
    assert_eq!(tree.children(e5).len(), 2);

    let c3 = tree.child(e5, 0).expect("main line");
    let g3 = tree.child(c3, 0).expect("last node");
    let last = &tree[g3];
    assert_eq!(last.mv, Some(Move::new(Color::Black, GamePoint::new(6, 2))));
    assert!(last.setup.white.contains(&GamePoint::new(0, 0)));
    assert_eq!(last.player, Some(Color::White));

    let g7 = tree.child(e5, 1).expect("variation");
    assert_eq!(tree[g7].mv, Some(Move::new(Color::White, GamePoint::new(6, 6))));
    let marked = tree.child(g7, 0).expect("variation node");
    assert!(tree[marked].marks[&GamePoint::new(6, 6)].has(MarkType::Triangle));
    assert_eq!(
        tree[marked].labels.get(&GamePoint::new(4, 6)).map(String::as_str),
        Some("A")
    );
    assert_eq!(tree.main_variation().count(), 4);
}

#[test]
fn test_moves_as_text_content() {
    let xml = "<Go><GoGame><Nodes><Node><Black>C3</Black></Node>\
               <Node><White><at>D4</at></White></Node></Nodes></GoGame></Go>";
    let reader = XmlReader::from_bytes(xml.as_bytes()).expect("valid xml");
    let tree = reader.tree();
    let moves: Vec<_> = tree.main_variation().filter_map(|id| tree[id].mv).collect();
    assert_eq!(
        moves,
        [
            Move::new(Color::Black, GamePoint::new(2, 2)),
            Move::new(Color::White, GamePoint::new(3, 3)),
        ]
    );
}

#[test]
fn test_pass() {
    let xml = "<Go><GoGame><Nodes><Node/><Black at=\"\"/><White>pass</White></Nodes></GoGame></Go>";
    let reader = XmlReader::from_bytes(xml.as_bytes()).expect("valid xml");
    let tree = reader.tree();
    let moves: Vec<_> = tree.main_variation().filter_map(|id| tree[id].mv).collect();
    assert_eq!(moves, [Move::pass(Color::Black), Move::pass(Color::White)]);
}

#[test]
fn test_line_element() {
    let xml = "<Go><GoGame><Nodes><Node><Comment><P>a<Line/>b</P></Comment></Node></Nodes></GoGame></Go>";
    let reader = XmlReader::from_bytes(xml.as_bytes()).expect("valid xml");
    assert!(reader
        .warnings()
        .contains("Element \"Line\" cannot be child of element \"P\""));
}

#[test]
fn test_multiple_nodes_elements() {
    let xml = "<Go><GoGame><Nodes/><Nodes/></GoGame></Go>";
    let err = XmlReader::from_bytes(xml.as_bytes()).expect_err("two trees");
    assert!(matches!(err.kind, ErrorKind::MultipleNodes));
}

#[test]
fn test_unsupported_board_size() {
    let xml = "<Go><GoGame><Information><BoardSize>99</BoardSize></Information></GoGame></Go>";
    let err = XmlReader::from_bytes(xml.as_bytes()).expect_err("too large");
    assert!(matches!(err.kind, ErrorKind::UnsupportedBoardSize));

    let xml = "<Go><GoGame><Information><BoardSize>big</BoardSize></Information></GoGame></Go>";
    let err = XmlReader::from_bytes(xml.as_bytes()).expect_err("not a number");
    assert_eq!(err.kind.to_string(), "Expected integer in element BoardSize");
}

#[test]
fn test_malformed_xml() {
    let xml = "<Go>\n<GoGame>\n</Go>";
    let err = XmlReader::from_bytes(xml.as_bytes()).expect_err("mismatched tags");
    assert!(matches!(err.kind, ErrorKind::Xml(_)));
    assert_eq!(err.line, Some(3));
}

#[test]
fn test_point_outside_board() {
    let xml = "<Go><GoGame><Information><BoardSize>9</BoardSize></Information>\
               <Nodes><Node><Black at=\"K10\"/></Node></Nodes></GoGame></Go>";
    let err = XmlReader::from_bytes(xml.as_bytes()).expect_err("outside board");
    assert!(matches!(err.kind, ErrorKind::Point(_)));
}

#[test]
fn test_sgf_player_names() {
    let xml = "<Go><GoGame><Nodes><Node><SGF type=\"PL\"><Arg>black</Arg></SGF></Node>\
               <Node><SGF type=\"PL\"><Arg> W </Arg></SGF></Node>\
               <Node><SGF type=\"PL\"><Arg>purple</Arg></SGF></Node></Nodes></GoGame></Go>";
    let reader = XmlReader::from_bytes(xml.as_bytes()).expect("invalid player is not fatal");
    let tree = reader.tree();
    let players: Vec<_> = tree.main_variation().map(|id| tree[id].player).collect();
    assert_eq!(players, [Some(Color::Black), Some(Color::White), None]);
    assert!(reader.warnings().contains("Invalid color value"));
}
