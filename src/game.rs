// This file is part of the sgf-reader library.
// Copyright (C) 2025 The sgf-reader developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! The game tree produced by the readers.
//!
//! Nodes live in an arena owned by the [`GameTree`] and refer to each other
//! by [`NodeId`].

use std::{
    collections::{BTreeMap, BTreeSet},
    iter::FusedIterator,
    ops,
};

use crate::{
    color::{ByColor, ByGoColor, Color, GoColor},
    point::GamePoint,
    props::PropertyTable,
    types::{Komi, MarkType, Marks, Move, TimeSettings},
};

/// Handle of a node in a [`GameTree`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Game information that applies to a node and its subtree.
#[allow(missing_docs)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Default, PartialEq, Debug)]
pub struct GameInfo {
    pub player: ByColor<Option<String>>,
    pub rank: ByColor<Option<String>>,
    pub team: ByColor<Option<String>>,
    pub komi: Option<Komi>,
    pub handicap: Option<u32>,
    pub result: Option<String>,
    pub rules: Option<String>,
    pub date: Option<String>,
    pub round: Option<String>,
    pub source: Option<String>,
    pub copyright: Option<String>,
    pub annotation: Option<String>,
    pub user: Option<String>,
    pub time_settings: Option<TimeSettings>,
}

/// Text fields of [`GameInfo`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum InfoField {
    Result,
    Rules,
    Date,
    Round,
    Source,
    Copyright,
    Annotation,
    User,
}

/// Text fields of [`GameInfo`] that exist for each color.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum PlayerField {
    Name,
    Rank,
    Team,
}

impl GameInfo {
    pub fn get(&self, field: InfoField) -> Option<&str> {
        match field {
            InfoField::Result => self.result.as_deref(),
            InfoField::Rules => self.rules.as_deref(),
            InfoField::Date => self.date.as_deref(),
            InfoField::Round => self.round.as_deref(),
            InfoField::Source => self.source.as_deref(),
            InfoField::Copyright => self.copyright.as_deref(),
            InfoField::Annotation => self.annotation.as_deref(),
            InfoField::User => self.user.as_deref(),
        }
    }

    pub fn set(&mut self, field: InfoField, value: impl Into<String>) {
        let slot = match field {
            InfoField::Result => &mut self.result,
            InfoField::Rules => &mut self.rules,
            InfoField::Date => &mut self.date,
            InfoField::Round => &mut self.round,
            InfoField::Source => &mut self.source,
            InfoField::Copyright => &mut self.copyright,
            InfoField::Annotation => &mut self.annotation,
            InfoField::User => &mut self.user,
        };
        *slot = Some(value.into());
    }

    pub fn get_player(&self, field: PlayerField, color: Color) -> Option<&str> {
        match field {
            PlayerField::Name => self.player.get(color),
            PlayerField::Rank => self.rank.get(color),
            PlayerField::Team => self.team.get(color),
        }
        .as_deref()
    }

    pub fn set_player(&mut self, field: PlayerField, color: Color, value: impl Into<String>) {
        let by_color = match field {
            PlayerField::Name => &mut self.player,
            PlayerField::Rank => &mut self.rank,
            PlayerField::Team => &mut self.team,
        };
        *by_color.get_mut(color) = Some(value.into());
    }

    /// Copies every field that is set in `other`.
    pub fn merge(&mut self, other: &GameInfo) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        for color in Color::ALL {
            take(self.player.get_mut(color), other.player.get(color));
            take(self.rank.get_mut(color), other.rank.get(color));
            take(self.team.get_mut(color), other.team.get(color));
        }
        take(&mut self.komi, &other.komi);
        take(&mut self.handicap, &other.handicap);
        take(&mut self.result, &other.result);
        take(&mut self.rules, &other.rules);
        take(&mut self.date, &other.date);
        take(&mut self.round, &other.round);
        take(&mut self.source, &other.source);
        take(&mut self.copyright, &other.copyright);
        take(&mut self.annotation, &other.annotation);
        take(&mut self.user, &other.user);
        take(&mut self.time_settings, &other.time_settings);
    }

    pub fn is_empty(&self) -> bool {
        *self == GameInfo::default()
    }
}

/// A node of the game tree.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Node {
    father: Option<NodeId>,
    children: Vec<NodeId>,
    /// Move played in this node.
    pub mv: Option<Move>,
    /// Setup stones. Points in `empty` are cleared.
    pub setup: ByGoColor<BTreeSet<GamePoint>>,
    /// Color to play, if set explicitly.
    pub player: Option<Color>,
    pub comment: Option<String>,
    /// Time left in seconds.
    pub time_left: ByColor<Option<f64>>,
    /// Moves left in the current overtime period.
    pub moves_left: ByColor<Option<u32>>,
    pub labels: BTreeMap<GamePoint, String>,
    pub marks: BTreeMap<GamePoint, Marks>,
    /// Evaluation of the position.
    pub value: Option<f32>,
    /// Game information that changes here.
    pub game_info: Option<Box<GameInfo>>,
    /// Properties without a typed representation, kept verbatim.
    pub raw: PropertyTable,
}

impl Node {
    pub fn father(&self) -> Option<NodeId> {
        self.father
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Adds a setup stone, or clears the point for [`GoColor::Empty`].
    pub fn add_stone(&mut self, color: GoColor, p: GamePoint) {
        for other in GoColor::ALL {
            if other != color {
                self.setup.get_mut(other).remove(&p);
            }
        }
        self.setup.get_mut(color).insert(p);
    }

    pub fn has_setup(&self) -> bool {
        self.setup.any(|points| !points.is_empty())
    }

    pub fn add_mark(&mut self, p: GamePoint, mark: MarkType) {
        *self.marks.entry(p).or_default() |= mark.flag();
    }

    pub fn marked(&self, mark: MarkType) -> impl Iterator<Item = GamePoint> + '_ {
        self.marks
            .iter()
            .filter(move |(_, marks)| marks.has(mark))
            .map(|(p, _)| *p)
    }

    /// Game information of this node, created on first use.
    pub fn game_info_mut(&mut self) -> &mut GameInfo {
        self.game_info.get_or_insert_with(Box::default)
    }

    /// Tests if the node carries no information at all.
    pub fn is_empty(&self) -> bool {
        self.mv.is_none()
            && !self.has_setup()
            && self.player.is_none()
            && self.comment.is_none()
            && !self.time_left.any(Option::is_some)
            && !self.moves_left.any(Option::is_some)
            && self.labels.is_empty()
            && self.marks.is_empty()
            && self.value.is_none()
            && self.game_info.as_ref().is_none_or(|info| info.is_empty())
            && self.raw.is_empty()
    }
}

/// A game tree with a fixed board size.
///
/// The root always has [`GameInfo`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GameTree {
    board_size: u8,
    nodes: Vec<Node>,
}

impl GameTree {
    pub fn board_size(&self) -> u8 {
        self.board_size
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`, since there is at least the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn father(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).father
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Game information in effect at a node: the information of the nearest
    /// node on the path to the root that has any.
    pub fn game_info(&self, id: NodeId) -> &GameInfo {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id);
            if let Some(ref info) = node.game_info {
                return info;
            }
            current = node.father;
        }
        // Only reached if the root information was removed.
        const EMPTY: &GameInfo = &GameInfo {
            player: ByColor {
                black: None,
                white: None,
            },
            rank: ByColor {
                black: None,
                white: None,
            },
            team: ByColor {
                black: None,
                white: None,
            },
            komi: None,
            handicap: None,
            result: None,
            rules: None,
            date: None,
            round: None,
            source: None,
            copyright: None,
            annotation: None,
            user: None,
            time_settings: None,
        };
        EMPTY
    }

    /// Number of edges between the root and the node.
    pub fn depth(&self, id: NodeId) -> usize {
        self.path_to_root(id).count() - 1
    }

    /// Iterates from a node up to the root, both included.
    pub fn path_to_root(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |id| self.father(*id))
    }

    /// Tests if the node is reached from the root by always following the
    /// first child.
    pub fn is_in_main_variation(&self, id: NodeId) -> bool {
        let mut id = id;
        while let Some(father) = self.father(id) {
            if self.child(father, 0) != Some(id) {
                return false;
            }
            id = father;
        }
        true
    }

    /// Iterates over the main variation, starting at the root.
    pub fn main_variation(&self) -> MainVariation<'_> {
        MainVariation {
            tree: self,
            next: Some(self.root()),
        }
    }

    /// Iterates over all nodes in depth-first order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        let mut stack = vec![self.root()];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let node = self.node(id);
            stack.extend(node.children.iter().rev());
            Some((id, node))
        })
    }
}

impl ops::Index<NodeId> for GameTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.node(id)
    }
}

impl ops::IndexMut<NodeId> for GameTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_mut(id)
    }
}

/// Iterator over the main variation. See [`GameTree::main_variation()`].
#[derive(Debug, Clone)]
pub struct MainVariation<'a> {
    tree: &'a GameTree,
    next: Option<NodeId>,
}

impl Iterator for MainVariation<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.child(id, 0);
        Some(id)
    }
}

impl FusedIterator for MainVariation<'_> {}

/// Arena under construction. Starts with an empty root.
#[derive(Debug)]
pub(crate) struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> TreeBuilder {
        TreeBuilder {
            nodes: vec![Node::default()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Appends a new last child.
    pub fn append(&mut self, father: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            father: Some(father),
            ..Node::default()
        });
        self.nodes[father.0].children.push(id);
        id
    }

    pub fn build(mut self, board_size: u8) -> GameTree {
        self.nodes[0].game_info_mut();
        GameTree {
            board_size,
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GameTree {
        // root - a - b
        //          \ c - d
        let mut builder = TreeBuilder::new();
        let root = builder.root();
        let a = builder.append(root);
        let _b = builder.append(a);
        let c = builder.append(a);
        let _d = builder.append(c);
        builder.build(9)
    }

    #[test]
    fn test_navigation() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.father(root), None);
        let a = tree.child(root, 0).expect("first child");
        assert_eq!(tree.children(a).len(), 2);
        let c = tree.child(a, 1).expect("second child");
        let d = tree.child(c, 0).expect("variation child");
        assert_eq!(tree.depth(d), 3);
        assert!(tree.is_in_main_variation(a));
        assert!(!tree.is_in_main_variation(c));
        assert!(!tree.is_in_main_variation(d));
        assert_eq!(tree.main_variation().count(), 3);
        assert_eq!(tree.iter().map(|(id, _)| id.index()).collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_game_info_inheritance() {
        let mut tree = sample();
        let root = tree.root();
        tree[root].game_info_mut().komi = Some(Komi::new(6.5).expect("finite"));
        let a = tree.child(root, 0).expect("child");
        let c = tree.child(a, 1).expect("variation");
        tree[c].game_info_mut().handicap = Some(2);
        let d = tree.child(c, 0).expect("grandchild");

        assert_eq!(tree.game_info(a).komi.map(Komi::value), Some(6.5));
        assert_eq!(tree.game_info(d).handicap, Some(2));
        assert_eq!(tree.game_info(d).komi, None);
    }

    #[test]
    fn test_setup() {
        let mut node = Node::default();
        assert!(node.is_empty());
        let p = GamePoint::new(3, 3);
        node.add_stone(GoColor::Black, p);
        node.add_stone(GoColor::White, p);
        assert!(node.setup.black.is_empty());
        assert!(node.setup.white.contains(&p));
        assert!(node.has_setup());
        assert!(!node.is_empty());
    }

    #[test]
    fn test_marks() {
        let mut node = Node::default();
        let p = GamePoint::new(0, 0);
        node.add_mark(p, MarkType::Circle);
        node.add_mark(p, MarkType::Select);
        assert_eq!(node.marked(MarkType::Select).collect::<Vec<_>>(), [p]);
        assert_eq!(node.marked(MarkType::Square).count(), 0);
    }

    #[test]
    fn test_info_fields() {
        let mut info = GameInfo::default();
        info.set(InfoField::Result, "B+R");
        info.set_player(PlayerField::Name, Color::White, "Shusaku");
        assert_eq!(info.get(InfoField::Result), Some("B+R"));
        assert_eq!(info.get_player(PlayerField::Name, Color::White), Some("Shusaku"));
        assert_eq!(info.get_player(PlayerField::Name, Color::Black), None);

        let mut merged = GameInfo::default();
        merged.set(InfoField::Date, "1846");
        merged.merge(&info);
        assert_eq!(merged.date.as_deref(), Some("1846"));
        assert_eq!(merged.result.as_deref(), Some("B+R"));
    }
}
