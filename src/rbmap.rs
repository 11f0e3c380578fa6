use std::fmt;
use std::sync::Arc;

/// A persistent ordered map backed by a red-black tree.
///
/// `insert` returns a new map sharing all untouched subtrees with the old
/// one, which makes snapshotting the elaboration state cheap. Inserting an
/// existing key silently overwrites; scope shadowing and notation override
/// rely on this.
pub struct Map<K, V> {
    root: Tree<K, V>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

enum Tree<K, V> {
    Leaf,
    Node(Arc<Node<K, V>>),
}

struct Node<K, V> {
    color: Color,
    left: Tree<K, V>,
    key: K,
    value: V,
    right: Tree<K, V>,
}

impl<K, V> Clone for Tree<K, V> {
    fn clone(&self) -> Self {
        match self {
            Tree::Leaf => Tree::Leaf,
            Tree::Node(node) => Tree::Node(Arc::clone(node)),
        }
    }
}

impl<K, V> Clone for Map<K, V> {
    fn clone(&self) -> Self {
        Map {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for Map<K, V> {
    fn default() -> Self {
        Map { root: Tree::Leaf }
    }
}

fn mk_node<K, V>(color: Color, left: Tree<K, V>, key: K, value: V, right: Tree<K, V>) -> Tree<K, V> {
    Tree::Node(Arc::new(Node {
        color,
        left,
        key,
        value,
        right,
    }))
}

impl<K: Ord + Clone, V: Clone> Map<K, V> {
    pub fn new() -> Self {
        Map::default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.root, Tree::Leaf)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        let mut tree = &self.root;
        while let Tree::Node(node) = tree {
            match key.cmp(&node.key) {
                std::cmp::Ordering::Less => tree = &node.left,
                std::cmp::Ordering::Greater => tree = &node.right,
                std::cmp::Ordering::Equal => return Some(&node.value),
            }
        }
        None
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn insert(&self, key: K, value: V) -> Map<K, V> {
        let root = match ins(&self.root, key, value) {
            Tree::Node(node) if node.color == Color::Red => {
                // the root is always blackened
                mk_node(
                    Color::Black,
                    node.left.clone(),
                    node.key.clone(),
                    node.value.clone(),
                    node.right.clone(),
                )
            }
            tree => tree,
        };
        Map { root }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: vec![] };
        iter.push_left(&self.root);
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }
}

fn ins<K: Ord + Clone, V: Clone>(tree: &Tree<K, V>, key: K, value: V) -> Tree<K, V> {
    let Tree::Node(node) = tree else {
        return mk_node(Color::Red, Tree::Leaf, key, value, Tree::Leaf);
    };
    match key.cmp(&node.key) {
        std::cmp::Ordering::Less => balance(
            node.color,
            ins(&node.left, key, value),
            node.key.clone(),
            node.value.clone(),
            node.right.clone(),
        ),
        std::cmp::Ordering::Greater => balance(
            node.color,
            node.left.clone(),
            node.key.clone(),
            node.value.clone(),
            ins(&node.right, key, value),
        ),
        std::cmp::Ordering::Equal => mk_node(
            node.color,
            node.left.clone(),
            key,
            value,
            node.right.clone(),
        ),
    }
}

fn is_red<K, V>(tree: &Tree<K, V>) -> bool {
    matches!(tree, Tree::Node(node) if node.color == Color::Red)
}

/// Repairs a red-red violation directly below a black node by rotating the
/// offending pair into a red node with two black children.
fn balance<K: Ord + Clone, V: Clone>(
    color: Color,
    left: Tree<K, V>,
    key: K,
    value: V,
    right: Tree<K, V>,
) -> Tree<K, V> {
    if color == Color::Black {
        // left-leaning violations
        if let Tree::Node(l) = &left {
            if l.color == Color::Red {
                if let Tree::Node(ll) = &l.left {
                    if ll.color == Color::Red {
                        return mk_node(
                            Color::Red,
                            mk_node(
                                Color::Black,
                                ll.left.clone(),
                                ll.key.clone(),
                                ll.value.clone(),
                                ll.right.clone(),
                            ),
                            l.key.clone(),
                            l.value.clone(),
                            mk_node(Color::Black, l.right.clone(), key, value, right),
                        );
                    }
                }
                if let Tree::Node(lr) = &l.right {
                    if lr.color == Color::Red {
                        return mk_node(
                            Color::Red,
                            mk_node(
                                Color::Black,
                                l.left.clone(),
                                l.key.clone(),
                                l.value.clone(),
                                lr.left.clone(),
                            ),
                            lr.key.clone(),
                            lr.value.clone(),
                            mk_node(Color::Black, lr.right.clone(), key, value, right),
                        );
                    }
                }
            }
        }
        // right-leaning violations
        if let Tree::Node(r) = &right {
            if r.color == Color::Red {
                if let Tree::Node(rl) = &r.left {
                    if rl.color == Color::Red {
                        return mk_node(
                            Color::Red,
                            mk_node(Color::Black, left, key, value, rl.left.clone()),
                            rl.key.clone(),
                            rl.value.clone(),
                            mk_node(
                                Color::Black,
                                rl.right.clone(),
                                r.key.clone(),
                                r.value.clone(),
                                r.right.clone(),
                            ),
                        );
                    }
                }
                if let Tree::Node(rr) = &r.right {
                    if rr.color == Color::Red {
                        return mk_node(
                            Color::Red,
                            mk_node(Color::Black, left, key, value, r.left.clone()),
                            r.key.clone(),
                            r.value.clone(),
                            mk_node(
                                Color::Black,
                                rr.left.clone(),
                                rr.key.clone(),
                                rr.value.clone(),
                                rr.right.clone(),
                            ),
                        );
                    }
                }
            }
        }
    }
    mk_node(color, left, key, value, right)
}

pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut tree: &'a Tree<K, V>) {
        while let Tree::Node(node) = tree {
            self.stack.push(node);
            tree = &node.left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(&node.right);
        Some((&node.key, &node.value))
    }
}

impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map = map.insert(k, v);
        }
        map
    }
}

impl<K: fmt::Debug + Ord + Clone, V: fmt::Debug + Clone> fmt::Debug for Map<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
