//! Red-black tree implementation
//!
//! Arena-backed red-black tree mapping `String` keys to byte values.

use std::cmp::Ordering;
use std::mem;

/// Node color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

type Link = Option<usize>;

#[derive(Debug)]
struct Node {
    key: String,
    value: Vec<u8>,
    color: Color,
    left: Link,
    right: Link,
    /// Back-reference; never owns
    parent: Link,
}

/// Ordered map from string keys to byte values
#[derive(Debug, Default)]
pub struct RbTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Link,
    len: usize,
}

impl RbTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.find(key).map(|idx| self.nodes[idx].value.as_slice())
    }

    /// Look up a key for in-place value replacement
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Vec<u8>> {
        let idx = self.find(key)?;
        Some(&mut self.nodes[idx].value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Insert or overwrite an entry
    ///
    /// Returns `true` if a new node was created, `false` if an existing
    /// key had its value replaced.
    pub fn insert(&mut self, key: String, value: Vec<u8>) -> bool {
        let mut parent = None;
        let mut cursor = self.root;
        let mut went_left = false;

        while let Some(idx) = cursor {
            parent = Some(idx);
            match key.as_str().cmp(self.nodes[idx].key.as_str()) {
                Ordering::Less => {
                    cursor = self.nodes[idx].left;
                    went_left = true;
                }
                Ordering::Greater => {
                    cursor = self.nodes[idx].right;
                    went_left = false;
                }
                Ordering::Equal => {
                    self.nodes[idx].value = value;
                    return false;
                }
            }
        }

        let idx = self.allocate(key, value, parent);
        match parent {
            None => self.root = Some(idx),
            Some(p) if went_left => self.nodes[p].left = Some(idx),
            Some(p) => self.nodes[p].right = Some(idx),
        }
        self.len += 1;
        self.insert_fixup(idx);
        true
    }

    /// Remove a key, returning whether it was present
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(target) = self.find(key) else {
            return false;
        };

        // The node physically unlinked has at most one child: either the
        // target itself or its in-order successor.
        let spliced = match (self.nodes[target].left, self.nodes[target].right) {
            (Some(_), Some(right)) => self.minimum(right),
            _ => target,
        };

        let child = self.nodes[spliced].left.or(self.nodes[spliced].right);
        let child_parent = self.nodes[spliced].parent;
        if let Some(c) = child {
            self.nodes[c].parent = child_parent;
        }
        self.replace_child(child_parent, spliced, child);

        if spliced != target {
            let key = mem::take(&mut self.nodes[spliced].key);
            let value = mem::take(&mut self.nodes[spliced].value);
            self.nodes[target].key = key;
            self.nodes[target].value = value;
        }

        let removed_color = self.nodes[spliced].color;
        self.release(spliced);
        self.len -= 1;

        if removed_color == Color::Black {
            self.delete_fixup(child, child_parent);
        }
        true
    }

    /// In-order iterator over all entries
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Verify the red-black invariants
    ///
    /// Returns the black height of the tree, or a description of the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<usize, String> {
        if let Some(root) = self.root {
            if self.nodes[root].color != Color::Black {
                return Err("root is red".to_string());
            }
            if self.nodes[root].parent.is_some() {
                return Err("root has a parent".to_string());
            }
        }

        let mut count = 0;
        let height = self.check_subtree(self.root, None, None, &mut count)?;
        if count != self.len {
            return Err(format!("len is {} but {} nodes are reachable", self.len, count));
        }
        Ok(height)
    }

    fn check_subtree(
        &self,
        link: Link,
        lower: Option<&str>,
        upper: Option<&str>,
        count: &mut usize,
    ) -> Result<usize, String> {
        let Some(idx) = link else {
            return Ok(1);
        };
        let node = &self.nodes[idx];
        *count += 1;

        if lower.is_some_and(|lo| node.key.as_str() <= lo)
            || upper.is_some_and(|hi| node.key.as_str() >= hi)
        {
            return Err(format!("key {:?} is out of order", node.key));
        }

        for child in [node.left, node.right].into_iter().flatten() {
            if self.nodes[child].parent != Some(idx) {
                return Err(format!("child of {:?} has a stale parent link", node.key));
            }
            if node.color == Color::Red && self.nodes[child].color == Color::Red {
                return Err(format!("red node {:?} has a red child", node.key));
            }
        }

        let key = node.key.as_str();
        let left = self.check_subtree(node.left, lower, Some(key), count)?;
        let right = self.check_subtree(node.right, Some(key), upper, count)?;
        if left != right {
            return Err(format!(
                "black height differs under {:?}: {} vs {}",
                node.key, left, right
            ));
        }
        Ok(left + usize::from(node.color == Color::Black))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn find(&self, key: &str) -> Link {
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            cursor = match key.cmp(self.nodes[idx].key.as_str()) {
                Ordering::Less => self.nodes[idx].left,
                Ordering::Greater => self.nodes[idx].right,
                Ordering::Equal => return Some(idx),
            };
        }
        None
    }

    fn minimum(&self, mut idx: usize) -> usize {
        while let Some(left) = self.nodes[idx].left {
            idx = left;
        }
        idx
    }

    fn allocate(&mut self, key: String, value: Vec<u8>, parent: Link) -> usize {
        let node = Node {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
            parent,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) {
        let node = &mut self.nodes[idx];
        node.key = String::new();
        node.value = Vec::new();
        node.left = None;
        node.right = None;
        node.parent = None;
        self.free.push(idx);
    }

    fn is_red(&self, link: Link) -> bool {
        link.is_some_and(|idx| self.nodes[idx].color == Color::Red)
    }

    fn is_black(&self, link: Link) -> bool {
        !self.is_red(link)
    }

    fn paint(&mut self, link: Link, color: Color) {
        if let Some(idx) = link {
            self.nodes[idx].color = color;
        }
    }

    /// Point `parent`'s link (or the root) that referenced `old` at `new`
    fn replace_child(&mut self, parent: Link, old: usize, new: Link) {
        match parent {
            None => self.root = new,
            Some(p) if self.nodes[p].left == Some(old) => self.nodes[p].left = new,
            Some(p) => self.nodes[p].right = new,
        }
    }

    fn rotate_left(&mut self, x: usize) {
        let Some(y) = self.nodes[x].right else {
            return;
        };
        let inner = self.nodes[y].left;
        self.nodes[x].right = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn rotate_right(&mut self, x: usize) {
        let Some(y) = self.nodes[x].left else {
            return;
        };
        let inner = self.nodes[y].right;
        self.nodes[x].left = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn insert_fixup(&mut self, mut node: usize) {
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand) = self.nodes[parent].parent else {
                break;
            };

            if self.nodes[grand].left == Some(parent) {
                let uncle = self.nodes[grand].right;
                if self.is_red(uncle) {
                    self.nodes[parent].color = Color::Black;
                    self.paint(uncle, Color::Black);
                    self.nodes[grand].color = Color::Red;
                    node = grand;
                    continue;
                }
                let top = if self.nodes[parent].right == Some(node) {
                    self.rotate_left(parent);
                    node
                } else {
                    parent
                };
                self.nodes[top].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_right(grand);
                break;
            } else {
                let uncle = self.nodes[grand].left;
                if self.is_red(uncle) {
                    self.nodes[parent].color = Color::Black;
                    self.paint(uncle, Color::Black);
                    self.nodes[grand].color = Color::Red;
                    node = grand;
                    continue;
                }
                let top = if self.nodes[parent].left == Some(node) {
                    self.rotate_right(parent);
                    node
                } else {
                    parent
                };
                self.nodes[top].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_left(grand);
                break;
            }
        }
        self.paint(self.root, Color::Black);
    }

    /// Restore black height after unlinking a black node
    ///
    /// `node` is the replacement that took the removed node's place and may
    /// be empty, so its parent is tracked separately.
    fn delete_fixup(&mut self, mut node: Link, mut parent: Link) {
        while node != self.root && self.is_black(node) {
            let Some(p) = parent else {
                break;
            };

            if self.nodes[p].left == node {
                // The doubly-black side always has a sibling.
                let Some(mut sibling) = self.nodes[p].right else {
                    break;
                };
                if self.nodes[sibling].color == Color::Red {
                    self.nodes[sibling].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_left(p);
                    let Some(s) = self.nodes[p].right else {
                        break;
                    };
                    sibling = s;
                }

                let near = self.nodes[sibling].left;
                let far = self.nodes[sibling].right;
                if self.is_black(near) && self.is_black(far) {
                    self.nodes[sibling].color = Color::Red;
                    node = Some(p);
                    parent = self.nodes[p].parent;
                    continue;
                }

                if self.is_black(far) {
                    self.paint(near, Color::Black);
                    self.nodes[sibling].color = Color::Red;
                    self.rotate_right(sibling);
                    let Some(s) = self.nodes[p].right else {
                        break;
                    };
                    sibling = s;
                }

                self.nodes[sibling].color = self.nodes[p].color;
                self.nodes[p].color = Color::Black;
                let far = self.nodes[sibling].right;
                self.paint(far, Color::Black);
                self.rotate_left(p);
                node = self.root;
                parent = None;
            } else {
                let Some(mut sibling) = self.nodes[p].left else {
                    break;
                };
                if self.nodes[sibling].color == Color::Red {
                    self.nodes[sibling].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_right(p);
                    let Some(s) = self.nodes[p].left else {
                        break;
                    };
                    sibling = s;
                }

                let near = self.nodes[sibling].right;
                let far = self.nodes[sibling].left;
                if self.is_black(near) && self.is_black(far) {
                    self.nodes[sibling].color = Color::Red;
                    node = Some(p);
                    parent = self.nodes[p].parent;
                    continue;
                }

                if self.is_black(far) {
                    self.paint(near, Color::Black);
                    self.nodes[sibling].color = Color::Red;
                    self.rotate_left(sibling);
                    let Some(s) = self.nodes[p].left else {
                        break;
                    };
                    sibling = s;
                }

                self.nodes[sibling].color = self.nodes[p].color;
                self.nodes[p].color = Color::Black;
                let far = self.nodes[sibling].left;
                self.paint(far, Color::Black);
                self.rotate_right(p);
                node = self.root;
                parent = None;
            }
        }
        self.paint(node, Color::Black);
    }
}

/// In-order iterator over a tree's entries
pub struct Iter<'a> {
    tree: &'a RbTree,
    stack: Vec<usize>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut link: Link) {
        while let Some(idx) = link {
            self.stack.push(idx);
            link = self.tree.nodes[idx].left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let idx = self.stack.pop()?;
        self.push_left_spine(tree.nodes[idx].right);
        let node = &tree.nodes[idx];
        Some((node.key.as_str(), node.value.as_slice()))
    }
}

impl<'a> IntoIterator for &'a RbTree {
    type Item = (&'a str, &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
