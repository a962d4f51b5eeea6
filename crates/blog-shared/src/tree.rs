//! Threaded comment trees.
//!
//! Storage hands out comments as a flat, parent-referencing list. This module
//! turns that list into a forest of [`CommentNode`]s and provides lookups and
//! edits over the forest at any depth.

use std::collections::{HashMap, HashSet};

use crate::models::{Comment, CommentNode};

/// Result of [`build_forest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    pub roots: Vec<CommentNode>,
    /// Ids of comments whose parent was not in the input. They were promoted
    /// to roots.
    pub orphans: Vec<i64>,
}

/// Builds the reply forest for one article.
///
/// Roots and every `replies` list are ordered by `created_at`, ties broken by
/// `id`. A comment whose parent is missing (or is itself) becomes a root.
pub fn build_tree(flat: Vec<Comment>) -> Vec<CommentNode> {
    build_forest(flat).roots
}

/// Same as [`build_tree`] but also reports promoted orphans.
pub fn build_forest(mut flat: Vec<Comment>) -> Forest {
    flat.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let ids: HashSet<i64> = flat.iter().map(|c| c.id).collect();
    let mut children: HashMap<i64, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();
    let mut orphans = Vec::new();

    for comment in flat {
        match comment.parent_id {
            None => roots.push(comment),
            Some(parent_id) if parent_id != comment.id && ids.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(comment);
            }
            Some(_) => {
                orphans.push(comment.id);
                roots.push(comment);
            }
        }
    }

    // Children are removed from the map as they are attached, so comments
    // caught in a parent cycle are never reached and attaching terminates.
    let roots = roots
        .into_iter()
        .map(|comment| attach(comment, &mut children))
        .collect();

    Forest { roots, orphans }
}

fn attach(comment: Comment, children: &mut HashMap<i64, Vec<Comment>>) -> CommentNode {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, children))
        .collect();

    CommentNode { comment, replies }
}

/// Depth-first search over the whole forest.
pub fn find_node(forest: &[CommentNode], id: i64) -> Option<&CommentNode> {
    forest.iter().find_map(|node| {
        if node.id() == id {
            Some(node)
        } else {
            find_node(&node.replies, id)
        }
    })
}

pub fn find_node_mut(forest: &mut [CommentNode], id: i64) -> Option<&mut CommentNode> {
    for node in forest.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Detaches the node with `id`, together with its replies.
pub fn remove_node(forest: &mut Vec<CommentNode>, id: i64) -> Option<CommentNode> {
    if let Some(pos) = forest.iter().position(|node| node.id() == id) {
        return Some(forest.remove(pos));
    }
    forest
        .iter_mut()
        .find_map(|node| remove_node(&mut node.replies, id))
}

/// Removes every node whose id is in `ids` along with its subtree.
/// Returns the total number of nodes dropped.
pub fn prune(forest: &mut Vec<CommentNode>, ids: &HashSet<i64>) -> usize {
    let mut removed = 0;
    forest.retain(|node| {
        if ids.contains(&node.id()) {
            removed += 1 + count_nodes(&node.replies);
            false
        } else {
            true
        }
    });
    for node in forest.iter_mut() {
        removed += prune(&mut node.replies, ids);
    }
    removed
}

pub fn count_nodes(forest: &[CommentNode]) -> usize {
    forest
        .iter()
        .map(|node| 1 + count_nodes(&node.replies))
        .sum()
}

/// The node's own id first, then every descendant in pre-order.
pub fn subtree_ids(node: &CommentNode) -> Vec<i64> {
    let mut ids = vec![node.id()];
    for reply in &node.replies {
        ids.extend(subtree_ids(reply));
    }
    ids
}

pub fn max_id(forest: &[CommentNode]) -> Option<i64> {
    forest
        .iter()
        .map(|node| max_id(&node.replies).map_or(node.id(), |child| child.max(node.id())))
        .max()
}

/// Pre-order flattening, the inverse of [`build_tree`].
pub fn flatten(forest: &[CommentNode]) -> Vec<Comment> {
    walk(forest)
        .into_iter()
        .map(|(_, node)| node.comment.clone())
        .collect()
}

/// Pre-order walk yielding each node with its depth (roots are depth 0).
pub fn walk(forest: &[CommentNode]) -> Vec<(usize, &CommentNode)> {
    fn visit<'a>(nodes: &'a [CommentNode], depth: usize, out: &mut Vec<(usize, &'a CommentNode)>) {
        for node in nodes {
            out.push((depth, node));
            visit(&node.replies, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    visit(forest, 0, &mut out);
    out
}
