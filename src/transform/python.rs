//! Python literal truncation
//!
//! Shrinks list, set and dict displays to a bounded number of entries.
//! Source is parsed with tree-sitter and only the byte ranges holding the
//! dropped entries are removed, so formatting, comments and quoting of
//! everything else survive untouched.

use tree_sitter::{Node, Parser};

/// Replacement of `start..end` with `text`
type Edit = (usize, usize, &'static str);

/// Truncate large literals in Python source.
///
/// Returns the transformed text and whether the source parsed. On a parse
/// failure the original text is returned unchanged with `false`.
pub fn truncate(source: &str, max_elements: usize) -> (String, bool) {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
        log::warn!("Failed to load Python grammar: {}", e);
        return (source.to_string(), false);
    }

    let Some(tree) = parser.parse(source, None) else {
        log::warn!("Failed to parse Python source");
        return (source.to_string(), false);
    };

    let root = tree.root_node();
    if root.has_error() {
        let pos = first_error(root).map(|n| n.start_position());
        match pos {
            Some(p) => log::warn!(
                "Failed to parse Python source: syntax error at line {}, column {}",
                p.row + 1,
                p.column + 1
            ),
            None => log::warn!("Failed to parse Python source: syntax error"),
        }
        return (source.to_string(), false);
    }
    if let Some(node) = first_legacy_statement(root) {
        let p = node.start_position();
        log::warn!(
            "Failed to parse Python source: Python 2 {} at line {}, column {}",
            node.kind().replace('_', " "),
            p.row + 1,
            p.column + 1
        );
        return (source.to_string(), false);
    }

    let mut edits = Vec::new();
    collect_edits(root, max_elements, &mut edits);
    (apply_edits(source, edits), true)
}

fn collect_edits(node: Node, max: usize, edits: &mut Vec<Edit>) {
    if is_collection(node.kind()) {
        let entries = entries(node);
        if entries.len() > max {
            if let Some(edit) = truncation_edit(node, &entries, max) {
                edits.push(edit);
            }
            for entry in entries.into_iter().take(max) {
                collect_edits(entry, max, edits);
            }
            return;
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_edits(child, max, edits);
    }
}

fn is_collection(kind: &str) -> bool {
    matches!(kind, "list" | "set" | "dictionary")
}

/// Elements of a list/set, or key-value pairs (and `**splat`s) of a dict
fn entries(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn truncation_edit(node: Node, entries: &[Node], max: usize) -> Option<Edit> {
    let last = entries.last()?;

    if max == 0 {
        // `{}` is a dict, an empty set has to be spelled as a call
        if node.kind() == "set" {
            return Some((node.start_byte(), node.end_byte(), "set()"));
        }
        let open = node.child(0)?;
        let close = node.child(node.child_count().checked_sub(1)?)?;
        return Some((open.end_byte(), close.start_byte(), ""));
    }

    let keep = entries.get(max - 1)?;
    Some((keep.end_byte(), last.end_byte(), ""))
}

/// Apply non-overlapping edits back to front so earlier offsets stay valid
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    let mut out = source.to_string();
    for (start, end, text) in edits {
        if start > end || end > out.len() {
            continue;
        }
        out.replace_range(start..end, text);
    }
    out
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

/// Statements the grammar still accepts but Python 3 rejects
fn first_legacy_statement(node: Node) -> Option<Node> {
    if matches!(node.kind(), "print_statement" | "exec_statement") {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_legacy_statement)
}
