//! Block conversion primitives.
//!
//! Every conversion here replaces block values instead of mutating a kind in
//! place, and keeps node keys stable wherever the conversion is one-to-one
//! (a list item that becomes a top-level block inherits the item's key), so
//! selections survive conversions without remapping. The only keys that die
//! are dissolved list heads; selections pointing at one are re-anchored.

use crate::document::{
    merge_spans, Block, BlockKind, Document, FormatSet, HeadingLevel, ListItem, ListKind, NodeKey,
    Span, TextFormat,
};
use crate::editor::EditorState;

use super::selection::{
    covered_segments, has_format, ordered_endpoints, resolve_point, Point, RangeSelection,
    Selection, TextPos,
};

/// Target kind for a whole-selection block conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockTarget {
    Paragraph,
    Heading(HeadingLevel),
}

impl BlockTarget {
    fn build(self, spans: Vec<Span>) -> BlockKind {
        match self {
            BlockTarget::Paragraph => BlockKind::Paragraph { spans },
            BlockTarget::Heading(level) => BlockKind::Heading { level, spans },
        }
    }
}

/// Convert every top-level block touched by `range` to `target`.
///
/// Paragraphs and headings are rebuilt under their own key; a list is
/// spliced into one `target` block per item, each inheriting the item's key.
pub(crate) fn set_blocks_type(state: &mut EditorState, range: &RangeSelection, target: BlockTarget) {
    let Some((start, end)) = ordered_endpoints(state.document(), range) else {
        return;
    };
    // Reverse order keeps earlier indices valid across list splices.
    for idx in (start.0.block..=end.0.block).rev() {
        let block = state.document().blocks()[idx].clone();
        match block.kind() {
            BlockKind::Paragraph { spans } | BlockKind::Heading { spans, .. } => {
                state.document_mut().blocks_mut()[idx] =
                    Block::new(block.key(), target.build(spans.clone()));
            }
            BlockKind::List { items, .. } => {
                let replacements: Vec<Block> = items
                    .iter()
                    .map(|item| Block::new(item.key, target.build(item.spans.clone())))
                    .collect();
                let first_key = replacements.first().map(Block::key);
                state
                    .document_mut()
                    .blocks_mut()
                    .splice(idx..=idx, replacements);
                match first_key {
                    Some(first) => reanchor_key(state, block.key(), first),
                    None => clear_selection_on(state, block.key()),
                }
            }
        }
    }
}

/// Replace the block at `key` (paragraph or heading) with a paragraph
/// carrying the same content. Used for the heading-toggle downgrade path.
pub(crate) fn replace_block_with_paragraph(state: &mut EditorState, key: NodeKey) {
    let Some(idx) = state
        .document()
        .blocks()
        .iter()
        .position(|block| block.key() == key)
    else {
        return;
    };
    let spans = match state.document().blocks()[idx].kind() {
        BlockKind::Paragraph { spans } | BlockKind::Heading { spans, .. } => spans.clone(),
        BlockKind::List { .. } => return,
    };
    state.document_mut().blocks_mut()[idx] = Block::new(key, BlockKind::Paragraph { spans });
}

/// Collapse the blocks touched by the current selection into a single list
/// of `kind`: one item per paragraph or heading, items of existing lists
/// absorbed as they are. Item keys are the former block keys.
pub(crate) fn insert_list(state: &mut EditorState, kind: ListKind) {
    let Some(Selection::Range(range)) = state.selection().cloned() else {
        return;
    };
    let Some((start, end)) = ordered_endpoints(state.document(), &range) else {
        return;
    };
    let (a, b) = (start.0.block, end.0.block);

    let mut items: Vec<ListItem> = Vec::new();
    let mut dissolved_heads: Vec<NodeKey> = Vec::new();
    for block in &state.document().blocks()[a..=b] {
        match block.kind() {
            BlockKind::Paragraph { spans } | BlockKind::Heading { spans, .. } => {
                items.push(ListItem {
                    key: block.key(),
                    spans: spans.clone(),
                });
            }
            BlockKind::List { items: absorbed, .. } => {
                dissolved_heads.push(block.key());
                items.extend(absorbed.iter().cloned());
            }
        }
    }

    let key = state.document_mut().alloc_key();
    let list = Block::new(key, BlockKind::List { kind, items });
    state.document_mut().blocks_mut().splice(a..=b, [list]);
    for old in dissolved_heads {
        reanchor_key(state, old, key);
    }
}

/// If the anchor's top-level block is a list, splice it into one paragraph
/// per item. Paragraph keys are the former item keys.
pub(crate) fn remove_list(state: &mut EditorState) {
    let Some(Selection::Range(range)) = state.selection().cloned() else {
        return;
    };
    let Some((pos, _)) = resolve_point(state.document(), &range.anchor) else {
        return;
    };
    let idx = pos.block;
    let block = state.document().blocks()[idx].clone();
    let BlockKind::List { items, .. } = block.kind() else {
        return;
    };
    let replacements: Vec<Block> = items
        .iter()
        .map(|item| {
            Block::new(
                item.key,
                BlockKind::Paragraph {
                    spans: item.spans.clone(),
                },
            )
        })
        .collect();
    let first_key = replacements.first().map(Block::key);
    state
        .document_mut()
        .blocks_mut()
        .splice(idx..=idx, replacements);
    match first_key {
        Some(first) => reanchor_key(state, block.key(), first),
        None => clear_selection_on(state, block.key()),
    }
}

/// Toggle `format` over the selected text: if every covered character
/// already carries it, clear it, otherwise set it. Spans are split at the
/// range boundaries and re-merged afterwards. Collapsed ranges leave the
/// document untouched.
pub(crate) fn toggle_text_format(state: &mut EditorState, format: TextFormat) {
    let Some(Selection::Range(range)) = state.selection().cloned() else {
        return;
    };
    let Some((start, end)) = ordered_endpoints(state.document(), &range) else {
        return;
    };
    if start == end {
        return;
    }
    let enable = !has_format(state.document(), &range, format);
    for (pos, seg_start, seg_end) in covered_segments(state.document(), start, end) {
        let Some(spans) = spans_at_mut(state.document_mut(), pos) else {
            continue;
        };
        apply_format(spans, seg_start, seg_end, format.into(), enable);
        merge_spans(spans);
    }
}

fn spans_at_mut(document: &mut Document, pos: TextPos) -> Option<&mut Vec<Span>> {
    match document.blocks_mut().get_mut(pos.block)?.kind_mut() {
        BlockKind::List { items, .. } => Some(&mut items.get_mut(pos.item)?.spans),
        BlockKind::Paragraph { spans } | BlockKind::Heading { spans, .. } => Some(spans),
    }
}

/// Set or clear `set` over the character range `start..end`, splitting spans
/// that straddle a boundary.
fn apply_format(spans: &mut Vec<Span>, start: usize, end: usize, set: FormatSet, enable: bool) {
    let mut rebuilt: Vec<Span> = Vec::with_capacity(spans.len() + 2);
    let mut cursor = 0;
    for span in spans.drain(..) {
        let len = span.char_len();
        let lo = start.clamp(cursor, cursor + len);
        let hi = end.clamp(cursor, cursor + len);
        if lo >= hi {
            rebuilt.push(span);
        } else {
            let (before, rest) = split_chars(&span.text, lo - cursor);
            let (middle, after) = split_chars(&rest, hi - lo);
            if !before.is_empty() {
                rebuilt.push(Span::styled(before, span.formats));
            }
            let mut formats = span.formats;
            if enable {
                formats.insert(set);
            } else {
                formats.remove(set);
            }
            rebuilt.push(Span::styled(middle, formats));
            if !after.is_empty() {
                rebuilt.push(Span::styled(after, span.formats));
            }
        }
        cursor += len;
    }
    *spans = rebuilt;
}

fn split_chars(text: &str, at: usize) -> (String, String) {
    let byte = text
        .char_indices()
        .nth(at)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    (text[..byte].to_string(), text[byte..].to_string())
}

/// Re-point selection endpoints that referenced `from` (a key removed from
/// the tree) at `to`, resetting their offsets.
fn reanchor_key(state: &mut EditorState, from: NodeKey, to: NodeKey) {
    if let Some(Selection::Range(range)) = state.selection_mut().as_mut() {
        if range.anchor.key == from {
            range.anchor = Point::new(to, 0);
        }
        if range.focus.key == from {
            range.focus = Point::new(to, 0);
        }
    }
}

/// Drop the selection entirely if it referenced `key` and there is nothing
/// left to re-anchor to.
fn clear_selection_on(state: &mut EditorState, key: NodeKey) {
    let refers = match state.selection() {
        Some(Selection::Range(range)) => range.anchor.key == key || range.focus.key == key,
        Some(Selection::Node(nodes)) => nodes.keys.contains(&key),
        None => false,
    };
    if refers {
        state.set_selection(None);
    }
}
