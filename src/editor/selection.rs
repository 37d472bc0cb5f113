//! Selections and the read-only query layer over them.
//!
//! A selection is an ephemeral value scoped to one document state: it refers
//! to nodes by key, and is only meaningful against the state it was obtained
//! from. The readers here resolve those keys against a document and answer
//! format and block queries; a key that no longer resolves makes the reader
//! degrade to "nothing selected" rather than fail.

use crate::document::{BlockKind, Document, FormatSet, NodeKey, Span, TextFormat};
use crate::error::EditorError;

/// A position inside a text-bearing node: the node's key plus a character
/// offset into its concatenated span text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

/// A text selection between two points. Anchor and focus may be in either
/// document order; a collapsed range is a caret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// A selection of whole nodes, with no active text range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSelection {
    pub keys: Vec<NodeKey>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Range(RangeSelection),
    Node(NodeSelection),
}

impl Selection {
    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range(RangeSelection::new(anchor, focus))
    }

    pub fn caret(key: NodeKey, offset: usize) -> Self {
        Selection::Range(RangeSelection::caret(Point::new(key, offset)))
    }

    pub fn nodes(keys: Vec<NodeKey>) -> Self {
        Selection::Node(NodeSelection { keys })
    }

    /// Whether this is a text range selection (collapsed carets included).
    pub fn is_range(&self) -> bool {
        matches!(self, Selection::Range(_))
    }

    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            Selection::Node(_) => None,
        }
    }
}

/// Document-order position of a text-bearing node: top-level block index
/// plus item index within a list (0 for paragraphs and headings).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TextPos {
    pub(crate) block: usize,
    pub(crate) item: usize,
}

/// Resolve a point to its text position and clamped character offset.
pub(crate) fn resolve_point(document: &Document, point: &Point) -> Option<(TextPos, usize)> {
    for (block_idx, block) in document.blocks().iter().enumerate() {
        match block.kind() {
            BlockKind::List { items, .. } => {
                if block.key() == point.key {
                    // A list head is not text-bearing; treat it as the start
                    // of its first item.
                    return Some((
                        TextPos {
                            block: block_idx,
                            item: 0,
                        },
                        0,
                    ));
                }
                for (item_idx, item) in items.iter().enumerate() {
                    if item.key == point.key {
                        return Some((
                            TextPos {
                                block: block_idx,
                                item: item_idx,
                            },
                            point.offset.min(char_len(&item.spans)),
                        ));
                    }
                }
            }
            BlockKind::Paragraph { spans } | BlockKind::Heading { spans, .. } => {
                if block.key() == point.key {
                    return Some((
                        TextPos {
                            block: block_idx,
                            item: 0,
                        },
                        point.offset.min(char_len(spans)),
                    ));
                }
            }
        }
    }
    None
}

fn char_len(spans: &[Span]) -> usize {
    spans.iter().map(Span::char_len).sum()
}

/// Both endpoints resolved and put into document order, or `None` if either
/// endpoint is detached.
pub(crate) fn ordered_endpoints(
    document: &Document,
    range: &RangeSelection,
) -> Option<((TextPos, usize), (TextPos, usize))> {
    let a = resolve_point(document, &range.anchor)?;
    let b = resolve_point(document, &range.focus)?;
    Some(if a <= b { (a, b) } else { (b, a) })
}

/// The spans of the text-bearing node at `pos`.
pub(crate) fn spans_at<'a>(document: &'a Document, pos: TextPos) -> Option<&'a [Span]> {
    match document.blocks().get(pos.block)?.kind() {
        BlockKind::List { items, .. } => Some(&items.get(pos.item)?.spans),
        BlockKind::Paragraph { spans } | BlockKind::Heading { spans, .. } => Some(spans),
    }
}

/// Every text-bearing node touched by the ordered endpoints, with the
/// covered character range (start inclusive, end exclusive) inside each.
/// Nodes whose covered range is empty are omitted.
pub(crate) fn covered_segments(
    document: &Document,
    start: (TextPos, usize),
    end: (TextPos, usize),
) -> Vec<(TextPos, usize, usize)> {
    let mut result = Vec::new();
    for (block_idx, block) in document.blocks().iter().enumerate() {
        if block_idx < start.0.block || block_idx > end.0.block {
            continue;
        }
        let items = match block.kind() {
            BlockKind::List { items, .. } => items.len(),
            _ => 1,
        };
        for item_idx in 0..items {
            let pos = TextPos {
                block: block_idx,
                item: item_idx,
            };
            if pos < start.0 || pos > end.0 {
                continue;
            }
            let Some(spans) = spans_at(document, pos) else {
                continue;
            };
            let len = char_len(spans);
            let seg_start = if pos == start.0 { start.1 } else { 0 };
            let seg_end = if pos == end.0 { end.1 } else { len };
            if seg_start < seg_end {
                result.push((pos, seg_start, seg_end));
            }
        }
    }
    result
}

/// The formats at a caret: those of the span containing the character just
/// before the caret, or of the first span for a caret at offset zero.
fn caret_formats(spans: &[Span], offset: usize) -> FormatSet {
    if offset == 0 {
        return spans.first().map(|span| span.formats).unwrap_or_default();
    }
    let mut cursor = 0;
    for span in spans {
        let len = span.char_len();
        if offset <= cursor + len {
            return span.formats;
        }
        cursor += len;
    }
    spans.last().map(|span| span.formats).unwrap_or_default()
}

/// Whether every character covered by the range carries `format`.
///
/// A collapsed range reports the format at the caret; a range covering no
/// characters at all reports `false`.
pub fn has_format(document: &Document, range: &RangeSelection, format: TextFormat) -> bool {
    let Some((start, end)) = ordered_endpoints(document, range) else {
        return false;
    };
    let wanted = FormatSet::from(format);
    if start == end {
        let Some(spans) = spans_at(document, start.0) else {
            return false;
        };
        return caret_formats(spans, start.1).contains(wanted);
    }

    let mut any = false;
    for (pos, seg_start, seg_end) in covered_segments(document, start, end) {
        let Some(spans) = spans_at(document, pos) else {
            continue;
        };
        let mut cursor = 0;
        for span in spans {
            let len = span.char_len();
            let lo = seg_start.max(cursor);
            let hi = seg_end.min(cursor + len);
            if lo < hi {
                any = true;
                if !span.formats.contains(wanted) {
                    return false;
                }
            }
            cursor += len;
        }
    }
    any
}

/// The nearest top-level block of the range's anchor. A list item resolves
/// to its parent list.
pub fn top_level_block(document: &Document, range: &RangeSelection) -> Result<NodeKey, EditorError> {
    let (pos, _) =
        resolve_point(document, &range.anchor).ok_or(EditorError::NoTopLevelAncestor)?;
    Ok(document.blocks()[pos.block].key())
}

/// All distinct top-level blocks touched by the range, in document order
/// regardless of selection direction. Empty if either endpoint is detached.
pub fn selected_blocks(document: &Document, range: &RangeSelection) -> Vec<NodeKey> {
    let Some((start, end)) = ordered_endpoints(document, range) else {
        return Vec::new();
    };
    document.blocks()[start.0.block..=end.0.block]
        .iter()
        .map(|block| block.key())
        .collect()
}
