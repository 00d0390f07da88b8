use invgrid::{GridWindow, ItemId};

/// Keeps the viewport pinned to a row identity across changes to the row sequence.
///
/// Typical use cases:
/// - narrowing or widening the client filter while scrolled into the list
/// - a store-side reconcile that changes which rows precede the anchor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowAnchor {
    pub key: ItemId,
    /// The distance from the anchor row's start to the viewport's scroll offset.
    pub offset_in_viewport: u64,
}

/// Captures an anchor for the first visible row of a sequence of `len` rows.
///
/// `key_at` is only called for that one row. Returns `None` if nothing is visible.
pub fn capture_first_visible_anchor(
    window: &GridWindow,
    len: usize,
    key_at: impl FnOnce(usize) -> ItemId,
) -> Option<RowAnchor> {
    let visible = window.visible_range(len);
    if visible.is_empty() {
        return None;
    }
    let index = visible.start_index;
    let start = window.item_start(index);
    let offset = window.view().clamp_scroll_offset(window.scroll_offset(), len);
    Some(RowAnchor {
        key: key_at(index),
        offset_in_viewport: offset.saturating_sub(start),
    })
}

/// Applies a previously captured anchor by adjusting the scroll offset.
///
/// `key_to_index` maps ids into the *current* row sequence of length `len`.
///
/// Returns `true` when the anchor row is still present and the offset was restored.
pub fn apply_anchor(
    window: &mut GridWindow,
    anchor: &RowAnchor,
    len: usize,
    mut key_to_index: impl FnMut(&ItemId) -> Option<usize>,
) -> bool {
    let Some(index) = key_to_index(&anchor.key) else {
        return false;
    };
    let target = window
        .item_start(index)
        .saturating_add(anchor.offset_in_viewport);
    window.set_scroll_offset_clamped(target, len);
    true
}
