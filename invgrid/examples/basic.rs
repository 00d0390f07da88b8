// Example: filter a buffer, derive facets and window the result.
use invgrid::{
    Align, FilterState, GridWindow, Item, ItemStatus, RowBuffer, derive_facets, filter, suggest,
};

fn main() {
    let mut buffer = RowBuffer::new();
    buffer.append_page((0..10_000).map(|i| {
        Item::new(format!("item-{i}"), format!("Widget {i}"))
            .with_sku(format!("WID-{i:05}"))
            .with_category(["Tools", "Office", "Electronics"][i % 3])
            .with_quantity((i % 40) as f64)
            .with_status(if i % 40 == 0 {
                ItemStatus::OutOfStock
            } else {
                ItemStatus::InStock
            })
    }));

    let facets = derive_facets(buffer.items());
    println!("categories={:?} statuses={:?}", facets.categories, facets.statuses);

    let state = FilterState::new()
        .with_category("Tools")
        .with_status("out-of-stock");
    let rows = filter(buffer.items(), &state);
    println!("filtered={} active_filters={}", rows.len(), state.active_filter_count());

    let mut w = GridWindow::new(40, 3);
    w.set_viewport_height(600);
    w.scroll_to_index(rows.len() / 2, Align::Center, rows.len());
    let slice = w.slice(&rows, |item| item.id.clone());
    println!(
        "total_size={} materialized={} first={:?}",
        slice.total_size(),
        slice.rows().len(),
        slice.rows().first().map(|r| &r.key)
    );

    for s in suggest(rows.iter().copied(), "wid-0012", 5) {
        println!("suggestion {:?} {} ({})", s.kind, s.value, s.occurrence_count);
    }
}
