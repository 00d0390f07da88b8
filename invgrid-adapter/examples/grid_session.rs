// Example: driving an InventoryGrid against an in-memory store.
use std::rc::Rc;

use async_trait::async_trait;
use invgrid::{GridOptions, Item, ItemId, ItemPatch, JsonStorage, MemoryStorage};
use invgrid_adapter::{InventoryGrid, ItemStore, Page, PageRequest, StoreError};

struct Catalog {
    items: Vec<Item>,
}

#[async_trait(?Send)]
impl ItemStore for Catalog {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, StoreError> {
        let items = self
            .items
            .iter()
            .skip(request.offset)
            .take(request.page_size)
            .cloned()
            .collect();
        Ok(Page::new(items))
    }

    async fn mutate_item(&self, item_id: &ItemId, patch: &ItemPatch) -> Result<Item, StoreError> {
        if patch.quantity.is_some_and(|q| q > 1_000.0) {
            return Err(StoreError::rejected("quantity exceeds bin capacity"));
        }
        let mut item = self
            .items
            .iter()
            .find(|i| i.id == *item_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(item_id.clone()))?;
        item.apply_patch(patch);
        Ok(item)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let store = Catalog {
        items: (0..500)
            .map(|i| {
                Item::new(format!("item-{i}"), format!("Part {i}"))
                    .with_category(if i % 2 == 0 { "Tools" } else { "Office" })
                    .with_quantity(i as f64)
                    .with_unit_price(1.25)
            })
            .collect(),
    };
    let storage = JsonStorage::new(Rc::new(MemoryStorage::new()));
    let grid = InventoryGrid::new(store, storage, GridOptions::new().with_user_key("demo"));

    // An adapter would feed real scroll events; here we scroll to the bottom each time.
    let mut now_ms = 0;
    while grid.on_scroll(u64::MAX / 2, 600, now_ms) {
        let outcome = grid.load_more().await;
        println!("t={now_ms} {outcome:?} buffered={}", grid.buffer().borrow().len());
        now_ms += 16;
    }

    grid.type_query("Part 4", now_ms);
    grid.tick(now_ms + grid.options().search_debounce_ms);
    println!("filtered={} suggestions={:?}", grid.filtered_len(), grid.suggestions());

    let id = ItemId::from("item-4");
    println!("{:?}", grid.edit(&id, ItemPatch::new().quantity(5_000.0)).await);
    for notice in grid.drain_notices() {
        println!("rolled back {}: {}", notice.item_id, notice.reason);
    }

    let frame = grid.frame();
    println!("frame rows={} columns={}", frame.rows.len(), frame.columns.len());
}
