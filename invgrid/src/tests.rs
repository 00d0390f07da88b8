use crate::*;

use chrono::{TimeZone, Utc};
use std::rc::Rc;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + ((self.next_u64() >> 16) % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }

    fn gen_range_u32(&mut self, start: u32, end_exclusive: u32) -> u32 {
        self.gen_range_u64(start as u64, end_exclusive as u64) as u32
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() >> 33) & 1 == 1
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.gen_range_usize(0, values.len())]
    }
}

const CATEGORIES: [&str; 4] = ["Electronics", "Furniture", "Office", "Tools"];
const STATUSES: [&str; 4] = ["in-stock", "low-stock", "out-of-stock", "discontinued"];
const SUPPLIERS: [&str; 3] = ["Acme Corp", "Globex", "Initech"];
const LOCATIONS: [&str; 3] = ["Warehouse A", "Warehouse B", "Store Front"];
const WORDS: [&str; 6] = ["cable", "desk", "chair", "drill", "lamp", "Widget"];

fn random_item(rng: &mut Lcg, i: usize) -> Item {
    let status: ItemStatus = rng.pick(&STATUSES).parse().unwrap();
    Item::new(format!("item-{i}"), format!("{} {i}", rng.pick(&WORDS)))
        .with_sku(format!("SKU-{:04}", i))
        .with_category(rng.pick(&CATEGORIES))
        .with_supplier(rng.pick(&SUPPLIERS))
        .with_location(rng.pick(&LOCATIONS))
        .with_quantity(rng.gen_range_u64(0, 100) as f64)
        .with_unit_price(rng.gen_range_u64(1, 500) as f64)
        .with_status(status)
        .with_description(format!("A {} for daily use", rng.pick(&WORDS)))
}

fn random_buffer(rng: &mut Lcg, len: usize) -> RowBuffer {
    let mut buffer = RowBuffer::new();
    buffer.append_page((0..len).map(|i| random_item(rng, i)));
    buffer
}

fn random_state(rng: &mut Lcg) -> FilterState {
    let mut state = FilterState::new();
    if rng.gen_bool() {
        state.set_query(rng.pick(&["CAB", "desk", "sku-00", "acme", "daily", "zzz"]));
    }
    for c in CATEGORIES {
        if rng.gen_range_u32(0, 4) == 0 {
            state.toggle_category(c);
        }
    }
    for s in STATUSES {
        if rng.gen_range_u32(0, 4) == 0 {
            state.toggle_status(s);
        }
    }
    if rng.gen_range_u32(0, 3) == 0 {
        state.set_supplier(Some(rng.pick(&SUPPLIERS).to_uppercase()));
    }
    if rng.gen_range_u32(0, 3) == 0 {
        state.set_location(Some(rng.pick(&LOCATIONS).to_owned()));
    }
    state
}

fn ids(rows: &[&Item]) -> Vec<String> {
    rows.iter().map(|i| i.id.to_string()).collect()
}

fn abc_buffer() -> RowBuffer {
    let mut buffer = RowBuffer::new();
    buffer.append_page([
        Item::new("A", "Alpha")
            .with_quantity(5.0)
            .with_status(ItemStatus::LowStock),
        Item::new("B", "Bravo")
            .with_quantity(0.0)
            .with_status(ItemStatus::OutOfStock),
        Item::new("C", "Charlie")
            .with_quantity(40.0)
            .with_status(ItemStatus::InStock),
    ]);
    buffer
}

// ---------------------------------------------------------------------------------------------
// Filter predicate engine

#[test]
fn default_filter_is_identity() {
    let mut rng = Lcg::new(7);
    for len in [0usize, 1, 17, 250] {
        let buffer = random_buffer(&mut rng, len);
        let rows = filter(buffer.items(), &FilterState::default());
        assert_eq!(rows.len(), buffer.len());
        for (a, b) in rows.iter().zip(buffer.iter()) {
            assert!(core::ptr::eq(*a, b));
        }
    }
}

#[test]
fn filter_is_conjunction_of_single_criteria() {
    let mut rng = Lcg::new(42);
    let buffer = random_buffer(&mut rng, 200);

    for _ in 0..200 {
        let state = random_state(&mut rng);

        let mut singles = Vec::new();
        if !state.free_text_query.is_empty() {
            singles.push(FilterState::new().with_query(state.free_text_query.clone()));
        }
        if !state.categories.is_empty() {
            let mut s = FilterState::new();
            s.categories = state.categories.clone();
            singles.push(s);
        }
        if !state.statuses.is_empty() {
            let mut s = FilterState::new();
            s.statuses = state.statuses.clone();
            singles.push(s);
        }
        if let Some(supplier) = &state.supplier {
            singles.push(FilterState::new().with_supplier(supplier.clone()));
        }
        if let Some(location) = &state.location {
            singles.push(FilterState::new().with_location(location.clone()));
        }

        let result = filter(buffer.items(), &state);
        let expected: Vec<&Item> = buffer
            .iter()
            .filter(|item| singles.iter().all(|s| s.matches(item)))
            .collect();
        assert_eq!(ids(&result), ids(&expected), "state={state:?}");
    }
}

#[test]
fn status_filter_keeps_buffer_order() {
    let buffer = abc_buffer();
    let state = FilterState::new()
        .with_status("out-of-stock")
        .with_status("low-stock");
    assert_eq!(ids(&filter(buffer.items(), &state)), ["A", "B"]);
}

#[test]
fn free_text_matches_selected_fields_case_insensitively() {
    let mut buffer = RowBuffer::new();
    buffer.append_page([
        Item::new("1", "Cordless Drill").with_sku("DR-100"),
        Item::new("2", "Desk").with_description("Standing DRILL-free desk"),
        Item::new("3", "Lamp").with_location("drill room"),
        Item::new("4", "Chair").with_notes("drill"),
        Item::new("5", "Bits").with_supplier("DrillCo"),
        Item::new("6", "Saw").with_category("drills"),
    ]);
    let state = FilterState::new().with_query("dRiLl");
    assert_eq!(ids(&filter(buffer.items(), &state)), ["1", "2", "5", "6"]);

    let blank = FilterState::new().with_query("   ");
    assert_eq!(filter(buffer.items(), &blank).len(), 6);
}

#[test]
fn supplier_and_location_match_exactly_ignoring_case() {
    let mut buffer = RowBuffer::new();
    buffer.append_page([
        Item::new("1", "a")
            .with_supplier("Acme")
            .with_location("Bay 1"),
        Item::new("2", "b")
            .with_supplier("Acme Corp")
            .with_location("Bay 1"),
        Item::new("3", "c")
            .with_supplier("acme")
            .with_location("bay 2"),
    ]);
    let state = FilterState::new().with_supplier("ACME");
    assert_eq!(ids(&filter(buffer.items(), &state)), ["1", "3"]);

    let state = state.with_location("BAY 1");
    assert_eq!(ids(&filter(buffer.items(), &state)), ["1"]);
}

#[test]
fn all_excluding_filter_degrades_to_empty() {
    let buffer = abc_buffer();
    let state = FilterState::new().with_category("Nope").with_query("zzz");
    assert!(filter(buffer.items(), &state).is_empty());
    assert!(filter(&[], &state).is_empty());
}

#[test]
fn active_filter_count_counts_each_selection() {
    let mut state = FilterState::new();
    assert_eq!(state.active_filter_count(), 0);
    assert!(state.is_default());

    state.set_query("cable");
    state.toggle_category("Office");
    state.toggle_category("Tools");
    state.toggle_status("low-stock");
    state.set_supplier(Some("Globex".into()));
    state.set_location(Some("".into()));
    assert_eq!(state.active_filter_count(), 5);
    assert_eq!(state.location, None);

    state.toggle_category("Tools");
    assert_eq!(state.active_filter_count(), 4);

    state.reset();
    assert_eq!(state, FilterState::default());
}

#[test]
fn facets_are_sorted_distinct_and_ignore_filter() {
    let mut buffer = RowBuffer::new();
    buffer.append_page([
        Item::new("1", "a")
            .with_category("Tools")
            .with_supplier("Globex")
            .with_location("B"),
        Item::new("2", "b")
            .with_category("Electronics")
            .with_supplier("Acme")
            .with_status(ItemStatus::LowStock),
        Item::new("3", "c").with_category("Tools").with_location("A"),
    ]);
    let facets = derive_facets(buffer.items());
    assert_eq!(facets.categories, ["Electronics", "Tools"]);
    assert_eq!(facets.statuses, ["in-stock", "low-stock"]);
    assert_eq!(facets.suppliers, ["Acme", "Globex"]);
    assert_eq!(facets.locations, ["A", "B"]);
}

#[test]
fn facet_cache_recomputes_when_buffer_grows() {
    let mut buffer = RowBuffer::new();
    buffer.append_page([Item::new("1", "a").with_category("Tools")]);

    let mut cache = FacetCache::new();
    assert_eq!(cache.get(&buffer).categories, ["Tools"]);

    buffer.append_page([Item::new("2", "b").with_category("Office")]);
    assert_eq!(cache.get(&buffer).categories, ["Office", "Tools"]);
}

// ---------------------------------------------------------------------------------------------
// Suggestions

#[test]
fn suggestions_require_two_characters() {
    let buffer = abc_buffer();
    assert!(suggest(buffer.iter(), "a", 8).is_empty());
    assert!(suggest(buffer.iter(), " a ", 8).is_empty());
    assert!(!suggest(buffer.iter(), "al", 8).is_empty());
}

#[test]
fn suggestions_count_occurrences_except_skus() {
    let mut buffer = RowBuffer::new();
    buffer.append_page([
        Item::new("1", "Cable Tie")
            .with_sku("CAB-1")
            .with_category("Cables")
            .with_supplier("Acme"),
        Item::new("2", "Cable Tie")
            .with_sku("CAB-2")
            .with_category("Cables"),
        Item::new("3", "HDMI Cable")
            .with_sku("CAB-1")
            .with_category("Cables"),
    ]);

    let out = suggest(buffer.iter(), "cab", 8);
    let summary: Vec<_> = out
        .iter()
        .map(|s| (s.kind, s.value.as_str(), s.occurrence_count))
        .collect();
    assert_eq!(
        summary,
        [
            (SuggestionKind::Category, "Cables", 3),
            (SuggestionKind::Name, "Cable Tie", 2),
            (SuggestionKind::Sku, "CAB-1", 1),
            (SuggestionKind::Sku, "CAB-2", 1),
            (SuggestionKind::Name, "HDMI Cable", 1),
        ]
    );
}

#[test]
fn suggestion_min_length_is_configurable() {
    let buffer = abc_buffer();
    assert_eq!(MIN_SUGGESTION_QUERY_LEN, 2);
    assert!(suggest_with_min_len(buffer.iter(), "a", DEFAULT_SUGGESTION_LIMIT, 1)
        .iter()
        .any(|s| s.value == "Alpha"));
    assert!(suggest_with_min_len(buffer.iter(), "alp", DEFAULT_SUGGESTION_LIMIT, 4).is_empty());
}

#[test]
fn suggestions_truncate_to_limit() {
    let mut rng = Lcg::new(3);
    let buffer = random_buffer(&mut rng, 100);
    let out = suggest(buffer.iter(), "sku", 8);
    assert_eq!(out.len(), 8);
    assert!(out.iter().all(|s| s.kind == SuggestionKind::Sku));
    assert!(suggest(buffer.iter(), "sku", 0).is_empty());
}

// ---------------------------------------------------------------------------------------------
// Column layout

fn order(layout: &ColumnLayout) -> Vec<ColumnId> {
    layout.columns().iter().map(|c| c.id).collect()
}

#[test]
fn reorder_onto_self_is_a_noop() {
    let mut rng = Lcg::new(11);
    for _ in 0..50 {
        let mut layout = ColumnLayout::default();
        for _ in 0..5 {
            let a = ColumnId::ALL[rng.gen_range_usize(0, ColumnId::ALL.len())];
            let b = ColumnId::ALL[rng.gen_range_usize(0, ColumnId::ALL.len())];
            layout.reorder(a, b);
        }
        let before = serde_json::to_string(&layout.to_stored()).unwrap();
        let id = ColumnId::ALL[rng.gen_range_usize(0, ColumnId::ALL.len())];
        assert!(!layout.reorder(id, id));
        assert_eq!(serde_json::to_string(&layout.to_stored()).unwrap(), before);
    }
}

#[test]
fn reorder_moves_source_to_target_index() {
    let mut layout = ColumnLayout::default();
    let base = order(&layout);

    // Forward: Name lands where Category was.
    assert!(layout.reorder(ColumnId::Name, ColumnId::Category));
    assert_eq!(&order(&layout)[..3], [ColumnId::Sku, ColumnId::Category, ColumnId::Name]);
    assert_eq!(&order(&layout)[3..], &base[3..]);

    // Backward: Name goes back in front of Sku.
    assert!(layout.reorder(ColumnId::Name, ColumnId::Sku));
    assert_eq!(order(&layout), base);
}

#[test]
fn move_to_clamps_index() {
    let mut layout = ColumnLayout::default();
    assert!(layout.move_to(ColumnId::Name, 999));
    assert_eq!(order(&layout).last(), Some(&ColumnId::Name));
    assert!(!layout.move_to(ColumnId::Name, 999));
}

#[test]
fn toggle_visibility_flips_one_column() {
    let mut layout = ColumnLayout::default();
    let before = layout.clone();
    assert!(layout.is_visible(ColumnId::Sku));
    assert!(layout.toggle_visibility(ColumnId::Sku));
    assert!(!layout.is_visible(ColumnId::Sku));
    assert_eq!(order(&layout), order(&before));

    let changed: Vec<_> = layout
        .columns()
        .iter()
        .zip(before.columns())
        .filter(|(a, b)| a != b)
        .map(|(a, _)| a.id)
        .collect();
    assert_eq!(changed, [ColumnId::Sku]);
    assert!(!layout.visible_columns().any(|id| id == ColumnId::Sku));
}

#[test]
fn stored_layout_round_trips() {
    let mut rng = Lcg::new(5);
    for _ in 0..50 {
        let mut layout = ColumnLayout::default();
        for _ in 0..8 {
            let a = ColumnId::ALL[rng.gen_range_usize(0, ColumnId::ALL.len())];
            if rng.gen_bool() {
                layout.toggle_visibility(a);
            } else {
                let b = ColumnId::ALL[rng.gen_range_usize(0, ColumnId::ALL.len())];
                layout.reorder(a, b);
            }
        }
        let json = serde_json::to_string(&layout.to_stored()).unwrap();
        let stored: Vec<StoredColumn> = serde_json::from_str(&json).unwrap();
        assert_eq!(ColumnLayout::reconcile(&stored), layout);
    }
}

#[test]
fn reconcile_drops_unknown_and_appends_missing_hidden() {
    let stored: Vec<StoredColumn> = serde_json::from_str(
        r#"[
            {"id": "status", "label": "Status", "visible": true},
            {"id": "legacyBin", "label": "Bin", "visible": true},
            {"id": "name", "label": "Item Name", "visible": false},
            {"id": "status", "label": "Status", "visible": false}
        ]"#,
    )
    .unwrap();

    let layout = ColumnLayout::reconcile(&stored);
    assert_eq!(layout.len(), ColumnId::ALL.len());
    assert_eq!(&order(&layout)[..2], [ColumnId::Status, ColumnId::Name]);
    assert!(layout.is_visible(ColumnId::Status));
    assert!(!layout.is_visible(ColumnId::Name));
    assert_eq!(layout.columns()[1].label, "Name");
    assert!(layout.columns()[2..].iter().all(|c| !c.visible));

    // One pass reaches a fixed point.
    let again = ColumnLayout::reconcile(&layout.to_stored());
    assert_eq!(again, layout);
}

#[test]
fn grouping_partitions_without_reordering() {
    let mut layout = ColumnLayout::default();
    layout.reorder(ColumnId::UnitPrice, ColumnId::Name);
    let groups = layout.grouped();
    let names: Vec<_> = groups.iter().map(|(g, _)| *g).collect();
    assert_eq!(names, ColumnGroup::ALL);
    let total: usize = groups.iter().map(|(_, cols)| cols.len()).sum();
    assert_eq!(total, ColumnId::ALL.len());
    assert_eq!(groups[2].1[0].id, ColumnId::UnitPrice);
    assert_eq!(order(&layout)[0], ColumnId::UnitPrice);
}

#[test]
fn layout_manager_persists_every_change() {
    let backend = Rc::new(MemoryStorage::new());
    let storage = JsonStorage::new(Rc::clone(&backend));

    let mut manager = ColumnLayoutManager::load(storage.clone(), "alice");
    assert!(manager.layout().is_default());
    assert!(backend.is_empty());

    assert!(manager.toggle_visibility(ColumnId::Notes));
    assert!(manager.reorder(ColumnId::Status, ColumnId::Name));
    assert!(!manager.reorder(ColumnId::Status, ColumnId::Status));
    assert!(backend.raw("invgrid:column-layout:alice").is_some());

    let reloaded = ColumnLayoutManager::load(storage.clone(), "alice");
    assert_eq!(reloaded.layout(), manager.layout());

    // Explicit save is a harmless second persistence point.
    manager.save_layout().unwrap();
    let again = ColumnLayoutManager::load(storage.clone(), "alice");
    assert_eq!(again.layout(), manager.layout());

    manager.reset_to_default().unwrap();
    assert!(manager.layout().is_default());
    assert!(backend.raw("invgrid:column-layout:alice").is_none());
}

#[test]
fn malformed_layout_falls_back_to_default() {
    let backend = Rc::new(MemoryStorage::new());
    backend.insert_raw("invgrid:column-layout:bob", "{not json");
    let manager = ColumnLayoutManager::load(JsonStorage::new(Rc::clone(&backend)), "bob");
    assert!(manager.layout().is_default());
}

#[test]
fn layout_changes_survive_failing_storage() {
    let mut manager = ColumnLayoutManager::load(JsonStorage::new(MemoryStorage::read_only()), "x");
    assert!(manager.toggle_visibility(ColumnId::Sku));
    assert!(!manager.layout().is_visible(ColumnId::Sku));
    assert!(manager.save_layout().is_err());
}

// ---------------------------------------------------------------------------------------------
// Filter presets

#[test]
fn presets_keep_a_single_default() {
    let backend = Rc::new(MemoryStorage::new());
    let storage = JsonStorage::new(Rc::clone(&backend));
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let mut book = PresetBook::load(storage.clone(), "alice");
    let low = FilterState::new().with_status("low-stock");
    let tools = FilterState::new().with_category("Tools");

    assert!(book.save("Low stock", &low, t0).unwrap());
    assert!(book.save("Tools", &tools, t0).unwrap());
    assert!(!book.save("   ", &tools, t0).unwrap());
    assert!(book.set_default("Low stock").unwrap());
    assert!(book.set_default("Tools").unwrap());
    assert!(!book.set_default("Missing").unwrap());

    let defaults: Vec<_> = book.list().iter().filter(|p| p.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(book.default_preset().unwrap().name, "Tools");

    // Replacing keeps the default flag.
    let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    book.save("Tools", &low, t1).unwrap();
    assert_eq!(book.len(), 2);
    assert_eq!(book.get("Tools").unwrap().filters, low);
    assert!(book.get("Tools").unwrap().is_default);

    let reloaded = PresetBook::load(storage.clone(), "alice");
    assert_eq!(reloaded.list(), book.list());

    assert!(book.delete("Tools").unwrap());
    assert!(book.default_preset().is_none());
    assert!(!book.delete("Tools").unwrap());
}

#[test]
fn preset_load_repairs_extra_defaults() {
    let backend = Rc::new(MemoryStorage::new());
    backend.insert_raw(
        "invgrid:filter-presets:carol",
        r#"[
            {"name": "a", "filters": {}, "createdAt": "2024-01-01T00:00:00Z", "isDefault": true},
            {"name": "b", "filters": {"statuses": ["low-stock"]}, "createdAt": "2024-01-02T00:00:00Z", "isDefault": true}
        ]"#,
    );
    let book = PresetBook::load(JsonStorage::new(Rc::clone(&backend)), "carol");
    assert_eq!(book.len(), 2);
    assert_eq!(book.default_preset().unwrap().name, "a");
    assert!(!book.get("b").unwrap().is_default);
    assert_eq!(book.get("b").unwrap().filters.active_filter_count(), 1);

    backend.insert_raw("invgrid:filter-presets:dave", "[1, 2");
    let empty = PresetBook::load(JsonStorage::new(Rc::clone(&backend)), "dave");
    assert!(empty.is_empty());
}

// ---------------------------------------------------------------------------------------------
// Row windowing

#[test]
fn fixed_rows_range_and_total() {
    let mut w = GridWindow::new(10, 0);
    w.set_viewport_height(100);
    assert_eq!(w.total_size(1000), 10_000);
    assert_eq!(w.visible_range(1000), RowRange { start_index: 0, end_index: 10 });

    w.set_scroll_offset(205);
    assert_eq!(w.visible_range(1000), RowRange { start_index: 20, end_index: 31 });

    w.set_overscan(3);
    assert_eq!(w.render_range(1000), RowRange { start_index: 17, end_index: 34 });
}

#[test]
fn overscan_is_clamped_to_sequence() {
    let mut w = GridWindow::new(10, 5);
    w.set_viewport_height(50);
    assert_eq!(w.render_range(3), RowRange { start_index: 0, end_index: 3 });

    w.set_scroll_offset(10_000);
    // Offsets past the end are clamped to the last full viewport.
    assert_eq!(w.visible_range(20), RowRange { start_index: 15, end_index: 20 });
    assert_eq!(w.render_range(20), RowRange { start_index: 10, end_index: 20 });
}

#[test]
fn materialized_rows_are_bounded() {
    let mut rng = Lcg::new(99);
    for _ in 0..2000 {
        let row_height = rng.gen_range_u32(1, 60);
        let viewport = rng.gen_range_u32(0, 900);
        let overscan = rng.gen_range_usize(0, 8);
        let len = rng.gen_range_usize(0, 400);
        let offset = rng.gen_range_u64(0, 30_000);

        let view = ViewWindow {
            scroll_offset: offset,
            viewport_height: viewport,
            row_height,
            overscan,
        };
        let range = view.render_range(len);
        assert!(range.start_index <= range.end_index);
        assert!(range.end_index <= len);

        let per_view = (viewport as usize).div_ceil(row_height as usize);
        // A misaligned offset can straddle one extra row.
        let aligned = view.clamp_scroll_offset(offset, len) % row_height as u64 == 0;
        let slack = usize::from(!aligned);
        assert!(
            range.len() <= per_view + slack + 2 * overscan,
            "view={view:?} len={len} range={range:?}"
        );
    }
}

#[test]
fn slice_keys_rows_by_item_id() {
    let buffer = abc_buffer();
    let rows = filter(buffer.items(), &FilterState::new().with_status("in-stock"));
    let mut w = GridWindow::new(40, 2);
    w.set_viewport_height(400);

    let slice = w.slice(&rows, |item| item.id.clone());
    assert_eq!(slice.total_size(), 40);
    let row = &slice.rows()[0];
    assert_eq!(row.key, ItemId::from("C"));
    assert_eq!(row.index, 0);
    assert_eq!((row.start, row.end()), (0, 40));
}

#[test]
fn slice_by_reaches_only_rendered_rows() {
    let items: Vec<Item> = (0..10_000)
        .map(|i| Item::new(format!("{i}"), format!("row {i}")))
        .collect();
    // Reversed view over the items, as a filtered index would map them.
    let positions: Vec<usize> = (0..items.len()).rev().collect();
    let mut w = GridWindow::new(20, 3);
    w.set_viewport_height(200);
    w.set_scroll_offset(20 * 5_000);

    let calls = core::cell::Cell::new(0usize);
    let slice = w.slice_by(
        positions.len(),
        |index| {
            calls.set(calls.get() + 1);
            &items[positions[index]]
        },
        |item| item.id.clone(),
    );
    assert_eq!(calls.get(), w.render_range(positions.len()).len());
    assert_eq!(calls.get(), 16);
    assert_eq!(slice.total_size(), 20 * 10_000);
    assert_eq!(slice.rows()[0].index, 4_997);
    assert_eq!(slice.rows()[0].key, ItemId::from("5002"));

    let direct: Vec<&Item> = positions.iter().map(|&p| &items[p]).collect();
    let expected = w.slice(&direct, |item| item.id.clone());
    let got: Vec<&ItemId> = slice.rows().iter().map(|r| &r.key).collect();
    let want: Vec<&ItemId> = expected.rows().iter().map(|r| &r.key).collect();
    assert_eq!(got, want);
}

#[test]
fn empty_sequence_renders_placeholder() {
    let mut w = GridWindow::new(40, 2);
    w.set_viewport_height(400);
    let rows: Vec<&Item> = Vec::new();
    let slice = w.slice(&rows, |item| item.id.clone());
    assert!(slice.is_empty());
    assert!(slice.rows().is_empty());
}

#[test]
fn scroll_to_index_aligns_and_clamps() {
    let mut w = GridWindow::new(10, 0);
    w.set_viewport_height(100);
    assert_eq!(w.scroll_to_index_offset(50, Align::Start, 1000), 500);
    assert_eq!(w.scroll_to_index_offset(50, Align::End, 1000), 410);
    assert_eq!(w.scroll_to_index_offset(50, Align::Center, 1000), 455);
    assert_eq!(w.scroll_to_index_offset(999, Align::Start, 1000), 9_900);
    assert_eq!(w.scroll_to_index_offset(3, Align::Auto, 1000), 0);

    assert_eq!(w.scroll_to_index(50, Align::Auto, 1000), 410);
    assert_eq!(w.scroll_direction(), Some(ScrollDirection::Forward));
}

#[test]
fn scrolling_state_resets_after_delay() {
    let mut w = GridWindow::from_options(&GridOptions::default().with_is_scrolling_reset_delay_ms(100));
    w.apply_scroll_event(120, 400, 1_000);
    assert!(w.is_scrolling());
    w.update_scrolling(1_050);
    assert!(w.is_scrolling());
    w.update_scrolling(1_100);
    assert!(!w.is_scrolling());
    assert_eq!(w.scroll_direction(), None);
}

#[test]
fn sentinel_triggers_within_margin() {
    let mut w = GridWindow::new(10, 0);
    w.set_viewport_height(100);
    // 50 rows = 500 high; bottom of viewport at 100.
    assert!(!w.sentinel_in_view(50, 200));
    w.set_scroll_offset(200);
    assert!(w.sentinel_in_view(50, 200));
    assert!(!w.sentinel_in_view(50, 199));
    assert!(w.sentinel_in_view(0, 0));
}

// ---------------------------------------------------------------------------------------------
// Buffer and items

#[test]
fn append_skips_duplicate_ids() {
    let mut buffer = abc_buffer();
    let rev = buffer.revision();
    let added = buffer.append_page([Item::new("B", "dupe"), Item::new("D", "Delta")]);
    assert_eq!(added, 1);
    assert_eq!(buffer.len(), 4);
    assert_eq!(buffer.get(&"B".into()).unwrap().name, "Bravo");
    assert_eq!(buffer.position(&"D".into()), Some(3));
    assert!(buffer.revision() > rev);

    let rev = buffer.revision();
    assert_eq!(buffer.append_page(Vec::new()), 0);
    assert_eq!(buffer.revision(), rev);
}

#[test]
fn append_sanitizes_numbers() {
    let mut buffer = RowBuffer::new();
    let mut item = Item::new("x", "x");
    item.quantity = -3.0;
    item.unit_price = f64::NAN;
    buffer.append_page([item]);
    let item = buffer.get(&"x".into()).unwrap();
    assert_eq!((item.quantity, item.unit_price), (0.0, 0.0));
}

#[test]
fn patch_snapshot_restores_touched_fields() {
    let mut buffer = abc_buffer();
    let id = ItemId::from("B");
    let before = buffer.get(&id).unwrap().clone();

    let patch = ItemPatch::new().quantity(20.0).notes("recounted");
    let snapshot = buffer.apply_patch(&id, &patch).unwrap();
    assert_eq!(buffer.position(&id), Some(1));
    assert_eq!(buffer.get(&id).unwrap().quantity, 20.0);
    assert_eq!(snapshot.quantity, Some(0.0));
    assert_eq!(snapshot.notes, Some(String::new()));
    assert_eq!(snapshot.name, None);

    buffer.apply_patch(&id, &snapshot).unwrap();
    assert_eq!(buffer.get(&id).unwrap(), &before);
    assert!(buffer.apply_patch(&"nope".into(), &patch).is_none());
}

#[test]
fn patch_recomputes_total_value() {
    let mut item = Item::new("1", "x").with_quantity(2.0).with_unit_price(5.0);
    assert_eq!(item.total_value, 10.0);
    let prev = item.apply_patch(&ItemPatch::new().quantity(3.0));
    assert_eq!(item.total_value, 15.0);
    assert_eq!(prev.total_value, Some(10.0));
    item.apply_patch(&prev);
    assert_eq!((item.quantity, item.total_value), (2.0, 10.0));
}

#[test]
fn patch_validation_rejects_negative_numbers() {
    assert_eq!(
        ItemPatch::new().quantity(-1.0).validate(),
        Err(PatchError::NegativeQuantity)
    );
    assert_eq!(
        ItemPatch::new().unit_price(f64::INFINITY).validate(),
        Err(PatchError::NonFiniteNumber)
    );
    assert!(ItemPatch::new().quantity(0.0).name("x").validate().is_ok());
    assert!(ItemPatch::new().is_empty());
}

#[test]
fn item_json_defaults_missing_numbers() {
    let item: Item = serde_json::from_str(
        r#"{"id": "42", "name": "Bolt", "status": "backordered", "unitPrice": 1.5}"#,
    )
    .unwrap();
    assert_eq!(item.quantity, 0.0);
    assert_eq!(item.unit_price, 1.5);
    assert_eq!(item.status, ItemStatus::Other("backordered".into()));

    let json = serde_json::to_value(&Item::new("1", "x").with_status(ItemStatus::OutOfStock)).unwrap();
    assert_eq!(json["status"], "out-of-stock");
    assert_eq!(json["id"], "1");
}

#[test]
fn item_json_reads_null_fields_as_defaults() {
    let item: Item = serde_json::from_str(
        r#"{"id": "7", "name": "Nut", "quantity": null, "unitPrice": 0.25,
            "totalValue": null, "supplier": null, "status": null}"#,
    )
    .unwrap();
    assert_eq!(item.quantity, 0.0);
    assert_eq!(item.total_value, 0.0);
    assert_eq!(item.unit_price, 0.25);
    assert_eq!(item.supplier, "");
    assert_eq!(item.status, ItemStatus::default());

    let page: Vec<Item> =
        serde_json::from_str(r#"[{"id": "1", "quantity": 3}, {"id": "2", "reorderPoint": null}]"#)
            .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[1].reorder_point, 0.0);
}

#[test]
fn cells_resolve_through_column_ids() {
    let item = Item::new("1", "Drill")
        .with_quantity(4.0)
        .with_status(ItemStatus::LowStock);
    let layout = ColumnLayout::default();
    let cells: Vec<String> = layout
        .visible_columns()
        .take(2)
        .map(|c| item.cell(c).to_string())
        .collect();
    assert_eq!(cells, ["Drill", ""]);
    assert_eq!(item.cell(ColumnId::Quantity), CellValue::Number(4.0));
    assert_eq!(item.cell(ColumnId::Status).to_string(), "low-stock");
}

// ---------------------------------------------------------------------------------------------
// Debounce and options

#[test]
fn debouncer_resets_on_each_push() {
    let mut d = Debouncer::new(100);
    d.push("c", 0);
    d.push("ca", 60);
    assert_eq!(d.poll(120), None);
    d.push("cab", 150);
    assert_eq!(d.poll(200), None);
    assert_eq!(d.pending(), Some(&"cab"));
    assert_eq!(d.poll(250), Some("cab"));
    assert!(!d.is_pending());
    assert_eq!(d.poll(1_000), None);

    d.push("x", 0);
    assert_eq!(d.flush(), Some("x"));
    d.push("y", 0);
    d.cancel();
    assert_eq!(d.poll(1_000), None);
}

#[test]
fn options_parse_partial_json() {
    let opts = GridOptions::from_json(r#"{"pageSize": 0, "overscan": 2, "userKey": "u1"}"#).unwrap();
    assert_eq!(opts.page_size, 1);
    assert_eq!(opts.overscan, 2);
    assert_eq!(opts.user_key, "u1");
    assert_eq!(opts.row_height, GridOptions::default().row_height);
    assert!(GridOptions::from_json(r#"{"pageSize": "many"}"#).is_err());
}
