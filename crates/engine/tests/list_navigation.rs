use std::time::{Duration, Instant};

use keynav_engine::{
    CustomOperation, Disposition, Document, KeynavHost, ListNavigator, MemoryDocument, lists_from_document,
};
use keynav_types::{CanonicalKey, ElementId, KeyChord, KeyboardEvent, Modifier};

fn load_fixture() -> MemoryDocument {
    MemoryDocument::from_yaml_str(include_str!("data/page_fixture.yaml")).expect("load page fixture")
}

fn by_id(doc: &MemoryDocument, id: &str) -> ElementId {
    doc.find_by_id(id).unwrap_or_else(|| panic!("fixture has no #{id}"))
}

fn fruits(doc: &MemoryDocument) -> Vec<ElementId> {
    ["a", "b", "c"].iter().map(|id| by_id(doc, id)).collect()
}

fn active_items(doc: &MemoryDocument, items: &[ElementId]) -> Vec<ElementId> {
    items
        .iter()
        .copied()
        .filter(|item| doc.tab_index(*item).as_deref() == Some("0"))
        .collect()
}

fn press(host: &mut KeynavHost<MemoryDocument>, key: &str) -> keynav_engine::DispatchOutcome {
    let target = host.document().active_element().expect("something focused");
    host.dispatch_key(&KeyboardEvent::key(target, key))
}

#[test]
fn arrows_wrap_and_enter_clicks_the_focused_item() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    let list = host
        .attach_list(ListNavigator::builder().static_items(items.clone()))
        .expect("attach list");
    assert_eq!(active_items(host.document(), &items), vec![items[0]]);

    host.document_mut().focus(items[0]);
    assert!(press(&mut host, "ArrowDown").prevent_default);
    assert!(press(&mut host, "ArrowDown").prevent_default);
    assert_eq!(host.document().active_element(), Some(items[2]));
    assert_eq!(host.list(list).and_then(ListNavigator::focused), Some(items[2]));

    press(&mut host, "ArrowDown");
    assert_eq!(host.document().active_element(), Some(items[0]));

    let outcome = press(&mut host, "Enter");
    assert!(outcome.prevent_default);
    assert_eq!(outcome.clicks, vec![items[0]]);
    assert_eq!(host.document().click_log(), &[items[0]]);
}

#[test]
fn prev_wraps_to_the_last_item() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    host.attach_list(ListNavigator::builder().static_items(items.clone())).unwrap();
    host.document_mut().focus(items[0]);
    press(&mut host, "ArrowUp");
    assert_eq!(host.document().active_element(), Some(items[2]));
    press(&mut host, "Home");
    assert_eq!(host.document().active_element(), Some(items[0]));
    press(&mut host, "End");
    assert_eq!(host.document().active_element(), Some(items[2]));
}

#[test]
fn remove_moves_to_previous_then_drops_the_item() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    let list = host.attach_list(ListNavigator::builder().static_items(items.clone())).unwrap();

    host.document_mut().focus(items[1]);
    let outcome = press(&mut host, "Delete");
    assert!(outcome.prevent_default);
    assert_eq!(host.document().active_element(), Some(items[0]));
    let remaining = host.with_list(list, |nav, doc| nav.items(doc)).unwrap();
    assert_eq!(remaining, vec![items[0], items[2]]);
    assert!(host.document().contains_element(items[1]), "element itself is untouched");

    host.document_mut().focus(items[1]);
    press(&mut host, "ArrowDown");
    assert_eq!(host.document().active_element(), Some(items[0]), "untracked item falls back to the first");
}

#[test]
fn removing_the_active_item_hands_the_marker_to_the_previous_item() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    let list = host.attach_list(ListNavigator::builder().static_items(items.clone())).unwrap();

    host.dispatch_click(items[1]);
    assert_eq!(active_items(host.document(), &items), vec![items[1]]);
    press(&mut host, "Delete");

    let tracked = host.with_list(list, |nav, doc| nav.items(doc)).unwrap();
    assert_eq!(tracked, vec![items[0], items[2]]);
    assert_eq!(host.with_list(list, |nav, doc| nav.active_item(doc)).unwrap(), Some(items[0]));
    assert_eq!(host.document().tab_index(items[1]).as_deref(), Some("-1"));
    assert_eq!(active_items(host.document(), &items), vec![items[0]]);
}

#[test]
fn removing_the_last_active_item_leaves_an_empty_list_inactive() {
    let mut doc = load_fixture();
    let items = fruits(&doc);
    let mut nav = ListNavigator::builder().static_items(vec![items[0]]).build(&mut doc).unwrap();
    assert_eq!(nav.active_item(&doc), Some(items[0]));

    assert!(nav.remove_item(&mut doc, items[0]));
    assert!(nav.items(&doc).is_empty());
    assert_eq!(doc.tab_index(items[0]).as_deref(), Some("-1"));
    assert!(!nav.remove_item(&mut doc, items[0]), "untracked items are left alone");
}

#[test]
fn at_most_one_item_is_active_after_every_operation() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    host.attach_list(ListNavigator::builder().static_items(items.clone())).unwrap();
    host.document_mut().focus(items[0]);

    for key in ["ArrowDown", "Enter", "ArrowRight", " ", "End", "Enter", "ArrowLeft", "Home", "Enter", "Delete"] {
        press(&mut host, key);
        assert!(active_items(host.document(), &items).len() <= 1, "after {key:?}");
    }
    host.dispatch_click(items[2]);
    let tracked = [items[1], items[2]];
    assert_eq!(active_items(host.document(), &tracked), vec![items[2]]);
}

#[test]
fn activating_the_active_item_writes_nothing() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    let list = host.attach_list(ListNavigator::builder().static_items(items.clone())).unwrap();

    let before = host.document().attribute_writes();
    host.with_list(list, |nav, doc| nav.activate_item(doc, items[0])).unwrap();
    assert_eq!(host.document().attribute_writes(), before);

    host.with_list(list, |nav, doc| nav.activate_item(doc, items[1])).unwrap();
    assert_eq!(host.document().attribute_writes(), before + 2);
    assert_eq!(active_items(host.document(), &items), vec![items[1]]);
}

#[test]
fn space_code_activates_like_enter() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    host.attach_list(ListNavigator::builder().static_items(items.clone())).unwrap();
    host.document_mut().focus(items[1]);
    let outcome = host.dispatch_key(&KeyboardEvent::key(items[1], "Unidentified").with_code("Space"));
    assert_eq!(outcome.clicks, vec![items[1]]);
    assert_eq!(active_items(host.document(), &items), vec![items[1]]);
}

#[test]
fn tab_is_never_claimed_by_a_list() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    host.attach_list(ListNavigator::builder().static_items(items.clone())).unwrap();
    host.document_mut().focus(items[0]);
    let outcome = press(&mut host, "Tab");
    assert!(!outcome.prevent_default);
    assert!(!outcome.is_claimed());
}

#[test]
fn custom_operations_extend_and_override_the_table() {
    let doc = load_fixture();
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    let skip = CustomOperation::new()
        .keys([KeyChord::with_modifier(Modifier::Shift, CanonicalKey::ArrowDown)])
        .handler(|nav, doc, _| {
            if let Some(last) = nav.last(doc) {
                nav.focus_item(doc, last);
            }
            Ok(Disposition::PreventDefault)
        });
    let builder = ListNavigator::builder()
        .static_items(items.clone())
        .custom_operation("SKIP_TO_END", skip)
        .custom_operation("NEXT", CustomOperation::new().keys(["j".parse::<KeyChord>().unwrap()]))
        .custom_operation("BROKEN", CustomOperation::new().keys(["k".parse::<KeyChord>().unwrap()]));
    let list = host.attach_list(builder).unwrap();
    assert!(host.list(list).unwrap().operations().get("BROKEN").is_none());

    host.document_mut().focus(items[0]);
    let shifted = host.dispatch_key(&KeyboardEvent::key(items[0], "ArrowDown").with_shift());
    assert!(shifted.prevent_default);
    assert_eq!(host.document().active_element(), Some(items[2]));

    assert!(!press(&mut host, "ArrowDown").is_claimed());
    press(&mut host, "j");
    assert_eq!(host.document().active_element(), Some(items[0]));
}

#[test]
fn live_lists_refresh_after_the_cache_expires() {
    let mut doc = load_fixture();
    let container = by_id(&doc, "fruits");
    let mut nav = ListNavigator::builder()
        .live_query(container, "[data-knw-list-item]")
        .cache_ttl(Duration::from_secs(5))
        .build(&mut doc)
        .unwrap();
    let start = Instant::now();
    assert_eq!(nav.items_at(&doc, start).len(), 3);

    doc.append_with(container, "li", &[("data-knw-list-item", "")]);
    assert_eq!(nav.items_at(&doc, start + Duration::from_secs(4)).len(), 3);
    assert_eq!(nav.items_at(&doc, start + Duration::from_secs(6)).len(), 4);
}

#[test]
fn live_lists_use_one_delegated_listener_pair() {
    let doc = load_fixture();
    let container = by_id(&doc, "fruits");
    let items = fruits(&doc);
    let mut host = KeynavHost::new(doc);
    let list = host
        .attach_list(ListNavigator::builder().live_query(container, "[data-knw-list-item]"))
        .unwrap();
    assert_eq!(host.document().listener_count(), 2);

    host.document_mut().focus(items[2]);
    press(&mut host, "ArrowDown");
    assert_eq!(host.document().active_element(), Some(items[0]));

    assert!(host.detach(list));
    assert_eq!(host.document().listener_count(), 0);
}

#[test]
fn teardown_and_rebuild_restore_the_initial_state() {
    let mut doc = load_fixture();
    let items = fruits(&doc);
    let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc).unwrap();
    assert_eq!(doc.listener_count(), 6);
    assert!(nav.remove_item(&mut doc, items[2]));

    nav.rebuild(&mut doc);
    assert_eq!(doc.listener_count(), 6);
    assert_eq!(nav.items(&doc), items);

    assert_eq!(nav.teardown(&mut doc), 6);
    assert_eq!(doc.listener_count(), 0);
    assert!(!nav.is_initialized());
}

#[test]
fn lists_are_discovered_from_markup() {
    let mut doc = load_fixture();
    let template = ListNavigator::builder();
    let mut navs = lists_from_document(&mut doc, "[data-knw-list]", "[data-knw-list-item]", &template).unwrap();
    assert_eq!(navs.len(), 1);
    let items = fruits(&doc);
    assert_eq!(navs[0].items(&doc), items);
    assert_eq!(navs[0].active_item(&doc), Some(items[0]));
}
