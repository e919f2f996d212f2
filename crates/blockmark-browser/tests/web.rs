//! WASM browser tests for blockmark-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use blockmark_browser::{
    BLOCK_ID_ATTR, Block, BlockKind, BrowserHost, Component, EditorConfig, IdleScheduler,
    KeyOutcome, SeedBlock, Surface, mount, parse_block_id,
};

fn container() -> web_sys::Element {
    let host = BrowserHost::new().unwrap();
    let container = host.create_element("div").unwrap();
    host.document()
        .body()
        .unwrap()
        .append_child(&container)
        .unwrap();
    container
}

fn header_only() -> EditorConfig {
    EditorConfig::with_seed(vec![SeedBlock::Header {
        level: 1,
        text: String::new(),
    }])
}

fn dispatch_key(target: &web_sys::Element, key: &str) -> bool {
    let init = web_sys::KeyboardEventInit::new();
    init.set_key(key);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event =
        web_sys::KeyboardEvent::new_with_keyboard_event_init_dict("keypress", &init).unwrap();
    target.dispatch_event(&event).unwrap()
}

fn dispatch_input(target: &web_sys::Element) {
    let init = web_sys::EventInit::new();
    init.set_bubbles(true);
    let event = web_sys::Event::new_with_event_init_dict("input", &init).unwrap();
    target.dispatch_event(&event).unwrap();
}

// === Host ===

#[wasm_bindgen_test]
fn test_insert_after_places_node_between_siblings() {
    let host = BrowserHost::new().unwrap();
    let parent = host.create_element("div").unwrap();
    let a = host.create_element("p").unwrap();
    let b = host.create_element("p").unwrap();
    let c = host.create_element("p").unwrap();
    host.append_child(&parent, &a).unwrap();
    host.append_child(&parent, &c).unwrap();

    host.insert_after(&parent, &b, &a).unwrap();

    assert_eq!(host.children(&parent), vec![a, b, c]);
}

#[wasm_bindgen_test]
fn test_controls_value_and_rows() {
    let host = BrowserHost::new().unwrap();
    let textarea = host.create_element("textarea").unwrap();
    host.set_value(&textarea, "hello").unwrap();
    host.set_rows(&textarea, 4).unwrap();

    assert_eq!(host.value(&textarea), "hello");
    assert_eq!(
        textarea
            .dyn_ref::<web_sys::HtmlTextAreaElement>()
            .unwrap()
            .rows(),
        4
    );

    let div = host.create_element("div").unwrap();
    assert!(host.set_value(&div, "x").is_err());
    assert_eq!(host.value(&div), "");
}

#[wasm_bindgen_test]
fn test_cancelled_idle_task_is_dropped() {
    let host = BrowserHost::new().unwrap();
    let ran = Rc::new(Cell::new(false));
    let flag = Rc::clone(&ran);
    let handle = host
        .request_idle(Duration::from_millis(250), Box::new(move || flag.set(true)))
        .unwrap();
    assert_eq!(host.pending_idle(), 1);

    host.cancel_idle(handle);

    assert_eq!(host.pending_idle(), 0);
    assert!(!ran.get());
}

// === Mounting ===

#[wasm_bindgen_test]
fn test_mount_builds_default_document() {
    let container = container();
    let mounted = mount(&container, EditorConfig::default()).unwrap();
    let editor = mounted.editor().borrow();

    let root = container.first_element_child().unwrap();
    assert_eq!(root.class_name(), "md-editor");
    assert_eq!(root.child_element_count(), 2);
    assert_eq!(editor.blocks()[0].kind(), BlockKind::Header);
    assert_eq!(editor.blocks()[1].kind(), BlockKind::UnorderedList);
    assert!(container.query_selector("h1.md-header > input").unwrap().is_some());
    assert!(container.query_selector("ul.md-unordered-list > li").unwrap().is_some());
}

#[wasm_bindgen_test]
fn test_block_ids_round_trip_through_attributes() {
    let container = container();
    let mounted = mount(&container, header_only()).unwrap();
    let editor = mounted.editor().borrow();
    let header = editor.blocks()[0].as_header().unwrap();

    let input = header.input_node().unwrap();
    assert!(input.has_attribute(BLOCK_ID_ATTR));
    assert_eq!(parse_block_id(input), Some(header.id()));
    assert_eq!(parse_block_id(&container), None);
}

#[wasm_bindgen_test]
fn test_enter_on_header_creates_paragraph() {
    let container = container();
    let mounted = mount(&container, header_only()).unwrap();
    let input = mounted.editor().borrow().blocks()[0]
        .as_header()
        .unwrap()
        .input_node()
        .cloned()
        .unwrap();

    let not_cancelled = dispatch_key(&input, "Enter");

    assert!(!not_cancelled);
    let editor = mounted.editor().borrow();
    assert_eq!(editor.len(), 2);
    let paragraph = editor.blocks()[1].as_paragraph().unwrap();
    let root = container.first_element_child().unwrap();
    assert_eq!(root.last_element_child().as_ref(), paragraph.node());
    assert!(container.query_selector("p.md-paragraph > textarea").unwrap().is_some());
}

#[wasm_bindgen_test]
fn test_other_keys_pass_through() {
    let container = container();
    let mounted = mount(&container, header_only()).unwrap();
    let input = mounted.editor().borrow().blocks()[0]
        .as_header()
        .unwrap()
        .input_node()
        .cloned()
        .unwrap();

    assert!(dispatch_key(&input, "a"));
    assert_eq!(mounted.editor().borrow().len(), 1);
}

#[wasm_bindgen_test]
fn test_input_event_updates_model() {
    let container = container();
    let mounted = mount(&container, header_only()).unwrap();
    let input = mounted.editor().borrow().blocks()[0]
        .as_header()
        .unwrap()
        .input_node()
        .cloned()
        .unwrap();

    input
        .dyn_ref::<web_sys::HtmlInputElement>()
        .unwrap()
        .set_value("Typed title");
    dispatch_input(&input);

    let editor = mounted.editor().borrow();
    assert_eq!(editor.blocks()[0].text(), Some("Typed title"));
}

#[wasm_bindgen_test]
fn test_change_handler_can_read_editor() {
    let container = container();
    let mounted = mount(&container, header_only()).unwrap();
    let input = mounted.editor().borrow().blocks()[0]
        .as_header()
        .unwrap()
        .input_node()
        .cloned()
        .unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let editor = Rc::clone(mounted.editor());
    let log = Rc::clone(&seen);
    let id = mounted
        .on_change(move |_| {
            let text = match editor.try_borrow() {
                Ok(editor) => editor.outline(),
                Err(_) => "busy".to_string(),
            };
            log.borrow_mut().push(text);
        })
        .unwrap();

    input
        .dyn_ref::<web_sys::HtmlInputElement>()
        .unwrap()
        .set_value("Live title");
    dispatch_input(&input);

    assert_eq!(seen.borrow().len(), 1);
    assert!(seen.borrow()[0].contains("Live title"));

    assert!(mounted.remove_change_handler(id).unwrap());
    dispatch_input(&input);
    assert_eq!(seen.borrow().len(), 1);
}

#[wasm_bindgen_test]
fn test_list_enter_renumbers_placeholders() {
    let container = container();
    let mounted = mount(&container, EditorConfig::default()).unwrap();
    let item_input = {
        let editor = mounted.editor().borrow();
        let Block::List(list) = &editor.blocks()[1] else {
            panic!("expected a list");
        };
        list.items()[0].input_node().cloned().unwrap()
    };

    dispatch_key(&item_input, "Enter");

    let editor = mounted.editor().borrow();
    let list = editor.blocks()[1].as_list().unwrap();
    assert_eq!(list.len(), 2);
    let placeholders: Vec<_> = list
        .items()
        .iter()
        .map(|item| item.input_node().unwrap().get_attribute("placeholder").unwrap())
        .collect();
    assert_eq!(placeholders, vec!["Item 1", "Item 2"]);
}

#[wasm_bindgen_test]
fn test_handle_key_outcome_for_existing_next() {
    let container = container();
    let mounted = mount(&container, EditorConfig::default()).unwrap();
    let header = mounted.editor().borrow().blocks()[0].id();

    let outcome = mounted
        .editor()
        .borrow_mut()
        .handle_key(header, "Enter")
        .unwrap();
    assert_eq!(outcome, KeyOutcome::FocusNext);
}

#[wasm_bindgen_test]
fn test_unmount_removes_root() {
    let container = container();
    let mounted = mount(&container, EditorConfig::default()).unwrap();
    assert_eq!(container.child_element_count(), 1);

    mounted.unmount();

    assert_eq!(container.child_element_count(), 0);
}
