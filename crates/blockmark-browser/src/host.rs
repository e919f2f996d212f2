//! DOM implementation of the core host traits.
//!
//! Nodes are `web_sys::Element` handles. Idle tasks use `requestIdleCallback`
//! with a timeout where the browser has it, and fall back to `setTimeout`
//! elsewhere (Safari).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use blockmark_core::{IdleHandle, IdleScheduler, PlatformError, Surface};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

fn js_error(context: &str, err: JsValue) -> PlatformError {
    PlatformError(format!("{context}: {err:?}"))
}

#[derive(Clone, Copy, Debug)]
enum Scheduled {
    Idle(u32),
    Timeout(i32),
}

/// A scheduled task's browser handle and the closure the browser will call.
struct Pending {
    scheduled: Scheduled,
    _closure: Closure<dyn FnMut()>,
}

#[derive(Default)]
struct IdleRegistry {
    next_handle: u32,
    pending: HashMap<u32, Pending>,
    /// Tasks that already ran. Their closures are dropped on the next
    /// scheduling call, never from inside the closure itself.
    fired: Vec<u32>,
}

impl IdleRegistry {
    fn purge_fired(&mut self) {
        for handle in self.fired.drain(..) {
            self.pending.remove(&handle);
        }
    }
}

/// Browser DOM host.
#[derive(Clone)]
pub struct BrowserHost {
    window: web_sys::Window,
    document: web_sys::Document,
    idle: Rc<RefCell<IdleRegistry>>,
}

impl std::fmt::Debug for BrowserHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserHost")
            .field("pending_idle", &self.idle.borrow().pending.len())
            .finish()
    }
}

impl BrowserHost {
    /// Host bound to the global window.
    pub fn new() -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or(PlatformError::from("no global window"))?;
        let document = window
            .document()
            .ok_or(PlatformError::from("window has no document"))?;
        Ok(Self {
            window,
            document,
            idle: Rc::new(RefCell::new(IdleRegistry::default())),
        })
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }

    /// Number of idle tasks scheduled and not yet run or cancelled.
    pub fn pending_idle(&self) -> usize {
        let idle = self.idle.borrow();
        idle.pending.len().saturating_sub(idle.fired.len())
    }

    fn has_idle_callback(&self) -> bool {
        js_sys::Reflect::has(&self.window, &JsValue::from_str("requestIdleCallback"))
            .unwrap_or(false)
    }
}

impl Surface for BrowserHost {
    type Node = web_sys::Element;

    fn create_element(&self, tag: &str) -> Result<web_sys::Element, PlatformError> {
        self.document
            .create_element(tag)
            .map_err(|e| js_error("createElement", e))
    }

    fn set_class(&self, node: &web_sys::Element, class: &str) -> Result<(), PlatformError> {
        node.set_class_name(class);
        Ok(())
    }

    fn add_class(&self, node: &web_sys::Element, class: &str) -> Result<(), PlatformError> {
        node.class_list()
            .add_1(class)
            .map_err(|e| js_error("classList.add", e))
    }

    fn set_attribute(
        &self,
        node: &web_sys::Element,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        node.set_attribute(name, value)
            .map_err(|e| js_error("setAttribute", e))
    }

    fn append_child(
        &self,
        parent: &web_sys::Element,
        child: &web_sys::Element,
    ) -> Result<(), PlatformError> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(|e| js_error("appendChild", e))
    }

    fn insert_before(
        &self,
        parent: &web_sys::Element,
        child: &web_sys::Element,
        reference: Option<&web_sys::Element>,
    ) -> Result<(), PlatformError> {
        let reference: Option<&web_sys::Node> = reference.map(|r| r.as_ref());
        parent
            .insert_before(child, reference)
            .map(|_| ())
            .map_err(|e| js_error("insertBefore", e))
    }

    fn remove_child(
        &self,
        parent: &web_sys::Element,
        child: &web_sys::Element,
    ) -> Result<(), PlatformError> {
        parent
            .remove_child(child)
            .map(|_| ())
            .map_err(|e| js_error("removeChild", e))
    }

    fn parent(&self, node: &web_sys::Element) -> Option<web_sys::Element> {
        node.parent_element()
    }

    fn next_sibling(&self, node: &web_sys::Element) -> Option<web_sys::Element> {
        node.next_element_sibling()
    }

    fn previous_sibling(&self, node: &web_sys::Element) -> Option<web_sys::Element> {
        node.previous_element_sibling()
    }

    fn children(&self, node: &web_sys::Element) -> Vec<web_sys::Element> {
        let children = node.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .collect()
    }

    fn tag_name(&self, node: &web_sys::Element) -> String {
        node.tag_name().to_lowercase()
    }

    fn set_value(&self, node: &web_sys::Element, value: &str) -> Result<(), PlatformError> {
        if let Some(input) = node.dyn_ref::<web_sys::HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(textarea) = node.dyn_ref::<web_sys::HtmlTextAreaElement>() {
            textarea.set_value(value);
        } else {
            return Err(PlatformError(format!(
                "<{}> has no value",
                self.tag_name(node)
            )));
        }
        Ok(())
    }

    fn value(&self, node: &web_sys::Element) -> String {
        if let Some(input) = node.dyn_ref::<web_sys::HtmlInputElement>() {
            input.value()
        } else if let Some(textarea) = node.dyn_ref::<web_sys::HtmlTextAreaElement>() {
            textarea.value()
        } else {
            String::new()
        }
    }

    fn set_placeholder(
        &self,
        node: &web_sys::Element,
        placeholder: &str,
    ) -> Result<(), PlatformError> {
        self.set_attribute(node, "placeholder", placeholder)
    }

    fn set_rows(&self, node: &web_sys::Element, rows: u32) -> Result<(), PlatformError> {
        let textarea = node
            .dyn_ref::<web_sys::HtmlTextAreaElement>()
            .ok_or(PlatformError::from("rows only apply to textareas"))?;
        textarea.set_rows(rows);
        Ok(())
    }

    fn focus(&self, node: &web_sys::Element) -> Result<(), PlatformError> {
        let element = node
            .dyn_ref::<web_sys::HtmlElement>()
            .ok_or(PlatformError::from("element cannot take focus"))?;
        element.focus().map_err(|e| js_error("focus", e))
    }
}

impl IdleScheduler for BrowserHost {
    fn request_idle(
        &self,
        timeout: Duration,
        task: Box<dyn FnOnce()>,
    ) -> Result<IdleHandle, PlatformError> {
        let mut idle = self.idle.borrow_mut();
        idle.purge_fired();
        let handle = idle.next_handle;
        idle.next_handle = idle.next_handle.wrapping_add(1);

        let registry = Rc::downgrade(&self.idle);
        let closure = Closure::once(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().fired.push(handle);
            }
            task();
        });

        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as u32;
        let callback = closure.as_ref().unchecked_ref();
        let scheduled = if self.has_idle_callback() {
            let options = web_sys::IdleRequestOptions::new();
            options.set_timeout(timeout_ms);
            self.window
                .request_idle_callback_with_options(callback, &options)
                .map(Scheduled::Idle)
                .map_err(|e| js_error("requestIdleCallback", e))?
        } else {
            self.window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback,
                    timeout_ms as i32,
                )
                .map(Scheduled::Timeout)
                .map_err(|e| js_error("setTimeout", e))?
        };

        tracing::trace!(handle, ?scheduled, "idle task scheduled");
        idle.pending.insert(
            handle,
            Pending {
                scheduled,
                _closure: closure,
            },
        );
        Ok(IdleHandle(handle))
    }

    fn cancel_idle(&self, handle: IdleHandle) {
        let Ok(mut idle) = self.idle.try_borrow_mut() else {
            tracing::warn!(?handle, "idle registry busy, cancel skipped");
            return;
        };
        if idle.fired.contains(&handle.0) {
            return;
        }
        if let Some(pending) = idle.pending.remove(&handle.0) {
            match pending.scheduled {
                Scheduled::Idle(id) => self.window.cancel_idle_callback(id),
                Scheduled::Timeout(id) => self.window.clear_timeout_with_handle(id),
            }
            tracing::trace!(?handle, "idle task cancelled");
        }
    }
}
