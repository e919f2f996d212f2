//! JsEditor - the editor wrapper for JavaScript.

use std::cell::Ref;

use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use blockmark_browser::{BrowserHost, MountedEditor, mount};
use blockmark_core::{BlockEvent, Editor, EditorConfig, ListenerId};

use crate::types::JsChange;

/// A block editor mounted into a page.
#[wasm_bindgen]
pub struct JsEditor {
    mounted: Option<MountedEditor>,
    change_listener: Option<ListenerId>,
}

#[wasm_bindgen]
impl JsEditor {
    /// Build an editor inside `container`.
    ///
    /// `config` is an optional partial `EditorConfig` object; omitted fields
    /// take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(container: &HtmlElement, config: JsValue) -> Result<JsEditor, JsError> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
        };
        let mounted = mount(container, config)?;
        Ok(Self {
            mounted: Some(mounted),
            change_listener: None,
        })
    }

    /// Check if the editor is mounted.
    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Focus the first block.
    #[wasm_bindgen]
    pub fn focus(&self) -> Result<(), JsError> {
        self.editor()?.focus()?;
        Ok(())
    }

    /// Number of top-level blocks.
    #[wasm_bindgen(js_name = blockCount)]
    pub fn block_count(&self) -> Result<usize, JsError> {
        Ok(self.editor()?.len())
    }

    /// Text summary of the document, one line per block.
    #[wasm_bindgen]
    pub fn outline(&self) -> Result<String, JsError> {
        Ok(self.editor()?.outline())
    }

    /// Set the change callback, replacing any previous one.
    ///
    /// The callback receives `{ blockId, kind }` after each edit, once the
    /// editor has finished handling the event, so it may call back into
    /// this editor. Pass `undefined` to remove it.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&mut self, callback: Option<js_sys::Function>) -> Result<(), JsError> {
        let mounted = self.mounted()?;
        if let Some(previous) = self.change_listener {
            mounted.remove_change_handler(previous)?;
        }
        let Some(callback) = callback else {
            self.change_listener = None;
            return Ok(());
        };

        let id = mounted.on_change(move |event: &BlockEvent| {
            let Some(change) = JsChange::from_event(event) else {
                return;
            };
            let payload = match serde_wasm_bindgen::to_value(&change) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(%err, "change payload serialization failed");
                    return;
                }
            };
            if let Err(err) = callback.call1(&JsValue::null(), &payload) {
                tracing::warn!(?err, "onChange callback threw");
            }
        })?;
        self.change_listener = Some(id);
        Ok(())
    }

    /// Unmount the editor and clean up.
    #[wasm_bindgen]
    pub fn unmount(&mut self) {
        self.change_listener = None;
        if let Some(mounted) = self.mounted.take() {
            mounted.unmount();
        }
    }
}

impl JsEditor {
    fn mounted(&self) -> Result<&MountedEditor, JsError> {
        self.mounted
            .as_ref()
            .ok_or_else(|| JsError::new("Editor is not mounted"))
    }

    fn editor(&self) -> Result<Ref<'_, Editor<BrowserHost>>, JsError> {
        self.mounted()?
            .editor()
            .try_borrow()
            .map_err(|_| JsError::new("Editor is busy"))
    }
}
