//! WebAssembly bindings for iconmark-core.
//!
//! The browser host forwards DOM events as JSON [`InputEvent`]s and replays
//! the JSON [`DrawCommand`](crate::DrawCommand) list returned by `redraw`
//! onto its canvas 2D context.

use wasm_bindgen::prelude::*;

use crate::{
    Annotator, ImageSource, InputEvent, LoadTicket, PersistedIconRecord, RecordingSurface, Size,
};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Annotator instance for WASM.
#[wasm_bindgen]
pub struct WasmAnnotator {
    annotator: Annotator,
}

#[wasm_bindgen]
impl WasmAnnotator {
    /// Create an annotator over `background` with the given canvas size.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(background: &str, width: f32, height: f32) -> Self {
        Self {
            annotator: Annotator::new(Size::new(width, height))
                .with_background(ImageSource::new(background)),
        }
    }

    /// Handle one JSON-encoded input event. Returns whether to redraw.
    ///
    /// # Errors
    ///
    /// Returns an error string if the event JSON is malformed.
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, json: &str) -> Result<bool, String> {
        let event: InputEvent = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(self.annotator.handle_event(&event).is_needed())
    }

    /// Draw commands for the live view, as JSON.
    #[wasm_bindgen]
    #[must_use]
    pub fn redraw(&self) -> String {
        let mut surface = RecordingSurface::new(self.annotator.canvas_size());
        self.annotator.redraw(&mut surface);
        serde_json::to_string(surface.commands()).unwrap_or_default()
    }

    /// Draw commands for the export image, as JSON.
    #[wasm_bindgen(js_name = exportCommands)]
    #[must_use]
    pub fn export_commands(&self) -> String {
        let mut surface = RecordingSurface::new(self.annotator.canvas_size());
        self.annotator.render_export(&mut surface);
        serde_json::to_string(surface.commands()).unwrap_or_default()
    }

    /// Placed icons in their persisted JSON form.
    #[wasm_bindgen(js_name = iconsJson)]
    #[must_use]
    pub fn icons_json(&self) -> String {
        serde_json::to_string(&self.annotator.records()).unwrap_or_default()
    }

    /// Mark the start of a fetch. The returned generation must be passed
    /// back to `finishLoad` with the fetched records.
    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&mut self) -> u64 {
        self.annotator.begin_load().generation()
    }

    /// Replace the icons with the JSON array fetched for `generation`.
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON is malformed or a newer load
    /// superseded this one; the icons are left unchanged.
    #[wasm_bindgen(js_name = finishLoad)]
    pub fn finish_load(&mut self, generation: u64, json: &str) -> Result<(), String> {
        let records: Vec<PersistedIconRecord> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.annotator
            .apply_load(LoadTicket::from_generation(generation), records)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Current canvas width.
    #[wasm_bindgen(js_name = canvasWidth)]
    #[must_use]
    pub fn canvas_width(&self) -> f32 {
        self.annotator.canvas_size().width
    }

    /// Current canvas height.
    #[wasm_bindgen(js_name = canvasHeight)]
    #[must_use]
    pub fn canvas_height(&self) -> f32 {
        self.annotator.canvas_size().height
    }

    /// Current mode name (`idle`, `panning`, `annotating`, `removing`).
    #[wasm_bindgen]
    #[must_use]
    pub fn mode(&self) -> String {
        serde_json::to_value(self.annotator.mode())
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }
}
