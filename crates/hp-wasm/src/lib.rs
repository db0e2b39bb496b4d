//! WASM bridge for hoverplot: exposes the interactive chart to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page forwards pointer
//! samples from the chart container and applies the returned state, or
//! swaps in the re-serialized markup.

use hp_core::{EventKind, PlotData, parse_document};
use hp_engine::{HoverState, InteractiveChart, PointerInput, TooltipState};
use hp_render::Placement;
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;

/// The WASM-facing chart controller.
///
/// Starts empty; [`HoverChart::load`] parses the page fragment and binds
/// every axes. All other calls are no-ops until a load succeeds.
#[wasm_bindgen]
#[derive(Default)]
pub struct HoverChart {
    chart: Option<InteractiveChart>,
}

#[wasm_bindgen]
impl HoverChart {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook_setup();
        Self::default()
    }

    /// Load SVG (or an HTML fragment holding the SVG and `#tooltip`) with
    /// its plot-data JSON. Returns `{"ok":true,"axes":[...]}` or
    /// `{"ok":false,"error":"..."}`.
    pub fn load(&mut self, markup: &str, plot_data: &str) -> String {
        match build_chart(markup, plot_data) {
            Ok(chart) => {
                let axes: Vec<&str> = chart
                    .registries()
                    .iter()
                    .map(|r| r.axes_id.as_str())
                    .collect();
                let reply = json!({ "ok": true, "axes": axes }).to_string();
                self.chart = Some(chart);
                reply
            }
            Err(e) => {
                log::warn!("chart load failed: {e}");
                self.chart = None;
                error_json(&e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.chart.is_some()
    }

    /// Where the `<svg>` is drawn in client pixels (`getBoundingClientRect`).
    pub fn set_placement(&mut self, left: f64, top: f64, width: f64, height: f64) {
        if let Some(chart) = &mut self.chart {
            chart.set_placement(Placement {
                left,
                top,
                width,
                height,
            });
        }
    }

    /// Feed one `mousemove` sample. Returns the number of listeners run.
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64, page_x: f64, page_y: f64) -> u32 {
        self.handle(PointerInput::Move {
            client_x,
            client_y,
            page_x,
            page_y,
        })
    }

    /// The pointer left the chart container.
    pub fn pointer_leave(&mut self) -> u32 {
        self.handle(PointerInput::Leave)
    }

    /// Forward a DOM pointer event from the chart container by name, e.g.
    /// from a single listener registered for `mousemove` and `mouseleave`.
    /// Over/move events become a pointer sample and out/leave events a
    /// leave. Unknown names are ignored.
    pub fn pointer_event(
        &mut self,
        name: &str,
        client_x: f64,
        client_y: f64,
        page_x: f64,
        page_y: f64,
    ) -> u32 {
        match EventKind::from_name(name) {
            Some(EventKind::MouseOver | EventKind::MouseMove) => {
                self.pointer_move(client_x, client_y, page_x, page_y)
            }
            Some(EventKind::MouseOut) => self.pointer_leave(),
            None => {
                log::debug!("ignoring {name} event");
                0
            }
        }
    }

    /// Tooltip state as JSON, `null` when the page has no tooltip.
    pub fn tooltip_state(&self) -> String {
        self.chart
            .as_ref()
            .and_then(InteractiveChart::tooltip_state)
            .map_or(Value::Null, |tip| tooltip_json(&tip))
            .to_string()
    }

    /// Highlight state of every plot element as a JSON array.
    pub fn element_states(&self) -> String {
        let Some(chart) = &self.chart else {
            return "[]".to_string();
        };
        let doc = chart.document();
        let states: Vec<Value> = chart
            .element_states()
            .into_iter()
            .map(|e| {
                json!({
                    "axes": e.axes_id,
                    "index": e.index,
                    "id": doc.attr(e.node, "id"),
                    "category": e.category.class_name(),
                    "state": state_name(e.state),
                })
            })
            .collect();
        Value::Array(states).to_string()
    }

    /// The annotated markup with current highlight classes.
    pub fn to_markup(&self) -> String {
        self.chart
            .as_ref()
            .map(InteractiveChart::to_markup)
            .unwrap_or_default()
    }

    /// Remove every listener. Returns how many were removed.
    pub fn detach(&mut self) -> u32 {
        self.chart
            .as_mut()
            .map_or(0, |chart| chart.detach_all() as u32)
    }
}

impl HoverChart {
    fn handle(&mut self, input: PointerInput) -> u32 {
        self.chart
            .as_mut()
            .map_or(0, |chart| chart.handle(input).handled as u32)
    }
}

fn build_chart(markup: &str, plot_data: &str) -> Result<InteractiveChart, String> {
    let data = if plot_data.trim().is_empty() {
        PlotData::default()
    } else {
        PlotData::from_json(plot_data)?
    };
    InteractiveChart::from_markup(markup, &data)
}

fn state_name(state: HoverState) -> &'static str {
    match state {
        HoverState::Neutral => "neutral",
        HoverState::Hovered => "hovered",
        HoverState::NotHovered => "not-hovered",
    }
}

fn tooltip_json(tip: &TooltipState) -> Value {
    json!({
        "visible": tip.is_visible(),
        "display": tip.display,
        "left": tip.left,
        "top": tip.top,
        "content": tip.content,
    })
}

fn error_json(error: &str) -> String {
    json!({ "ok": false, "error": error }).to_string()
}

/// Set up a panic hook that logs to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("hoverplot panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone functions (no chart needed) ──────────────────────────────

/// Check that markup parses. Returns `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(markup: &str) -> String {
    match parse_document(markup) {
        Ok(_) => r#"{"ok":true}"#.to_string(),
        Err(e) => error_json(&e),
    }
}

/// Classify every axes and return the annotated markup without binding
/// anything. Returns `{"ok":true,"markup":"..."}` or an error object.
#[wasm_bindgen]
pub fn annotate(markup: &str, plot_data: &str) -> String {
    match build_chart(markup, plot_data) {
        Ok(mut chart) => {
            chart.detach_all();
            json!({ "ok": true, "markup": chart.to_markup() }).to_string()
        }
        Err(e) => error_json(&e),
    }
}
