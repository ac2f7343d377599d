use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use gloo_events::EventListener;
use log::{error, info, Level};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlCanvasElement;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::web::{EventLoopExtWebSys, WindowBuilderExtWebSys};
use winit::window::WindowBuilder;

use crate::app::CardApp;
use crate::assets::{load_assets, AssetPaths, AssetSource};
use crate::card::{CardLayout, CardState};
use crate::config::{ASSET_ROOT, CANVAS_ID, WINDOW_TITLE};
use crate::pages::PageBook;
use crate::render::Renderer;

/// Starts the card on the `<canvas>` with id `canvas_id`, or `card-canvas`
/// when none is given. Resolves once assets are loaded and the frame loop
/// is running.
#[wasm_bindgen]
pub async fn start(canvas_id: Option<String>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(Level::Info));

    run(canvas_id.as_deref().unwrap_or(CANVAS_ID))
        .await
        .map_err(|err| JsValue::from_str(&format!("{err:?}")))
}

async fn run(canvas_id: &str) -> Result<()> {
    let web_window = web_sys::window().ok_or_else(|| anyhow!("missing window"))?;
    let canvas = find_canvas(&web_window, canvas_id)?;

    let book = PageBook::builtin().context("failed to parse the builtin page book")?;
    let assets = load_assets(&FetchSource::new(ASSET_ROOT), &AssetPaths::default()).await;
    let card = CardState::new(book, assets.font, assets.heart, CardLayout::default());
    info!(
        "card ready with {} pages (heart: {}, text: {})",
        card.book().len(),
        card.has_heart(),
        card.is_ready()
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_canvas(Some(canvas.clone()))
            .build(&event_loop)
            .context("failed to attach to canvas")?,
    );
    let renderer = Renderer::new(Arc::clone(&window)).await?;

    // Taps are collected from the DOM and drained on the next frame.
    let taps = Rc::new(Cell::new(0u32));
    let listener = {
        let taps = Rc::clone(&taps);
        EventListener::new(&web_window, "pointerdown", move |_| {
            taps.set(taps.get() + 1);
        })
    };

    let mut state = WebCard {
        app: CardApp::new(card, client_size(&canvas)),
        renderer,
        canvas,
        taps,
        _listener: listener,
    };

    event_loop.spawn(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent {
                event: WindowEvent::RedrawRequested,
                window_id,
            } if window_id == state.renderer.window_id() => {
                if let Err(err) = state.frame() {
                    error!("stopping: {err:?}");
                    elwt.exit();
                }
            }
            Event::AboutToWait => state.renderer.window().request_redraw(),
            _ => {}
        }
    });

    Ok(())
}

struct WebCard {
    app: CardApp,
    renderer: Renderer,
    canvas: HtmlCanvasElement,
    taps: Rc<Cell<u32>>,
    _listener: EventListener,
}

impl WebCard {
    fn frame(&mut self) -> Result<()> {
        for _ in 0..self.taps.replace(0) {
            self.app.pointer_down();
        }
        let client = client_size(&self.canvas);
        self.app.redraw(&mut self.renderer, client)
    }
}

/// The size the canvas is displayed at, in CSS pixels.
fn client_size(canvas: &HtmlCanvasElement) -> (u32, u32) {
    (
        canvas.client_width().max(0) as u32,
        canvas.client_height().max(0) as u32,
    )
}

fn find_canvas(window: &web_sys::Window, canvas_id: &str) -> Result<HtmlCanvasElement> {
    window
        .document()
        .ok_or_else(|| anyhow!("missing document"))?
        .get_element_by_id(canvas_id)
        .ok_or_else(|| anyhow!("no element with id {canvas_id:?}"))?
        .dyn_into()
        .map_err(|_| anyhow!("element {canvas_id:?} is not a canvas"))
}

/// Fetches assets over HTTP relative to a base URL.
pub struct FetchSource {
    base: String,
}

impl FetchSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl AssetSource for FetchSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.base.trim_end_matches('/'), path);
        let window = web_sys::window().ok_or_else(|| anyhow!("missing window"))?;
        let response: web_sys::Response = JsFuture::from(window.fetch_with_str(&url))
            .await
            .map_err(|err| js_error(&url, err))?
            .dyn_into()
            .map_err(|err| js_error(&url, err))?;
        if !response.ok() {
            return Err(anyhow!("{url} returned HTTP {}", response.status()));
        }
        let body = response.array_buffer().map_err(|err| js_error(&url, err))?;
        let buffer = JsFuture::from(body)
            .await
            .map_err(|err| js_error(&url, err))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

fn js_error(url: &str, value: JsValue) -> anyhow::Error {
    anyhow!("fetching {url} failed: {value:?}")
}
