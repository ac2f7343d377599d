use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::info;
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use heartcard::config::{
    ASSET_ROOT, HEADLESS_FRAME_DT, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH,
};
use heartcard::{
    is_pointer_down, load_assets, simulate_taps, AssetPaths, CardApp, CardLayout, CardState,
    FileSource, PageBook, Renderer,
};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let book = match &options.pages {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read page book {path}"))?;
            PageBook::from_xml(&xml).with_context(|| format!("failed to parse page book {path}"))?
        }
        None => PageBook::builtin().context("failed to parse the builtin page book")?,
    };

    let source = FileSource::new(&options.assets);
    let assets = block_on(load_assets(&source, &AssetPaths::default()));
    let card = CardState::new(book, assets.font, assets.heart, CardLayout::default());

    println!(
        "Loaded card with {} pages (heart: {}, text: {})",
        card.book().len(),
        yes_no(card.has_heart()),
        yes_no(card.is_ready())
    );

    if options.headless {
        run_headless(card, &options);
        return Ok(());
    }

    match run_interactive(card) {
        Ok(()) => Ok(()),
        Err(Interactive::Unavailable(err, card)) => {
            eprintln!("{err}. Falling back to --headless mode (set DISPLAY to open a window).");
            run_headless(*card, &options);
            Ok(())
        }
        Err(Interactive::Failed(err)) => Err(err),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn run_headless(mut card: CardState, options: &CliOptions) {
    let reports = simulate_taps(&mut card, options.taps, options.frames, HEADLESS_FRAME_DT);
    for report in &reports {
        println!("{report}");
    }
    println!(
        "Final page {} on the {} face",
        card.page_index(),
        card.visible_face().label()
    );
}

enum Interactive {
    /// No window could be opened. The card is handed back untouched.
    Unavailable(WindowInitError, Box<CardState>),
    Failed(anyhow::Error),
}

impl From<anyhow::Error> for Interactive {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err)
    }
}

fn run_interactive(card: CardState) -> Result<(), Interactive> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = match event_loop {
        Ok(Ok(event_loop)) => event_loop,
        Ok(Err(err)) => {
            return Err(Interactive::Unavailable(
                WindowInitError::from_error("event loop", err),
                Box::new(card),
            ))
        }
        Err(panic) => {
            return Err(Interactive::Unavailable(
                WindowInitError::from_panic("event loop", panic),
                Box::new(card),
            ))
        }
    };
    let window = match WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            return Err(Interactive::Unavailable(
                WindowInitError::from_error("window", err),
                Box::new(card),
            ))
        }
    };

    let mut renderer = block_on(Renderer::new(Arc::clone(&window)))?;
    let size = window.inner_size();
    let mut app = CardApp::new(card, (size.width, size.height));
    info!("window open; click or touch the card to turn the page");

    let mut last_error: Option<anyhow::Error> = None;
    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, window_id } if window_id == renderer.window_id() => {
                    match event {
                        WindowEvent::CloseRequested
                        | WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key: Key::Named(NamedKey::Escape),
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => elwt.exit(),
                        // The surface follows on the next redraw so the camera
                        // aspect is updated with it.
                        WindowEvent::Resized(_) => renderer.window().request_redraw(),
                        WindowEvent::RedrawRequested => {
                            let size = renderer.window().inner_size();
                            if let Err(err) = app.redraw(&mut renderer, (size.width, size.height))
                            {
                                last_error = Some(err);
                                elwt.exit();
                            }
                        }
                        ref other if is_pointer_down(other) => {
                            app.pointer_down();
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => renderer.window().request_redraw(),
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop failed: {err}"))?;

    println!(
        "Closed on page {} ({} face)",
        app.card().page_index(),
        app.card().visible_face().label()
    );

    match last_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

const USAGE: &str =
    "Usage: heartcard [--assets DIR] [--pages FILE] [--headless] [--taps N] [--frames N]";

#[derive(Debug, PartialEq)]
struct CliOptions {
    assets: String,
    pages: Option<String>,
    headless: bool,
    taps: usize,
    frames: Option<u32>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            assets: ASSET_ROOT.to_string(),
            pages: None,
            headless: false,
            taps: 3,
            frames: None,
        }
    }
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => options.headless = true,
                "--assets" => options.assets = value(&mut args, "--assets")?,
                "--pages" => options.pages = Some(value(&mut args, "--pages")?),
                "--taps" => {
                    options.taps = value(&mut args, "--taps")?
                        .parse()
                        .context("--taps expects a non-negative integer")?;
                }
                "--frames" => {
                    let frames = value(&mut args, "--frames")?
                        .parse()
                        .context("--frames expects a non-negative integer")?;
                    options.frames = Some(frames);
                }
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}
