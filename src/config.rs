//! Fixed values shared by the native and browser front ends.

/// DOM id of the `<canvas>` the browser build draws into.
pub const CANVAS_ID: &str = "card-canvas";

/// Default directory (native) or URL prefix (web) for card assets.
pub const ASSET_ROOT: &str = "assets";

pub const MODEL_FILE: &str = "heart.obj";
pub const FONT_FILE: &str = "font.typeface.json";

/// Page book compiled into the binary.
pub const BUILTIN_PAGES: &str = include_str!("../assets/card.xml");

pub const WINDOW_TITLE: &str = "Heart Card";
pub const WINDOW_WIDTH: f64 = 960.0;
pub const WINDOW_HEIGHT: f64 = 720.0;

/// Frame step used by headless simulation.
pub const HEADLESS_FRAME_DT: f32 = 1.0 / 60.0;
