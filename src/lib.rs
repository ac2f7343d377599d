//! A rotating 3D greeting card.
//!
//! The card shows a heart model and one page of poem text on whichever of
//! its two faces points at the viewer. A tap flips the card half a turn and
//! reveals the next page. The flip controller, text layout and resize
//! handling are plain data and stay testable without a GPU; `wgpu` and
//! `winit` are only touched by [`render`], [`app`] and the front ends.

pub mod app;
pub mod assets;
pub mod camera;
pub mod card;
pub mod config;
pub mod error;
pub mod flip;
pub mod font;
pub mod mesh;
pub mod obj;
pub mod pages;
pub mod render;
pub mod scene;
pub mod text;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{is_pointer_down, simulate_taps, CardApp, FrameClock, TapReport};
pub use assets::{load_assets, AssetPaths, AssetSource, FileSource, LoadedAssets};
pub use camera::PerspectiveCamera;
pub use card::{CardLayout, CardState, TapOutcome};
pub use error::CardError;
pub use flip::{Face, FlipPhase, FLIP_RATE};
pub use font::Font;
pub use mesh::{Mesh, MeshHandle, MeshStore};
pub use obj::load_obj_from_str;
pub use pages::{Page, PageBook};
pub use render::{CameraParams, LightParams, Renderer};
pub use scene::{DrawItem, SceneNode, Transform};
pub use text::{build_text_mesh, layout_page, TextMesh, TextStyle};
pub use viewport::{reconcile, RenderSurface};
