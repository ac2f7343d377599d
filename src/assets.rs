use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{error, info};

use crate::config::{ASSET_ROOT, FONT_FILE, MODEL_FILE};
use crate::font::Font;
use crate::mesh::Mesh;
use crate::obj::load_obj_from_str;

/// Where card assets are read from.
pub trait AssetSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(ASSET_ROOT)
    }
}

impl AssetSource for FileSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root.join(path);
        std::fs::read(&full).with_context(|| format!("unable to read {}", full.display()))
    }
}

/// Names of the model and font files, relative to an [`AssetSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub model: String,
    pub font: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            model: MODEL_FILE.to_string(),
            font: FONT_FILE.to_string(),
        }
    }
}

/// Whatever could be loaded. A missing entry means its load failed and the
/// failure has been logged.
#[derive(Debug, Default)]
pub struct LoadedAssets {
    pub heart: Option<Mesh>,
    pub font: Option<Font>,
}

/// Loads the heart model and then the font. Failures are logged and leave
/// the matching field empty; nothing is retried.
pub async fn load_assets<S: AssetSource>(source: &S, paths: &AssetPaths) -> LoadedAssets {
    let heart = match load_model(source, &paths.model).await {
        Ok(mesh) => {
            info!(
                "loaded model {} ({} vertices)",
                paths.model,
                mesh.vertex_count()
            );
            Some(mesh)
        }
        Err(err) => {
            error!("failed to load model {}: {err:?}", paths.model);
            None
        }
    };

    let font = match load_font(source, &paths.font).await {
        Ok(font) => {
            info!(
                "loaded font {:?} ({} glyphs)",
                font.family(),
                font.glyph_count()
            );
            Some(font)
        }
        Err(err) => {
            error!("failed to load font {}: {err:?}", paths.font);
            None
        }
    };

    LoadedAssets { heart, font }
}

async fn load_model<S: AssetSource>(source: &S, path: &str) -> Result<Mesh> {
    let bytes = source.fetch(path).await?;
    let text = String::from_utf8(bytes).with_context(|| format!("{path} is not valid UTF-8"))?;
    load_obj_from_str(&text).with_context(|| format!("failed to parse OBJ model {path}"))
}

async fn load_font<S: AssetSource>(source: &S, path: &str) -> Result<Font> {
    let bytes = source.fetch(path).await?;
    let text = String::from_utf8(bytes).with_context(|| format!("{path} is not valid UTF-8"))?;
    Font::from_json(&text).with_context(|| format!("failed to parse font {path}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::anyhow;
    use pollster::block_on;

    use super::*;

    struct MemorySource(HashMap<&'static str, &'static str>);

    impl AssetSource for MemorySource {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
            self.0
                .get(path)
                .map(|contents| contents.as_bytes().to_vec())
                .ok_or_else(|| anyhow!("{path} not found"))
        }
    }

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    const FONT: &str = r#"{"glyphs": {"a": {"ha": 10, "o": "m 0 0 l 5 0 l 5 5"}},
        "resolution": 10, "boundingBox": {"yMin": 0, "yMax": 10}}"#;

    #[test]
    fn loads_model_and_font() {
        let source = MemorySource(HashMap::from([
            ("heart.obj", TRIANGLE),
            ("font.typeface.json", FONT),
        ]));
        let assets = block_on(load_assets(&source, &AssetPaths::default()));
        assert_eq!(assets.heart.unwrap().vertex_count(), 3);
        assert_eq!(assets.font.unwrap().glyph_count(), 1);
    }

    #[test]
    fn failures_leave_fields_empty() {
        let source = MemorySource(HashMap::from([("font.typeface.json", "{not json")]));
        let assets = block_on(load_assets(&source, &AssetPaths::default()));
        assert!(assets.heart.is_none());
        assert!(assets.font.is_none());
    }

    #[test]
    fn file_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("heart.obj"), TRIANGLE).unwrap();
        let source = FileSource::new(dir.path());
        let assets = block_on(load_assets(&source, &AssetPaths::default()));
        assert!(assets.heart.is_some());
        assert!(assets.font.is_none());
    }
}
