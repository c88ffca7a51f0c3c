use crate::config::AssetConfig;
use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Opaque identifier handed to whatever uploads the pixels to the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

#[derive(Debug)]
pub struct Texture {
    handle: TextureHandle,
    width: u32,
    height: u32,
    path: PathBuf,
    short_name: String,
}

impl Texture {
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Absolute, lexically normalized source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn file_name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub rgba: Vec<u8>,
}

pub trait ImageLoader {
    fn decode(&mut self, path: &Path) -> Result<DecodedImage>;
}

/// Decodes images from disk with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateLoader;

impl ImageLoader for ImageCrateLoader {
    fn decode(&mut self, path: &Path) -> Result<DecodedImage> {
        let decoded = image::open(path)
            .with_context(|| format!("Could not load texture file: {}", path.display()))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(DecodedImage { width, height, rgba: decoded.into_raw() })
    }
}

/// Pixels of a freshly registered texture waiting for the host to upload them.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub handle: TextureHandle,
    pub short_name: String,
    pub image: DecodedImage,
}

pub struct AssetRegistry {
    root: PathBuf,
    textures: Vec<Arc<Texture>>,
    by_path: HashMap<PathBuf, usize>,
    loader: Box<dyn ImageLoader>,
    queue_uploads: bool,
    pending_uploads: Vec<PendingUpload>,
    next_handle: u64,
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("root", &self.root)
            .field("textures", &self.textures.len())
            .field("pending_uploads", &self.pending_uploads.len())
            .finish()
    }
}

impl AssetRegistry {
    pub fn new(root: impl Into<PathBuf>, loader: Box<dyn ImageLoader>) -> Self {
        Self {
            root: normalize_path(&root.into()),
            textures: Vec::new(),
            by_path: HashMap::new(),
            loader,
            queue_uploads: true,
            pending_uploads: Vec::new(),
            next_handle: 1,
        }
    }

    pub fn with_image_crate(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Box::new(ImageCrateLoader))
    }

    /// Headless tools have nobody to upload to; keeping the pixels around would only cost memory.
    pub fn with_upload_queue(mut self, enabled: bool) -> Self {
        self.queue_uploads = enabled;
        if !enabled {
            self.pending_uploads.clear();
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Loads `path` unless a texture with the same absolute path is already registered,
    /// in which case that texture is returned untouched (including its short name).
    pub fn load(&mut self, path: impl AsRef<Path>, short_name: Option<&str>) -> Result<Arc<Texture>> {
        let absolute = absolute_path(path.as_ref())?;
        if let Some(&index) = self.by_path.get(&absolute) {
            return Ok(Arc::clone(&self.textures[index]));
        }

        let image = self.loader.decode(&absolute)?;
        let short_name = match short_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => absolute
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("Texture path '{}' has no file name", absolute.display()))?,
        };
        if let Some(existing) = self.find_by_short_name(&short_name) {
            log::warn!(
                "[assets] short name '{short_name}' already names '{}'; '{}' will be shadowed on lookup",
                existing.path().display(),
                absolute.display()
            );
        }

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        let texture = Arc::new(Texture {
            handle,
            width: image.width,
            height: image.height,
            path: absolute.clone(),
            short_name: short_name.clone(),
        });
        log::debug!(
            "[assets] loaded '{short_name}' ({}x{}) from {}",
            image.width,
            image.height,
            absolute.display()
        );
        if self.queue_uploads {
            self.pending_uploads.push(PendingUpload { handle, short_name, image });
        }
        self.by_path.insert(absolute, self.textures.len());
        self.textures.push(Arc::clone(&texture));
        Ok(texture)
    }

    /// Loads a texture addressed relative to the asset root.
    pub fn load_asset_path(&mut self, relative: &str, short_name: Option<&str>) -> Result<Arc<Texture>> {
        let path = self.root.join(relative);
        self.load(path, short_name)
    }

    pub fn find_by_short_name(&self, name: &str) -> Option<Arc<Texture>> {
        self.textures.iter().find(|texture| texture.short_name == name).cloned()
    }

    pub fn find_by_path(&self, path: &Path) -> Option<Arc<Texture>> {
        let absolute = absolute_path(path).ok()?;
        self.by_path.get(&absolute).map(|&index| Arc::clone(&self.textures[index]))
    }

    /// Every registered texture in load order.
    pub fn all_loaded(&self) -> &[Arc<Texture>] {
        &self.textures
    }

    pub fn take_pending_uploads(&mut self) -> Vec<PendingUpload> {
        std::mem::take(&mut self.pending_uploads)
    }

    pub fn has_pending_uploads(&self) -> bool {
        !self.pending_uploads.is_empty()
    }

    /// `/`-separated path of `texture` relative to the asset root, as written into JSON.
    pub fn asset_relative_path(&self, texture: &Texture) -> Result<String> {
        let relative = texture.path.strip_prefix(&self.root).map_err(|_| {
            anyhow!(
                "Texture '{}' ({}) lies outside the asset root {}",
                texture.short_name,
                texture.path.display(),
                self.root.display()
            )
        })?;
        let parts: Vec<String> =
            relative.components().map(|part| part.as_os_str().to_string_lossy().into_owned()).collect();
        Ok(parts.join("/"))
    }

    /// Registers every table entry whose short name is not known yet. Returns how many were loaded.
    pub fn load_table(&mut self, table: &AssetTable) -> Result<usize> {
        let mut loaded = 0;
        for (name, entry) in &table.textures {
            if self.find_by_short_name(name).is_some() {
                continue;
            }
            self.load_asset_path(&entry.file, Some(name))
                .with_context(|| format!("Failed to load texture '{name}' from asset table"))?;
            loaded += 1;
        }
        if loaded > 0 {
            log::info!("[assets] registered {loaded} texture(s) from asset table");
        }
        Ok(loaded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTableEntry {
    pub file: String,
}

/// The shared `{"textures": {name: {"file": path}}}` document. Keys other than
/// `textures` are carried through untouched so a rewrite never drops them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetTable {
    #[serde(default)]
    pub textures: BTreeMap<String, AssetTableEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AssetTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read asset table {}", path.display()))?;
        let table = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse asset table {}", path.display()))?;
        Ok(table)
    }

    pub fn from_registry(registry: &AssetRegistry) -> Result<Self> {
        let mut table = Self::default();
        table.merge_registry(registry)?;
        Ok(table)
    }

    /// Overwrites entries for every loaded texture, keeping unrelated ones.
    pub fn merge_registry(&mut self, registry: &AssetRegistry) -> Result<()> {
        for texture in registry.all_loaded() {
            let file = registry.asset_relative_path(texture)?;
            self.textures.insert(texture.short_name().to_string(), AssetTableEntry { file });
        }
        Ok(())
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        crate::to_pretty_json(self)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_json_bytes()?;
        fs::write(path, bytes).with_context(|| format!("Failed to write asset table {}", path.display()))
    }
}

/// Walks from `start` towards the filesystem root until a directory containing `marker`
/// is found, then returns `<that dir>/<asset_dir>`.
pub fn discover_asset_root(start: &Path, marker: &str, asset_dir: &str) -> Result<PathBuf> {
    let start = absolute_path(start)?;
    let mut current: &Path = &start;
    loop {
        if current.join(marker).exists() {
            return Ok(current.join(asset_dir));
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => bail!(
                "Could not locate repository root: no '{marker}' found above {}",
                start.display()
            ),
        }
    }
}

/// Resolves the asset root for `config`: an explicit root wins, otherwise the
/// repository marker is searched upward from the working directory.
pub fn resolve_root(config: &AssetConfig) -> Result<PathBuf> {
    if let Some(root) = config.root.as_ref() {
        return absolute_path(root);
    }
    let cwd = env::current_dir().context("Failed to read the current working directory")?;
    discover_asset_root(&cwd, &config.repo_marker, &config.asset_dir)
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = env::current_dir().context("Failed to read the current working directory")?;
    Ok(normalize_path(&cwd.join(path)))
}

/// Lexical normalization: drops `.` and folds `..` without touching the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::tempdir;

    struct CountingLoader {
        calls: Rc<Cell<usize>>,
    }

    impl ImageLoader for CountingLoader {
        fn decode(&mut self, path: &Path) -> Result<DecodedImage> {
            self.calls.set(self.calls.get() + 1);
            if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
                bail!("unsupported format: {}", path.display());
            }
            Ok(DecodedImage { width: 64, height: 32, rgba: vec![0; 64 * 32 * 4] })
        }
    }

    fn counting_registry(root: &Path) -> (AssetRegistry, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let registry = AssetRegistry::new(root, Box::new(CountingLoader { calls: Rc::clone(&calls) }));
        (registry, calls)
    }

    #[test]
    fn repeated_loads_return_the_same_texture() {
        let (mut registry, calls) = counting_registry(Path::new("/game/assets"));
        let first = registry.load("/game/assets/textures/sun.png", Some("sun")).expect("first load");
        let second = registry.load("/game/assets/textures/./sun.png", Some("other")).expect("second load");
        let third = registry.load("/game/assets/json/../textures/sun.png", None).expect("third load");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(registry.len(), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(second.short_name(), "sun");
    }

    #[test]
    fn short_name_defaults_to_file_name() {
        let (mut registry, _) = counting_registry(Path::new("/game/assets"));
        let texture = registry.load("/game/assets/textures/earth.png", None).expect("load");
        assert_eq!(texture.short_name(), "earth.png");
        assert!(registry.find_by_short_name("earth.png").is_some());
        assert!(registry.find_by_short_name("earth").is_none());
    }

    #[test]
    fn decode_failure_is_reported_and_nothing_is_registered() {
        let (mut registry, _) = counting_registry(Path::new("/game/assets"));
        let err = registry.load("/game/assets/textures/notes.txt", None).unwrap_err();
        assert!(err.to_string().contains("unsupported format"));
        assert!(registry.is_empty());
        assert!(!registry.has_pending_uploads());
    }

    #[test]
    fn pending_uploads_are_drained_once() {
        let (mut registry, _) = counting_registry(Path::new("/game/assets"));
        registry.load("/game/assets/a.png", None).expect("a");
        registry.load("/game/assets/b.png", None).expect("b");
        let uploads = registry.take_pending_uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].short_name, "a.png");
        assert!(registry.take_pending_uploads().is_empty());
    }

    #[test]
    fn headless_registry_keeps_no_pixels() {
        let (registry, _) = counting_registry(Path::new("/game/assets"));
        let mut registry = registry.with_upload_queue(false);
        registry.load("/game/assets/a.png", None).expect("a");
        assert!(!registry.has_pending_uploads());
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let (mut registry, _) = counting_registry(Path::new("/game/assets"));
        let texture = registry.load_asset_path("textures/planets/ice.png", Some("ice")).expect("load");
        assert_eq!(registry.asset_relative_path(&texture).expect("relative"), "textures/planets/ice.png");

        let outside = registry.load("/elsewhere/rock.png", None).expect("outside");
        let err = registry.asset_relative_path(&outside).unwrap_err();
        assert!(err.to_string().contains("outside the asset root"));
    }

    #[test]
    fn table_loading_skips_known_short_names() {
        let (mut registry, calls) = counting_registry(Path::new("/game/assets"));
        registry.load_asset_path("textures/sun.png", Some("sun")).expect("preload");
        let mut table = AssetTable::default();
        table.textures.insert("sun".into(), AssetTableEntry { file: "textures/other_sun.png".into() });
        table.textures.insert("moon".into(), AssetTableEntry { file: "textures/moon.png".into() });
        let loaded = registry.load_table(&table).expect("load table");
        assert_eq!(loaded, 1);
        assert_eq!(calls.get(), 2);
        let sun = registry.find_by_short_name("sun").expect("sun");
        assert!(sun.path().ends_with("textures/sun.png"));
    }

    #[test]
    fn discovers_root_from_nested_directory() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join(".git")).expect("marker");
        let nested = dir.path().join("editor/build/debug");
        fs::create_dir_all(&nested).expect("nested");
        let root = discover_asset_root(&nested, ".git", "assets").expect("discover");
        assert_eq!(root, normalize_path(&dir.path().join("assets")));
    }

    #[test]
    fn discovery_fails_without_marker() {
        let dir = tempdir().expect("tempdir");
        let err = discover_asset_root(dir.path(), "definitely-not-a-marker-7f3a", "assets").unwrap_err();
        assert!(err.to_string().contains("Could not locate repository root"));
    }

    #[test]
    fn table_keeps_unrelated_top_level_keys() {
        let raw = r#"{"textures": {"sun": {"file": "textures/sun.png"}}, "sounds": {"boom": {"file": "a.ogg"}}}"#;
        let table: AssetTable = serde_json::from_str(raw).expect("parse");
        assert!(table.extra.contains_key("sounds"));
        let rendered: serde_json::Value =
            serde_json::from_slice(&table.to_json_bytes().expect("render")).expect("reparse");
        assert_eq!(rendered["sounds"]["boom"]["file"], "a.ogg");
        assert_eq!(rendered["textures"]["sun"]["file"], "textures/sun.png");
    }
}
