use crate::assets::{resolve_root, AssetRegistry, Texture};
use crate::config::EditorConfig;
use crate::level::{FoodModel, LevelModel, ObjectModel, ObjectSlot, PlanetModel};
use crate::level_io::format::{RANGE_GRID, RANGE_SCALE_FACTOR, RANGE_TEXTURE};
use crate::level_io::{export_level, import_level};
use crate::viewport::Viewport;
use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Pointer state of whatever widget hosts the level canvas, sampled once per frame.
pub trait InteractionSurface {
    /// Pointer position in screen pixels, if the pointer is known.
    fn pointer_pos(&self) -> Option<Vec2>;
    /// The primary button went down this frame.
    fn primary_pressed(&self) -> bool;
    /// The primary button is currently held.
    fn primary_down(&self) -> bool;
    /// The pointer is over the canvas.
    fn hovered(&self) -> bool;
}

/// Plain snapshot implementation of [`InteractionSurface`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub pos: Option<Vec2>,
    pub pressed: bool,
    pub down: bool,
    pub hovered: bool,
}

impl InteractionSurface for PointerState {
    fn pointer_pos(&self) -> Option<Vec2> {
        self.pos
    }

    fn primary_pressed(&self) -> bool {
        self.pressed
    }

    fn primary_down(&self) -> bool {
        self.down
    }

    fn hovered(&self) -> bool {
        self.hovered
    }
}

pub trait FilePicker {
    /// Asks the user for an existing file. `None` means the user cancelled.
    fn pick_file(&mut self, title: &str, initial_dir: &Path, extensions: &[&str]) -> Option<PathBuf>;

    /// Asks the user where to write a new file. Pickers without a save dialog return `None`.
    fn save_file(&mut self, _title: &str, _initial_dir: &Path, _file_name: &str) -> Option<PathBuf> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum DragState {
    #[default]
    Idle,
    Object {
        slot: ObjectSlot,
        pointer_start: Vec2,
        object_start: Vec2,
    },
    Space {
        pointer_start: Vec2,
        view_start: Vec2,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewObjectKind {
    Planet,
    Food,
    Player,
    Customer,
}

impl NewObjectKind {
    pub fn label(self) -> &'static str {
        match self {
            NewObjectKind::Planet => "planet",
            NewObjectKind::Food => "food",
            NewObjectKind::Player => "player",
            NewObjectKind::Customer => "customer",
        }
    }
}

/// Everything the editor works on: the asset registry, the open level and the view state.
pub struct EditorSession {
    config: EditorConfig,
    registry: AssetRegistry,
    level: Option<LevelModel>,
    level_path: Option<PathBuf>,
    selection: Option<ObjectSlot>,
    viewport: Viewport,
    drag: DragState,
    gravity_range: Option<Arc<Texture>>,
    pub show_gravity_ranges: bool,
}

impl EditorSession {
    pub fn new(config: EditorConfig, mut registry: AssetRegistry) -> Self {
        let range_path = config.assets.gravity_range_texture.clone();
        let gravity_range = match registry.load_asset_path(&range_path, Some(RANGE_TEXTURE)) {
            Ok(texture) => Some(texture),
            Err(err) => {
                log::warn!("[session] gravity ranges will not be drawn: {err:#}");
                None
            }
        };
        let show_gravity_ranges = config.canvas.show_gravity_ranges;
        Self {
            config,
            registry,
            level: None,
            level_path: None,
            selection: None,
            viewport: Viewport::default(),
            drag: DragState::Idle,
            gravity_range,
            show_gravity_ranges,
        }
    }

    /// Resolves the asset root from `config` and decodes images with the `image` crate.
    pub fn from_config(config: EditorConfig) -> Result<Self> {
        let root = resolve_root(&config.assets)?;
        log::info!("[session] asset root {}", root.display());
        Ok(Self::new(config, AssetRegistry::with_image_crate(root)))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AssetRegistry {
        &mut self.registry
    }

    pub fn level(&self) -> Option<&LevelModel> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut LevelModel> {
        self.level.as_mut()
    }

    pub fn level_path(&self) -> Option<&Path> {
        self.level_path.as_deref()
    }

    pub fn selection(&self) -> Option<ObjectSlot> {
        self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn gravity_range_texture(&self) -> Option<&Arc<Texture>> {
        self.gravity_range.as_ref()
    }

    pub fn asset_table_path(&self) -> PathBuf {
        self.config.assets.asset_table_path(self.registry.root())
    }

    pub fn levels_dir(&self) -> PathBuf {
        self.config.assets.levels_path(self.registry.root())
    }

    pub fn textures_dir(&self) -> PathBuf {
        self.config.assets.textures_path(self.registry.root())
    }

    /// Replaces the open level with the one at `path`. On failure the previous
    /// level, selection and view are kept.
    pub fn open_level(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let table_path = self.asset_table_path();
        let level = import_level(path, &table_path, &mut self.registry)?;

        self.selection = None;
        self.drag = DragState::Idle;
        if let Some(start) = level.start_planet() {
            self.viewport.set_world_pos(level.planets[start].object.position);
            self.selection = Some(ObjectSlot::Planet(start));
        }
        self.level = Some(level);
        self.level_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Starts an empty level that will be written to `path` on save.
    pub fn new_level(&mut self, level_number: i32, path: impl Into<PathBuf>) {
        self.level = Some(LevelModel::new(level_number));
        self.level_path = Some(path.into());
        self.selection = None;
        self.drag = DragState::Idle;
        self.viewport.set_world_pos(Vec2::ZERO);
    }

    pub fn save_level(&self) -> Result<()> {
        let path = self.level_path.as_ref().ok_or_else(|| anyhow!("No level file is open"))?;
        self.save_level_as(path)
    }

    pub fn save_level_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let level = self.level.as_ref().ok_or_else(|| anyhow!("No level is loaded"))?;
        export_level(level, &self.registry, path, self.asset_table_path())
    }

    /// Creates a default object textured with `texture_path` at the view centre and selects it.
    /// A new player or customer replaces the existing one.
    pub fn add_object(&mut self, kind: NewObjectKind, texture_path: impl AsRef<Path>) -> Result<ObjectSlot> {
        if self.level.is_none() {
            bail!("Open a level before adding a {}", kind.label());
        }
        let texture_path = texture_path.as_ref();
        let texture = self
            .registry
            .load(texture_path, None)
            .with_context(|| format!("Failed to add {} from {}", kind.label(), texture_path.display()))?;

        let defaults = &self.config.defaults;
        let object = ObjectModel::new(texture)
            .with_position(self.viewport.world_pos())
            .with_anchor(Vec2::from(defaults.anchor))
            .with_scale(defaults.scale);
        let planet_grid = (defaults.planet_cols, defaults.planet_span);

        let Some(level) = self.level.as_mut() else {
            bail!("Open a level before adding a {}", kind.label());
        };
        let slot = match kind {
            NewObjectKind::Planet => {
                level.add_planet(PlanetModel::new(object.with_grid(planet_grid.0, planet_grid.1)))
            }
            NewObjectKind::Food => level.add_food(FoodModel::new(object)),
            NewObjectKind::Player => level.set_player(object),
            NewObjectKind::Customer => level.set_customer(object),
        };
        log::debug!("[session] added {} as {}", kind.label(), slot.label());
        self.selection = Some(slot);
        Ok(slot)
    }

    pub fn add_planet(&mut self, texture_path: impl AsRef<Path>) -> Result<ObjectSlot> {
        self.add_object(NewObjectKind::Planet, texture_path)
    }

    pub fn add_food(&mut self, texture_path: impl AsRef<Path>) -> Result<ObjectSlot> {
        self.add_object(NewObjectKind::Food, texture_path)
    }

    pub fn set_player(&mut self, texture_path: impl AsRef<Path>) -> Result<ObjectSlot> {
        self.add_object(NewObjectKind::Player, texture_path)
    }

    pub fn set_customer(&mut self, texture_path: impl AsRef<Path>) -> Result<ObjectSlot> {
        self.add_object(NewObjectKind::Customer, texture_path)
    }

    /// Like [`Self::add_object`], asking `picker` for the texture first. `Ok(None)` if cancelled.
    pub fn add_object_from_picker(
        &mut self,
        kind: NewObjectKind,
        picker: &mut dyn FilePicker,
    ) -> Result<Option<ObjectSlot>> {
        let title = format!("Select {} texture", kind.label());
        let Some(path) = picker.pick_file(&title, &self.textures_dir(), &["png"]) else {
            return Ok(None);
        };
        self.add_object(kind, path).map(Some)
    }

    pub fn add_planet_from_picker(&mut self, picker: &mut dyn FilePicker) -> Result<Option<ObjectSlot>> {
        self.add_object_from_picker(NewObjectKind::Planet, picker)
    }

    pub fn add_food_from_picker(&mut self, picker: &mut dyn FilePicker) -> Result<Option<ObjectSlot>> {
        self.add_object_from_picker(NewObjectKind::Food, picker)
    }

    pub fn set_player_from_picker(&mut self, picker: &mut dyn FilePicker) -> Result<Option<ObjectSlot>> {
        self.add_object_from_picker(NewObjectKind::Player, picker)
    }

    pub fn set_customer_from_picker(&mut self, picker: &mut dyn FilePicker) -> Result<Option<ObjectSlot>> {
        self.add_object_from_picker(NewObjectKind::Customer, picker)
    }

    /// Asks `picker` for a level file and opens it. `Ok(false)` if cancelled.
    pub fn open_level_from_picker(&mut self, picker: &mut dyn FilePicker) -> Result<bool> {
        let Some(path) = picker.pick_file("Open JSON Level", &self.levels_dir(), &["json"]) else {
            return Ok(false);
        };
        self.open_level(path)?;
        Ok(true)
    }

    pub fn select(&mut self, slot: Option<ObjectSlot>) {
        self.selection = slot.filter(|slot| self.level.as_ref().and_then(|level| level.object(*slot)).is_some());
    }

    /// Selects the food at `index` in the recipe and centres the view on it.
    pub fn select_food(&mut self, index: usize) {
        let Some(position) = self.level.as_ref().and_then(|level| level.foods.get(index)).map(|f| f.object.position)
        else {
            return;
        };
        self.selection = Some(ObjectSlot::Food(index));
        self.viewport.set_world_pos(position);
    }

    /// Moves the selected food within the recipe, keeping it selected.
    pub fn move_selected_food(&mut self, offset: isize) -> Option<usize> {
        let Some(ObjectSlot::Food(index)) = self.selection else {
            return None;
        };
        let moved = self.level.as_mut()?.move_food(index, offset)?;
        self.selection = Some(ObjectSlot::Food(moved));
        Some(moved)
    }

    /// Removes the selected object from the level and clears the selection.
    pub fn delete_selected(&mut self) -> bool {
        let (Some(slot), Some(level)) = (self.selection.take(), self.level.as_mut()) else {
            return false;
        };
        self.drag = DragState::Idle;
        level.remove(slot).is_some()
    }

    /// Topmost object under the screen position `screen`.
    pub fn object_at_screen(&self, screen: Vec2) -> Option<ObjectSlot> {
        let level = self.level.as_ref()?;
        let world = self.viewport.screen_to_world(screen);
        level
            .slots()
            .into_iter()
            .rev()
            .find(|slot| level.base(*slot).is_some_and(|object| object.contains(world)))
    }

    /// World rectangle of a planet's gravity range: the second frame of the range strip,
    /// scaled with the planet.
    pub fn gravity_range_bounds(&self, planet: &PlanetModel) -> Option<(Vec2, Vec2)> {
        let texture = self.gravity_range.as_ref()?;
        let frame = Vec2::new(texture.size().x / RANGE_GRID as f32, texture.size().y);
        let half = frame * planet.object.scale * RANGE_SCALE_FACTOR * 0.5;
        Some((planet.object.position - half, planet.object.position + half))
    }

    /// Asks `picker` for a destination and saves there; the level then belongs to that path.
    pub fn save_level_from_picker(&mut self, picker: &mut dyn FilePicker) -> Result<bool> {
        let Some(level) = self.level.as_ref() else {
            bail!("No level is loaded");
        };
        let file_name = format!("level{}.json", level.level_number);
        let Some(path) = picker.save_file("Save JSON Level", &self.levels_dir(), &file_name) else {
            return Ok(false);
        };
        self.save_level_as(&path)?;
        self.level_path = Some(path);
        Ok(true)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::Idle
    }

    /// Click-and-drag on an object moves it; on empty canvas it pans the view.
    pub fn handle_canvas_input(&mut self, input: &dyn InteractionSurface) {
        if self.level.is_none() {
            self.drag = DragState::Idle;
            return;
        }
        let Some(pointer) = input.pointer_pos() else {
            if !input.primary_down() {
                self.drag = DragState::Idle;
            }
            return;
        };

        if self.drag == DragState::Idle && input.hovered() && input.primary_pressed() {
            self.drag = match self.object_at_screen(pointer) {
                Some(slot) => {
                    self.selection = Some(slot);
                    let object_start = self.level.as_ref().and_then(|level| level.base(slot)).map(|o| o.position);
                    match object_start {
                        Some(object_start) => DragState::Object { slot, pointer_start: pointer, object_start },
                        None => DragState::Idle,
                    }
                }
                None => DragState::Space { pointer_start: pointer, view_start: self.viewport.world_pos() },
            };
        }

        match self.drag {
            DragState::Idle => {}
            DragState::Object { slot, pointer_start, object_start } => {
                if let Some(object) = self.level.as_mut().and_then(|level| level.base_mut(slot)) {
                    object.position = object_start + (pointer - pointer_start);
                }
            }
            DragState::Space { pointer_start, view_start } => {
                self.viewport.set_world_pos(view_start + (pointer_start - pointer));
            }
        }
        if !input.primary_down() {
            self.drag = DragState::Idle;
        }
    }
}
