use crate::assets::Texture;
use glam::Vec2;
use std::sync::Arc;

/// A placeable sprite: everything planets, foods, the player and the customer share.
#[derive(Debug, Clone)]
pub struct ObjectModel {
    pub texture: Arc<Texture>,
    /// World position; +Y points down the canvas.
    pub position: Vec2,
    pub anchor: Vec2,
    pub scale: f32,
    /// Animation frames per sprite-sheet row. Always at least one.
    pub cols: u32,
    /// Total animation frames.
    pub span: u32,
}

impl ObjectModel {
    pub fn new(texture: Arc<Texture>) -> Self {
        Self { texture, position: Vec2::ZERO, anchor: Vec2::splat(0.5), scale: 1.0, cols: 1, span: 1 }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_grid(mut self, cols: u32, span: u32) -> Self {
        self.cols = cols.max(1);
        self.span = span;
        self
    }

    pub fn rows(&self) -> u32 {
        self.span.max(1).div_ceil(self.cols.max(1))
    }

    /// Pixel size of one animation frame.
    pub fn frame_size(&self) -> Vec2 {
        let grid = Vec2::new(self.cols.max(1) as f32, self.rows() as f32);
        self.texture.size() / grid
    }

    /// Bottom-right UV of the first frame; the top-left is always (0, 0).
    pub fn uv_end(&self) -> Vec2 {
        Vec2::new(1.0 / self.cols.max(1) as f32, 1.0 / self.rows() as f32)
    }

    pub fn scaled_size(&self) -> Vec2 {
        self.frame_size() * self.scale
    }

    /// World-space rectangle covered by the first frame, centred on the position.
    pub fn world_bounds(&self) -> (Vec2, Vec2) {
        let half = self.scaled_size() * 0.5;
        (self.position - half, self.position + half)
    }

    pub fn contains(&self, world: Vec2) -> bool {
        let (min, max) = self.world_bounds();
        world.x >= min.x && world.y >= min.y && world.x <= max.x && world.y <= max.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanetType {
    #[default]
    Normal,
    Sun,
    BlackHole,
    Storage,
    Season,
}

impl PlanetType {
    pub const ALL: [PlanetType; 5] =
        [PlanetType::Normal, PlanetType::Sun, PlanetType::BlackHole, PlanetType::Storage, PlanetType::Season];

    /// Collapses the per-type JSON flags. When several are set the first of
    /// Sun, BlackHole, Storage, Season wins.
    pub fn from_flags(flags: PlanetFlags) -> Self {
        if flags.is_sun {
            PlanetType::Sun
        } else if flags.is_black_hole {
            PlanetType::BlackHole
        } else if flags.is_storage {
            PlanetType::Storage
        } else if flags.is_season {
            PlanetType::Season
        } else {
            PlanetType::Normal
        }
    }

    pub fn flags(self) -> PlanetFlags {
        PlanetFlags {
            is_sun: self == PlanetType::Sun,
            is_black_hole: self == PlanetType::BlackHole,
            is_storage: self == PlanetType::Storage,
            is_season: self == PlanetType::Season,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlanetType::Normal => "Normal",
            PlanetType::Sun => "Sun",
            PlanetType::BlackHole => "Black hole",
            PlanetType::Storage => "Storage",
            PlanetType::Season => "Season",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanetFlags {
    pub is_sun: bool,
    pub is_black_hole: bool,
    pub is_storage: bool,
    pub is_season: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanetOrder {
    Start,
    #[default]
    Middle,
    End,
}

impl PlanetOrder {
    pub fn label(self) -> &'static str {
        match self {
            PlanetOrder::Start => "Start planet",
            PlanetOrder::Middle => "Middle planet",
            PlanetOrder::End => "End planet",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanetModel {
    pub object: ObjectModel,
    pub has_food: bool,
    pub kind: PlanetType,
    pub order: PlanetOrder,
}

impl PlanetModel {
    pub fn new(object: ObjectModel) -> Self {
        Self { object, has_food: false, kind: PlanetType::Normal, order: PlanetOrder::Middle }
    }

    pub fn with_order(mut self, order: PlanetOrder) -> Self {
        self.order = order;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FoodModel {
    pub object: ObjectModel,
    pub cookable: bool,
    pub seasonable: bool,
}

impl FoodModel {
    pub fn new(object: ObjectModel) -> Self {
        Self { object, cookable: false, seasonable: false }
    }
}

/// Owned level entity, tagged by what it is.
#[derive(Debug, Clone)]
pub enum LevelObject {
    Generic(ObjectModel),
    Planet(PlanetModel),
    Food(FoodModel),
}

impl LevelObject {
    pub fn base(&self) -> &ObjectModel {
        match self {
            LevelObject::Generic(object) => object,
            LevelObject::Planet(planet) => &planet.object,
            LevelObject::Food(food) => &food.object,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LevelObjectRef<'a> {
    Generic(&'a ObjectModel),
    Planet(&'a PlanetModel),
    Food(&'a FoodModel),
}

impl<'a> LevelObjectRef<'a> {
    pub fn base(self) -> &'a ObjectModel {
        match self {
            LevelObjectRef::Generic(object) => object,
            LevelObjectRef::Planet(planet) => &planet.object,
            LevelObjectRef::Food(food) => &food.object,
        }
    }
}

#[derive(Debug)]
pub enum LevelObjectMut<'a> {
    Generic(&'a mut ObjectModel),
    Planet(&'a mut PlanetModel),
    Food(&'a mut FoodModel),
}

impl<'a> LevelObjectMut<'a> {
    pub fn base_mut(self) -> &'a mut ObjectModel {
        match self {
            LevelObjectMut::Generic(object) => object,
            LevelObjectMut::Planet(planet) => &mut planet.object,
            LevelObjectMut::Food(food) => &mut food.object,
        }
    }
}

/// Where an object lives inside a [`LevelModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectSlot {
    Planet(usize),
    Food(usize),
    Player,
    Customer,
}

impl ObjectSlot {
    pub fn label(self) -> String {
        match self {
            ObjectSlot::Planet(index) => format!("planet #{index}"),
            ObjectSlot::Food(index) => format!("food #{index}"),
            ObjectSlot::Player => "player".to_string(),
            ObjectSlot::Customer => "customer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LevelModel {
    pub level_number: i32,
    pub level_timer: f32,
    /// Insertion order; gameplay order comes from each planet's `order`.
    pub planets: Vec<PlanetModel>,
    /// Recipe order.
    pub foods: Vec<FoodModel>,
    pub player: Option<ObjectModel>,
    pub customer: Option<ObjectModel>,
}

impl LevelModel {
    pub fn new(level_number: i32) -> Self {
        Self { level_number, ..Self::default() }
    }

    /// Scene key used by the game, `lv<N>`.
    pub fn scene_key(&self) -> String {
        format!("lv{}", self.level_number)
    }

    pub fn add_planet(&mut self, planet: PlanetModel) -> ObjectSlot {
        self.planets.push(planet);
        ObjectSlot::Planet(self.planets.len() - 1)
    }

    pub fn add_food(&mut self, food: FoodModel) -> ObjectSlot {
        self.foods.push(food);
        ObjectSlot::Food(self.foods.len() - 1)
    }

    pub fn set_player(&mut self, player: ObjectModel) -> ObjectSlot {
        self.player = Some(player);
        ObjectSlot::Player
    }

    pub fn set_customer(&mut self, customer: ObjectModel) -> ObjectSlot {
        self.customer = Some(customer);
        ObjectSlot::Customer
    }

    /// Removes the object in `slot`. Later planet/food slots shift down by one.
    pub fn remove(&mut self, slot: ObjectSlot) -> Option<LevelObject> {
        match slot {
            ObjectSlot::Planet(index) if index < self.planets.len() => {
                Some(LevelObject::Planet(self.planets.remove(index)))
            }
            ObjectSlot::Food(index) if index < self.foods.len() => {
                Some(LevelObject::Food(self.foods.remove(index)))
            }
            ObjectSlot::Player => self.player.take().map(LevelObject::Generic),
            ObjectSlot::Customer => self.customer.take().map(LevelObject::Generic),
            _ => None,
        }
    }

    pub fn object(&self, slot: ObjectSlot) -> Option<LevelObjectRef<'_>> {
        match slot {
            ObjectSlot::Planet(index) => self.planets.get(index).map(LevelObjectRef::Planet),
            ObjectSlot::Food(index) => self.foods.get(index).map(LevelObjectRef::Food),
            ObjectSlot::Player => self.player.as_ref().map(LevelObjectRef::Generic),
            ObjectSlot::Customer => self.customer.as_ref().map(LevelObjectRef::Generic),
        }
    }

    pub fn object_mut(&mut self, slot: ObjectSlot) -> Option<LevelObjectMut<'_>> {
        match slot {
            ObjectSlot::Planet(index) => self.planets.get_mut(index).map(LevelObjectMut::Planet),
            ObjectSlot::Food(index) => self.foods.get_mut(index).map(LevelObjectMut::Food),
            ObjectSlot::Player => self.player.as_mut().map(LevelObjectMut::Generic),
            ObjectSlot::Customer => self.customer.as_mut().map(LevelObjectMut::Generic),
        }
    }

    pub fn base(&self, slot: ObjectSlot) -> Option<&ObjectModel> {
        self.object(slot).map(LevelObjectRef::base)
    }

    pub fn base_mut(&mut self, slot: ObjectSlot) -> Option<&mut ObjectModel> {
        self.object_mut(slot).map(LevelObjectMut::base_mut)
    }

    /// Every present object in draw order: planets, foods, player, customer.
    pub fn slots(&self) -> Vec<ObjectSlot> {
        let mut slots = Vec::with_capacity(self.planets.len() + self.foods.len() + 2);
        slots.extend((0..self.planets.len()).map(ObjectSlot::Planet));
        slots.extend((0..self.foods.len()).map(ObjectSlot::Food));
        if self.player.is_some() {
            slots.push(ObjectSlot::Player);
        }
        if self.customer.is_some() {
            slots.push(ObjectSlot::Customer);
        }
        slots
    }

    pub fn start_planet(&self) -> Option<usize> {
        self.planets.iter().position(|planet| planet.order == PlanetOrder::Start)
    }

    pub fn count_order(&self, order: PlanetOrder) -> usize {
        self.planets.iter().filter(|planet| planet.order == order).count()
    }

    /// Moves the food at `index` by `offset` places in the recipe, clamped to the list.
    /// Returns its new index.
    pub fn move_food(&mut self, index: usize, offset: isize) -> Option<usize> {
        if index >= self.foods.len() {
            return None;
        }
        let last = self.foods.len() as isize - 1;
        let target = (index as isize).saturating_add(offset).clamp(0, last) as usize;
        let food = self.foods.remove(index);
        self.foods.insert(target, food);
        Some(target)
    }
}
