use super::format::{
    key_index, ObjectNode, ObjectNodeData, END_PLANET_KEY, SCENE_KEY_PREFIX, START_PLANET_KEY,
};
use crate::assets::{AssetRegistry, AssetTable};
use crate::level::{FoodModel, LevelModel, ObjectModel, PlanetFlags, PlanetModel, PlanetOrder, PlanetType};
use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Reads the shared asset table and then the level at `level_path`.
///
/// Textures listed in the asset table are registered first because objects only
/// reference them by short name. Nothing in `registry` is rolled back on failure,
/// but no level is produced either.
pub fn import_level(
    level_path: impl AsRef<Path>,
    asset_table_path: impl AsRef<Path>,
    registry: &mut AssetRegistry,
) -> Result<LevelModel> {
    let level_path = level_path.as_ref();
    let asset_table_path = asset_table_path.as_ref();
    let table = AssetTable::load(asset_table_path)?;
    registry.load_table(&table)?;

    let bytes =
        fs::read(level_path).with_context(|| format!("Failed to read level file {}", level_path.display()))?;
    let document: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse level file {}", level_path.display()))?;
    let level = parse_level(&document, registry)
        .with_context(|| format!("Level file {} is malformed", level_path.display()))?;
    log::info!(
        "[import] {}: level {} with {} planet(s), {} food(s)",
        level_path.display(),
        level.level_number,
        level.planets.len(),
        level.foods.len()
    );
    Ok(level)
}

/// Builds a level from an already parsed document. Every texture it references
/// must already be registered.
pub fn parse_level(document: &Value, registry: &AssetRegistry) -> Result<LevelModel> {
    let root = Node::root(document);
    let scenes = root.child("scenes")?;
    let (scene_key, _) = scenes
        .as_object()?
        .iter()
        .next()
        .ok_or_else(|| anyhow!("'scenes' does not contain a level scene"))?;
    if scenes.as_object()?.len() > 1 {
        log::warn!("[import] 'scenes' has more than one entry; using '{scene_key}'");
    }
    let level_number = parse_scene_key(scene_key)?;

    let game = scenes.child(scene_key)?.child("children")?.child("game")?.child("children")?;
    let mut level = LevelModel::new(level_number);

    let planets = game.child("planets")?.child("children")?;
    for (key, node) in ordered_children(planets.as_object()?) {
        let planet = planets.at(key, node);
        level.planets.push(read_planet(&planet, key, registry)?);
    }

    let foods = game.child("food")?.child("children")?;
    for (key, node) in ordered_children(foods.as_object()?) {
        let food = foods.at(key, node);
        level.foods.push(read_food(&food, registry)?);
    }

    let (player, _) = read_object(&game.child("player")?, registry)?;
    level.player = Some(player);
    let (customer, _) = read_object(&game.child("customer")?, registry)?;
    level.customer = Some(customer);

    let timer = game.child("timer")?.child("data")?.child("timer")?;
    level.level_timer =
        timer.value.as_f64().ok_or_else(|| anyhow!("'{}' must be a number", timer.path))? as f32;

    Ok(level)
}

/// `lv<N>` -> `N`.
pub fn parse_scene_key(key: &str) -> Result<i32> {
    let digits = key
        .strip_prefix(SCENE_KEY_PREFIX)
        .ok_or_else(|| anyhow!("Scene key '{key}' does not start with '{SCENE_KEY_PREFIX}'"))?;
    digits.parse::<i32>().with_context(|| format!("Scene key '{key}' does not end in a level number"))
}

/// Numbered children (`food2` before `food10`) come first, the rest keep document order.
fn ordered_children(map: &Map<String, Value>) -> Vec<(&str, &Value)> {
    let mut children: Vec<(&str, &Value)> = map.iter().map(|(key, value)| (key.as_str(), value)).collect();
    children.sort_by_key(|(key, _)| key_index(key).unwrap_or(u64::MAX));
    children
}

fn read_planet(node: &Node<'_>, key: &str, registry: &AssetRegistry) -> Result<PlanetModel> {
    let (object, data) = read_object(node, registry)?;
    let flags = PlanetFlags {
        is_sun: data.is_sun.unwrap_or(false),
        is_black_hole: data.is_black_hole.unwrap_or(false),
        is_storage: data.is_storage.unwrap_or(false),
        is_season: data.is_season_planet.unwrap_or(false),
    };
    let order = match key {
        START_PLANET_KEY => PlanetOrder::Start,
        END_PLANET_KEY => PlanetOrder::End,
        _ => PlanetOrder::Middle,
    };
    Ok(PlanetModel {
        object,
        has_food: data.has_food.unwrap_or(false),
        kind: PlanetType::from_flags(flags),
        order,
    })
}

fn read_food(node: &Node<'_>, registry: &AssetRegistry) -> Result<FoodModel> {
    let (object, data) = read_object(node, registry)?;
    Ok(FoodModel {
        object,
        cookable: data.cookable.unwrap_or(false),
        seasonable: data.seasonable.unwrap_or(false),
    })
}

fn read_object(node: &Node<'_>, registry: &AssetRegistry) -> Result<(ObjectModel, ObjectNodeData)> {
    let parsed = ObjectNode::deserialize(node.value)
        .with_context(|| format!("'{}' is not a valid object node", node.path))?;
    let data = parsed.data;
    let texture = registry.find_by_short_name(&data.texture).ok_or_else(|| {
        anyhow!("'{}' references texture '{}' which is not in the asset table", node.path, data.texture)
    })?;

    let cols = match data.cols {
        Some(cols) if cols < 1 => bail!("'{}' has cols = {cols}; at least 1 is required", node.path),
        Some(cols) => to_u32(cols, &node.path, "cols")?,
        None => 1,
    };
    let span = match data.span {
        Some(span) if span < 0 => bail!("'{}' has a negative span", node.path),
        Some(span) => to_u32(span, &node.path, "span")?,
        None => cols,
    };

    let position = data.position.to_vec2();
    let object = ObjectModel {
        texture,
        // The game's Y axis points up, the canvas' points down.
        position: Vec2::new(position.x, -position.y),
        anchor: data.anchor.to_vec2(),
        scale: data.scale.to_vec2().x,
        cols,
        span,
    };
    Ok((object, data))
}

fn to_u32(value: i64, path: &str, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("'{path}' has an out of range {field} ({value})"))
}

/// A JSON value paired with its dotted path, for error messages.
struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Self {
        Self { value, path: String::new() }
    }

    fn at(&self, key: &str, value: &'a Value) -> Node<'a> {
        let path = if self.path.is_empty() { key.to_string() } else { format!("{}.{key}", self.path) };
        Node { value, path }
    }

    fn child(&self, key: &str) -> Result<Node<'a>> {
        let object = self.as_object()?;
        let value = object.get(key).ok_or_else(|| {
            let location = if self.path.is_empty() { "the document root" } else { self.path.as_str() };
            anyhow!("Missing required node '{key}' under {location}")
        })?;
        Ok(self.at(key, value))
    }

    fn as_object(&self) -> Result<&'a Map<String, Value>> {
        self.value.as_object().ok_or_else(|| {
            let location = if self.path.is_empty() { "document root" } else { self.path.as_str() };
            anyhow!("'{location}' must be a JSON object")
        })
    }
}
