use super::format::{
    ObjectNode, ObjectNodeData, BACKGROUND_TEXTURE, CONTAINER_NODE_TYPE, END_PLANET_KEY, FONT_FILE, FONT_KEY,
    FONT_SIZE, FOOD_PREFIX, MIDDLE_PLANET_PREFIX, RANGE_GRID, RANGE_SCALE_FACTOR, RANGE_SUFFIX, RANGE_TEXTURE,
    START_PLANET_KEY,
};
use crate::assets::{AssetRegistry, AssetTable};
use crate::level::{FoodModel, LevelModel, ObjectModel, PlanetModel, PlanetOrder};
use anyhow::{Context, Result};
use glam::Vec2;
use serde_json::{json, Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingPlayer,
    MissingCustomer,
    StartPlanetCount(usize),
    EndPlanetCount(usize),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingPlayer => write!(f, "Level has no player"),
            ValidationIssue::MissingCustomer => write!(f, "Level has no customer"),
            ValidationIssue::StartPlanetCount(found) => {
                write!(f, "Level must have exactly one starting planet (found {found})")
            }
            ValidationIssue::EndPlanetCount(found) => {
                write!(f, "Level must have exactly one ending planet (found {found})")
            }
        }
    }
}

/// Every reason a level cannot be exported, in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelValidationError {
    issues: Vec<ValidationIssue>,
}

impl LevelValidationError {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

impl fmt::Display for LevelValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [single] => write!(f, "{single}"),
            issues => {
                write!(f, "Level cannot be exported:")?;
                for issue in issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LevelValidationError {}

pub fn validate_for_export(level: &LevelModel) -> Result<(), LevelValidationError> {
    let mut issues = Vec::new();
    if level.player.is_none() {
        issues.push(ValidationIssue::MissingPlayer);
    }
    if level.customer.is_none() {
        issues.push(ValidationIssue::MissingCustomer);
    }
    let starts = level.count_order(PlanetOrder::Start);
    if starts != 1 {
        issues.push(ValidationIssue::StartPlanetCount(starts));
    }
    let ends = level.count_order(PlanetOrder::End);
    if ends != 1 {
        issues.push(ValidationIssue::EndPlanetCount(ends));
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(LevelValidationError { issues })
    }
}

/// Validates `level`, refreshes the shared asset table and writes the level file.
///
/// Both documents are fully rendered before either file is written, so a
/// validation or rendering failure leaves the disk untouched.
pub fn export_level(
    level: &LevelModel,
    registry: &AssetRegistry,
    level_path: impl AsRef<Path>,
    asset_table_path: impl AsRef<Path>,
) -> Result<()> {
    let level_path = level_path.as_ref();
    let asset_table_path = asset_table_path.as_ref();
    validate_for_export(level)?;

    let mut table = if asset_table_path.exists() {
        AssetTable::load(asset_table_path)?
    } else {
        AssetTable::default()
    };
    table.merge_registry(registry)?;
    let table_bytes = table.to_json_bytes()?;

    let document = render_level(level, &table)?;
    let level_bytes = crate::to_pretty_json(&document)?;

    if let Some(parent) = asset_table_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    // Both files are staged before either is replaced.
    let staged_level = stage(level_path, &level_bytes)
        .with_context(|| format!("Failed to write level file {}", level_path.display()))?;
    let staged_table = match stage(asset_table_path, &table_bytes) {
        Ok(staged) => staged,
        Err(err) => {
            let _ = fs::remove_file(&staged_level);
            return Err(err)
                .with_context(|| format!("Failed to write asset table {}", asset_table_path.display()));
        }
    };
    if let Err(err) = fs::rename(&staged_level, level_path) {
        let _ = fs::remove_file(&staged_level);
        let _ = fs::remove_file(&staged_table);
        return Err(err).with_context(|| format!("Failed to write level file {}", level_path.display()));
    }
    fs::rename(&staged_table, asset_table_path)
        .with_context(|| format!("Failed to write asset table {}", asset_table_path.display()))?;
    log::info!(
        "[export] wrote level {} to {} ({} planet(s), {} food(s), {} texture(s))",
        level.level_number,
        level_path.display(),
        level.planets.len(),
        level.foods.len(),
        table.textures.len()
    );
    Ok(())
}

/// Writes `bytes` next to `path` under a `.tmp` suffix and returns the staged path.
fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    let staged = path.with_file_name(name);
    if let Err(err) = fs::write(&staged, bytes) {
        let _ = fs::remove_file(&staged);
        return Err(err).with_context(|| format!("Failed to write {}", staged.display()));
    }
    Ok(staged)
}

/// Renders the scene-graph document for `level`, embedding `table` as its texture list.
/// Fails if the level does not validate.
pub fn render_level(level: &LevelModel, table: &AssetTable) -> Result<Value> {
    validate_for_export(level)?;
    let (planets, ranges) = planet_nodes(&level.planets)?;
    let mut foods = Map::new();
    for (index, food) in level.foods.iter().enumerate() {
        foods.insert(format!("{FOOD_PREFIX}{}", index + 1), food_node(food)?);
    }

    let mut game = Map::new();
    game.insert("planets".into(), container(planets));
    game.insert("planetRanges".into(), container(ranges));
    game.insert("food".into(), container(foods));
    // Validation guarantees both are present.
    if let Some(player) = level.player.as_ref() {
        game.insert("player".into(), object_value(ObjectNode::new(object_data(player)))?);
    }
    if let Some(customer) = level.customer.as_ref() {
        game.insert("customer".into(), object_value(ObjectNode::new(object_data(customer)))?);
    }
    game.insert("timer".into(), json!({"type": CONTAINER_NODE_TYPE, "data": {"timer": level.level_timer}}));
    game.insert(
        "numPlanets".into(),
        json!({"type": CONTAINER_NODE_TYPE, "data": {"num": level.planets.len().saturating_sub(2)}}),
    );
    game.insert("numFood".into(), json!({"type": CONTAINER_NODE_TYPE, "data": {"num": level.foods.len()}}));

    let mut scene_children = Map::new();
    scene_children.insert("game".into(), container(game));
    let mut scene = Map::new();
    scene.insert("type".into(), Value::from(CONTAINER_NODE_TYPE));
    scene.insert("children".into(), Value::Object(scene_children));
    scene.insert("background".into(), background_node());

    let mut scenes = Map::new();
    scenes.insert(level.scene_key(), Value::Object(scene));

    let textures = serde_json::to_value(&table.textures).context("Failed to render texture table")?;
    Ok(json!({
        "scenes": scenes,
        "fonts": { FONT_KEY: { "file": FONT_FILE, "size": FONT_SIZE } },
        "textures": textures,
    }))
}

/// Planet nodes keyed for the game plus their gravity-range mirrors.
fn planet_nodes(planets: &[PlanetModel]) -> Result<(Map<String, Value>, Map<String, Value>)> {
    let mut keyed: Vec<(String, &PlanetModel)> = Vec::with_capacity(planets.len());
    let with_order =
        move |order: PlanetOrder| planets.iter().filter(move |planet: &&PlanetModel| planet.order == order);
    keyed.extend(with_order(PlanetOrder::Start).map(|planet| (START_PLANET_KEY.to_string(), planet)));
    keyed.extend(with_order(PlanetOrder::End).map(|planet| (END_PLANET_KEY.to_string(), planet)));
    keyed.extend(
        with_order(PlanetOrder::Middle)
            .enumerate()
            .map(|(index, planet)| (format!("{MIDDLE_PLANET_PREFIX}{}", index + 1), planet)),
    );

    let mut nodes = Map::new();
    let mut ranges = Map::new();
    for (key, planet) in keyed {
        ranges.insert(format!("{key}{RANGE_SUFFIX}"), range_node(&planet.object)?);
        nodes.insert(key, planet_node(planet)?);
    }
    Ok((nodes, ranges))
}

fn planet_node(planet: &PlanetModel) -> Result<Value> {
    let mut data = object_data(&planet.object);
    let flags = planet.kind.flags();
    data.has_food = Some(planet.has_food);
    data.is_sun = Some(flags.is_sun);
    data.is_black_hole = Some(flags.is_black_hole);
    data.is_storage = Some(flags.is_storage);
    data.is_season_planet = Some(flags.is_season);
    object_value(ObjectNode::new(data))
}

fn range_node(object: &ObjectModel) -> Result<Value> {
    let data = ObjectNodeData::new(
        RANGE_TEXTURE,
        RANGE_GRID,
        RANGE_GRID,
        object.scale * RANGE_SCALE_FACTOR,
        game_position(object.position),
        object.anchor,
    );
    object_value(ObjectNode::new(data))
}

fn food_node(food: &FoodModel) -> Result<Value> {
    let mut data = object_data(&food.object);
    data.cookable = Some(food.cookable);
    data.seasonable = Some(food.seasonable);
    object_value(ObjectNode::new(data))
}

fn object_data(object: &ObjectModel) -> ObjectNodeData {
    ObjectNodeData::new(
        object.texture.short_name(),
        object.cols,
        object.span,
        object.scale,
        game_position(object.position),
        object.anchor,
    )
}

/// Inverse of the import flip. Zero stays `0.0` rather than becoming `-0.0` in the file.
fn game_position(position: Vec2) -> Vec2 {
    let y = if position.y == 0.0 { 0.0 } else { -position.y };
    Vec2::new(position.x, y)
}

fn object_value(node: ObjectNode) -> Result<Value> {
    serde_json::to_value(node).context("Failed to render object node")
}

fn container(children: Map<String, Value>) -> Value {
    json!({"type": CONTAINER_NODE_TYPE, "children": children})
}

fn background_node() -> Value {
    json!({
        "type": "Image",
        "data": {
            "texture": BACKGROUND_TEXTURE,
            "anchor": [0.5, 0.5],
            "position": [0.0, 0.0],
            "scale": 1.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{DecodedImage, ImageLoader};
    use crate::level::PlanetType;
    use std::sync::Arc;

    struct Blank;

    impl ImageLoader for Blank {
        fn decode(&mut self, _path: &Path) -> Result<DecodedImage> {
            Ok(DecodedImage { width: 16, height: 16, rgba: Vec::new() })
        }
    }

    fn sample_level(registry: &mut AssetRegistry) -> LevelModel {
        let tex = registry.load_asset_path("textures/planet.png", Some("planet")).expect("texture");
        let object = |x: f32, y: f32| ObjectModel::new(Arc::clone(&tex)).with_position(Vec2::new(x, y));
        let mut level = LevelModel::new(4);
        level.add_planet(PlanetModel::new(object(0.0, 0.0)));
        level.add_planet(PlanetModel::new(object(1.0, -1.0)).with_order(PlanetOrder::End));
        level.add_planet(PlanetModel::new(object(2.0, -2.0)).with_order(PlanetOrder::Start));
        level.add_planet(PlanetModel::new(object(3.0, -3.0)));
        level.set_player(object(10.0, 20.0));
        level.set_customer(object(30.0, 40.0));
        level.level_timer = 45.0;
        level
    }

    #[test]
    fn valid_level_passes() {
        let mut registry = AssetRegistry::new("/assets", Box::new(Blank));
        assert!(validate_for_export(&sample_level(&mut registry)).is_ok());
    }

    #[test]
    fn start_and_end_counts_are_enforced() {
        let mut registry = AssetRegistry::new("/assets", Box::new(Blank));
        let mut level = sample_level(&mut registry);
        level.planets[0].order = PlanetOrder::Start;
        let err = validate_for_export(&level).unwrap_err();
        assert_eq!(err.issues(), &[ValidationIssue::StartPlanetCount(2)]);
        assert!(err.to_string().contains("starting planet"));

        level.planets[0].order = PlanetOrder::Middle;
        level.planets[1].order = PlanetOrder::Middle;
        let err = validate_for_export(&level).unwrap_err();
        assert_eq!(err.issues(), &[ValidationIssue::EndPlanetCount(0)]);
        assert!(err.to_string().contains("ending planet"));
    }

    #[test]
    fn all_violations_are_reported_together() {
        let level = LevelModel::new(1);
        let err = validate_for_export(&level).unwrap_err();
        assert_eq!(
            err.issues(),
            &[
                ValidationIssue::MissingPlayer,
                ValidationIssue::MissingCustomer,
                ValidationIssue::StartPlanetCount(0),
                ValidationIssue::EndPlanetCount(0),
            ]
        );
        let message = err.to_string();
        assert!(message.contains("no player") && message.contains("no customer"), "{message}");
    }

    #[test]
    fn planets_get_keys_ranges_and_flipped_positions() {
        let mut registry = AssetRegistry::new("/assets", Box::new(Blank));
        let mut level = sample_level(&mut registry);
        level.planets[3].kind = PlanetType::Season;
        level.planets[3].object.scale = 0.5;
        let table = AssetTable::from_registry(&registry).expect("table");
        let doc = render_level(&level, &table).expect("render");
        let game = &doc["scenes"]["lv4"]["children"]["game"]["children"];

        let planets = game["planets"]["children"].as_object().expect("planets");
        let keys: Vec<&str> = planets.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["startPlanet", "endPlanet", "planet1", "planet2"]);
        assert_eq!(planets["startPlanet"]["data"]["position"], json!([2.0, 2.0]));
        assert_eq!(planets["planet2"]["data"]["isSeasonPlanet"], true);
        assert_eq!(planets["planet2"]["data"]["isSun"], false);

        let range = &game["planetRanges"]["children"]["planet2Range"]["data"];
        assert_eq!(range["texture"], "range");
        assert_eq!(range["cols"], 5);
        assert_eq!(range["span"], 5);
        assert_eq!(range["scale"], json!(1.5));
        assert_eq!(range["position"], json!([3.0, 3.0]));

        assert_eq!(game["numPlanets"]["data"]["num"], 2);
        assert_eq!(game["numFood"]["data"]["num"], 0);
        assert_eq!(game["timer"]["data"]["timer"], json!(45.0));
        assert_eq!(game["player"]["data"]["position"], json!([10.0, -20.0]));
        assert_eq!(doc["fonts"]["felt32"]["size"], 32);
        assert_eq!(doc["textures"]["planet"]["file"], "textures/planet.png");
        assert!(doc["scenes"]["lv4"]["background"].is_object());
    }

    #[test]
    fn invalid_level_never_touches_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let level_path = dir.path().join("level.json");
        let table_path = dir.path().join("assets.json");
        fs::write(&level_path, "previous").expect("seed");
        let registry = AssetRegistry::new(dir.path(), Box::new(Blank));
        let err = export_level(&LevelModel::new(1), &registry, &level_path, &table_path).unwrap_err();
        assert!(err.downcast_ref::<LevelValidationError>().is_some());
        assert_eq!(fs::read_to_string(&level_path).expect("read"), "previous");
        assert!(!table_path.exists());
    }

    #[test]
    fn failed_level_write_leaves_the_asset_table_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table_path = dir.path().join("assets.json");
        let level_path = dir.path().join("missing_dir").join("level.json");
        let mut registry = AssetRegistry::new(dir.path(), Box::new(Blank));
        let level = sample_level(&mut registry);

        let err = export_level(&level, &registry, &level_path, &table_path).unwrap_err();
        assert!(format!("{err:#}").contains("level file"), "{err:#}");
        assert!(!table_path.exists());
        assert!(!level_path.exists());

        let seeded = r#"{ "textures": {} }"#;
        fs::write(&table_path, seeded).expect("seed table");
        export_level(&level, &registry, &level_path, &table_path).unwrap_err();
        assert_eq!(fs::read_to_string(&table_path).expect("read"), seeded);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
