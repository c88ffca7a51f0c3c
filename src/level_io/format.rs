use glam::Vec2;
use serde::{Deserialize, Serialize};

pub const OBJECT_NODE_TYPE: &str = "Animation";
pub const CONTAINER_NODE_TYPE: &str = "Node";

pub const START_PLANET_KEY: &str = "startPlanet";
pub const END_PLANET_KEY: &str = "endPlanet";
pub const MIDDLE_PLANET_PREFIX: &str = "planet";
pub const FOOD_PREFIX: &str = "food";
pub const RANGE_SUFFIX: &str = "Range";
pub const SCENE_KEY_PREFIX: &str = "lv";

/// Gravity-range sprites are separate nodes in the game, drawn from a 5-frame strip.
pub const RANGE_TEXTURE: &str = "range";
pub const RANGE_GRID: u32 = 5;
pub const RANGE_SCALE_FACTOR: f32 = 3.0;

pub const FONT_KEY: &str = "felt32";
pub const FONT_FILE: &str = "fonts/MarkerFelt.ttf";
pub const FONT_SIZE: u32 = 32;
pub const BACKGROUND_TEXTURE: &str = "background";

/// `[x, y]`, or a single number meaning both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Pair([f32; 2]),
    Scalar(f32),
}

impl Coord {
    pub fn to_vec2(self) -> Vec2 {
        match self {
            Coord::Pair([x, y]) => Vec2::new(x, y),
            Coord::Scalar(value) => Vec2::splat(value),
        }
    }
}

impl From<Vec2> for Coord {
    fn from(value: Vec2) -> Self {
        Coord::Pair([value.x, value.y])
    }
}

/// An `Animation` scene node. Unknown keys in `data` are ignored on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectNode {
    #[serde(rename = "type", default = "ObjectNode::default_type")]
    pub node_type: String,
    pub data: ObjectNodeData,
}

impl ObjectNode {
    fn default_type() -> String {
        OBJECT_NODE_TYPE.to_string()
    }

    pub fn new(data: ObjectNodeData) -> Self {
        Self { node_type: Self::default_type(), data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNodeData {
    pub texture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<i64>,
    #[serde(default)]
    pub frame: u32,
    pub scale: Coord,
    pub position: Coord,
    pub anchor: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_food: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sun: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_black_hole: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_storage: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_season_planet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonable: Option<bool>,
}

impl ObjectNodeData {
    pub fn new(texture: impl Into<String>, cols: u32, span: u32, scale: f32, position: Vec2, anchor: Vec2) -> Self {
        Self {
            texture: texture.into(),
            cols: Some(i64::from(cols)),
            span: Some(i64::from(span)),
            frame: 0,
            scale: Coord::Scalar(scale),
            position: position.into(),
            anchor: anchor.into(),
            has_food: None,
            is_sun: None,
            is_black_hole: None,
            is_storage: None,
            is_season_planet: None,
            cookable: None,
            seasonable: None,
        }
    }
}

/// Numeric suffix of keys such as `food12` or `planet3`.
pub fn key_index(key: &str) -> Option<u64> {
    let digits_start = key.len() - key.bytes().rev().take_while(u8::is_ascii_digit).count();
    key[digits_start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_accept_pairs_and_scalars() {
        let pair: Coord = serde_json::from_str("[1.5, -2]").expect("pair");
        assert_eq!(pair.to_vec2(), Vec2::new(1.5, -2.0));
        let scalar: Coord = serde_json::from_str("0.75").expect("scalar");
        assert_eq!(scalar.to_vec2(), Vec2::splat(0.75));
    }

    #[test]
    fn key_index_reads_trailing_digits() {
        assert_eq!(key_index("food12"), Some(12));
        assert_eq!(key_index("planet3"), Some(3));
        assert_eq!(key_index("startPlanet"), None);
        assert_eq!(key_index(""), None);
    }

    #[test]
    fn node_data_uses_camel_case_and_skips_unset_flags() {
        let mut data = ObjectNodeData::new("sun", 2, 2, 0.5, Vec2::new(1.0, 2.0), Vec2::splat(0.5));
        data.is_black_hole = Some(true);
        let value = serde_json::to_value(ObjectNode::new(data)).expect("serialize");
        assert_eq!(value["type"], "Animation");
        assert_eq!(value["data"]["isBlackHole"], true);
        assert!(value["data"].get("cookable").is_none());
        assert_eq!(value["data"]["frame"], 0);
    }
}
