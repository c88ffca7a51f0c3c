#![allow(dead_code)]

use gourmet_editor::assets::AssetRegistry;
use gourmet_editor::config::EditorConfig;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway game checkout: `.git`, `assets/textures/*.png` and `assets/json/assets.json`.
pub struct Fixture {
    pub dir: TempDir,
    pub assets: PathBuf,
}

pub const TEXTURES: [(&str, u32, u32); 7] = [
    ("planet", 64, 32),
    ("sun", 64, 32),
    ("food_a", 16, 16),
    ("food_b", 16, 16),
    ("player", 20, 40),
    ("customer", 24, 24),
    ("range", 100, 20),
];

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir(dir.path().join(".git")).expect("repo marker");
        let assets = dir.path().join("assets");
        fs::create_dir_all(assets.join("textures")).expect("textures dir");
        fs::create_dir_all(assets.join("json")).expect("json dir");

        let mut table = serde_json::Map::new();
        for (name, width, height) in TEXTURES {
            let pixels = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
            pixels.save(assets.join("textures").join(format!("{name}.png"))).expect("write png");
            table.insert(name.to_string(), json!({ "file": format!("textures/{name}.png") }));
        }
        let table = json!({ "textures": table, "sounds": { "bgm": { "file": "sounds/bgm.ogg" } } });
        fs::write(assets.join("json/assets.json"), serde_json::to_vec_pretty(&table).expect("table"))
            .expect("write asset table");
        Self { dir, assets }
    }

    pub fn config(&self) -> EditorConfig {
        let mut config = EditorConfig::default();
        config.assets.root = Some(self.assets.clone());
        config
    }

    pub fn registry(&self) -> AssetRegistry {
        AssetRegistry::with_image_crate(&self.assets).with_upload_queue(false)
    }

    pub fn asset_table(&self) -> PathBuf {
        self.assets.join("json/assets.json")
    }

    pub fn texture(&self, name: &str) -> PathBuf {
        self.assets.join("textures").join(format!("{name}.png"))
    }

    pub fn write_level(&self, file_name: &str, document: &Value) -> PathBuf {
        let path = self.assets.join("json").join(file_name);
        fs::write(&path, serde_json::to_vec_pretty(document).expect("level json")).expect("write level");
        path
    }

    pub fn read_json(path: &Path) -> Value {
        serde_json::from_slice(&fs::read(path).expect("read json")).expect("parse json")
    }
}

pub fn object(texture: &str, position: [f32; 2], extra: Value) -> Value {
    let mut data = json!({
        "texture": texture,
        "scale": 0.5,
        "position": position,
        "anchor": [0.5, 0.5]
    });
    if let (Some(data), Value::Object(extra)) = (data.as_object_mut(), extra) {
        data.extend(extra);
    }
    json!({ "type": "Animation", "data": data })
}

/// Level 3: start, end, one sun in between, three foods and both characters.
pub fn sample_level() -> Value {
    json!({
        "scenes": { "lv3": { "type": "Node", "children": { "game": { "type": "Node", "children": {
            "planets": { "type": "Node", "children": {
                "startPlanet": object("planet", [0.0, 100.0], json!({ "cols": 2, "span": 2 })),
                "planet1": object("sun", [200.0, 50.0], json!({ "cols": 2, "span": 2, "isSun": true })),
                "endPlanet": object("planet", [400.0, 0.0], json!({ "cols": 2, "span": 2, "hasFood": true }))
            }},
            "food": { "type": "Node", "children": {
                "food1": object("food_b", [10.0, 10.0], json!({ "cookable": true })),
                "food2": object("food_a", [20.0, 20.0], json!({})),
                "food3": object("food_b", [30.0, 30.0], json!({ "seasonable": true }))
            }},
            "player": object("player", [0.0, 150.0], json!({})),
            "customer": object("customer", [450.0, -20.0], json!({})),
            "timer": { "type": "Node", "data": { "timer": 60 } }
        }}}}}
    })
}
