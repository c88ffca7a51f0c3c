use anyhow::{anyhow, bail, Context, Result};
use gourmet_editor::assets::{resolve_root, AssetRegistry, AssetTable};
use gourmet_editor::cli::CliOverrides;
use gourmet_editor::config::EditorConfig;
use gourmet_editor::level::{LevelModel, ObjectModel};
use gourmet_editor::level_io::{export_level, import_level, validate_for_export};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

struct Tool {
    config: EditorConfig,
    registry: AssetRegistry,
}

impl Tool {
    fn new(cli: CliOverrides) -> Result<Self> {
        let mut config = EditorConfig::load_or_default(cli.config_path());
        let overrides = cli.into_config_overrides();
        if !overrides.is_empty() {
            log::info!("[level_tool] CLI overrides: {}", overrides.applied_fields().join(", "));
        }
        config.apply_overrides(&overrides);
        let root = resolve_root(&config.assets)?;
        let registry = AssetRegistry::with_image_crate(root).with_upload_queue(false);
        Ok(Self { config, registry })
    }

    fn asset_table_path(&self) -> PathBuf {
        self.config.assets.asset_table_path(self.registry.root())
    }

    fn import(&mut self, level_path: &str) -> Result<LevelModel> {
        let table_path = self.asset_table_path();
        import_level(level_path, &table_path, &mut self.registry)
    }
}

fn run() -> Result<()> {
    let cli = CliOverrides::parse_from_env()?;
    let mut args = cli.positional().to_vec().into_iter();
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "validate" => {
            let level_path =
                args.next().ok_or_else(|| anyhow!("validate requires a path: level_tool validate <level>"))?;
            cmd_validate(&mut Tool::new(cli)?, &level_path)
        }
        "list" => {
            let level_path = args.next().ok_or_else(|| anyhow!("list requires a path: level_tool list <level>"))?;
            cmd_list(&mut Tool::new(cli)?, &level_path)
        }
        "resave" => {
            let level_path = args
                .next()
                .ok_or_else(|| anyhow!("resave requires a path: level_tool resave <level> [output]"))?;
            let output = args.next();
            cmd_resave(&mut Tool::new(cli)?, &level_path, output.as_deref())
        }
        "textures" => cmd_textures(&mut Tool::new(cli)?),
        "help" => {
            print_usage();
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn print_usage() {
    eprintln!(
        "Level Tool

Usage:
  level_tool validate <level>            Import a level and check it can be exported
  level_tool list <level>                List planets, recipe and characters of a level
  level_tool resave <level> [output]     Import and export a level (in place unless output is given)
  level_tool textures                    Load every texture of the asset table and report sizes
  level_tool help                        Show this message

Options:
  --config <path>           Editor config file (default config/editor.json)
  --root <path>             Asset root; skips repository discovery
"
    );
}

fn cmd_validate(tool: &mut Tool, level_path: &str) -> Result<()> {
    let level = tool.import(level_path)?;
    validate_for_export(&level).with_context(|| format!("Level '{level_path}' cannot be exported"))?;
    println!(
        "Level '{}' ({}) is valid. Planets: {}  Foods: {}  Timer: {}s",
        level_path,
        level.scene_key(),
        level.planets.len(),
        level.foods.len(),
        level.level_timer
    );
    Ok(())
}

fn cmd_list(tool: &mut Tool, level_path: &str) -> Result<()> {
    let level = tool.import(level_path)?;
    println!("{} (timer {}s)", level.scene_key(), level.level_timer);
    println!("planets:");
    for planet in &level.planets {
        println!(
            "  {:<14} {:<10} food={:<5} {}",
            planet.order.label(),
            planet.kind.label(),
            planet.has_food,
            describe(&planet.object)
        );
    }
    println!("recipe:");
    for (index, food) in level.foods.iter().enumerate() {
        println!(
            "  {:>2}. cookable={:<5} seasonable={:<5} {}",
            index + 1,
            food.cookable,
            food.seasonable,
            describe(&food.object)
        );
    }
    for (label, object) in [("player", level.player.as_ref()), ("customer", level.customer.as_ref())] {
        match object {
            Some(object) => println!("{label}: {}", describe(object)),
            None => println!("{label}: <none>"),
        }
    }
    Ok(())
}

fn describe(object: &ObjectModel) -> String {
    format!(
        "{} at ({}, {}) scale {} grid {}x{}",
        object.texture.short_name(),
        object.position.x,
        object.position.y,
        object.scale,
        object.cols,
        object.span
    )
}

fn cmd_resave(tool: &mut Tool, level_path: &str, output: Option<&str>) -> Result<()> {
    let level = tool.import(level_path)?;
    let output = Path::new(output.unwrap_or(level_path));
    let table_path = tool.asset_table_path();
    export_level(&level, &tool.registry, output, &table_path)?;
    println!("Saved {} to {}", level.scene_key(), output.display());
    Ok(())
}

fn cmd_textures(tool: &mut Tool) -> Result<()> {
    let table_path = tool.asset_table_path();
    let table = AssetTable::load(&table_path)?;
    let mut failures = Vec::new();
    for (name, entry) in &table.textures {
        match tool.registry.load_asset_path(&entry.file, Some(name)) {
            Ok(texture) => println!("  {name:<24} {:>5}x{:<5} {}", texture.width(), texture.height(), entry.file),
            Err(err) => {
                println!("  {name:<24} FAILED      {}", entry.file);
                failures.push(format!("{name}: {err:#}"));
            }
        }
    }
    if failures.is_empty() {
        println!("{} texture(s) listed in {} load cleanly.", table.textures.len(), table_path.display());
        Ok(())
    } else {
        bail!("{} texture(s) failed to load:\n  {}", failures.len(), failures.join("\n  "));
    }
}
