pub mod assets;
pub mod cli;
pub mod config;
#[cfg(feature = "editor")]
pub mod editor;
pub mod level;
pub mod level_io;
pub mod session;
pub mod viewport;

pub use assets::{AssetRegistry, Texture};
pub use level::{FoodModel, LevelModel, ObjectModel, ObjectSlot, PlanetModel};
pub use session::EditorSession;

/// JSON with 4-space indentation and a trailing newline, so level files diff cleanly.
pub(crate) fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}
