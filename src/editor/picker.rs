use crate::session::FilePicker;
use std::path::{Path, PathBuf};

/// Native open/save dialogs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RfdFilePicker;

impl FilePicker for RfdFilePicker {
    fn pick_file(&mut self, title: &str, initial_dir: &Path, extensions: &[&str]) -> Option<PathBuf> {
        let filter = extensions.join(", ").to_uppercase();
        rfd::FileDialog::new()
            .set_title(title)
            .set_directory(initial_dir)
            .add_filter(filter, extensions)
            .pick_file()
    }

    fn save_file(&mut self, title: &str, initial_dir: &Path, file_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title(title)
            .set_directory(initial_dir)
            .set_file_name(file_name)
            .add_filter("JSON", &["json"])
            .save_file()
    }
}
