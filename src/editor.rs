//! egui front end over [`EditorSession`]. The host owns the window and the egui backend and calls
//! [`EditorUi::show`] once per frame.

mod canvas;
mod picker;
mod properties;
mod recipe;
mod textures;

pub use picker::RfdFilePicker;
pub use textures::EguiTextures;

use crate::level::ObjectSlot;
use crate::session::{EditorSession, FilePicker, NewObjectKind};
use anyhow::Result;

/// Structural changes raised by the panels, applied once every panel has been drawn.
/// Field edits (position, flags, timer) are written straight into the level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorAction {
    OpenLevel,
    SaveLevel,
    SaveLevelAs,
    Add(NewObjectKind),
    DeleteSelected,
    Select(Option<ObjectSlot>),
    SelectFood(usize),
    MoveSelectedFood(isize),
}

pub struct EditorUi {
    textures: EguiTextures,
    picker: Box<dyn FilePicker>,
    pending_actions: Vec<EditorAction>,
    error: Option<String>,
    pub show_properties: bool,
    pub show_recipe: bool,
}

impl EditorUi {
    pub fn new(picker: Box<dyn FilePicker>) -> Self {
        Self {
            textures: EguiTextures::default(),
            picker,
            pending_actions: Vec::new(),
            error: None,
            show_properties: true,
            show_recipe: true,
        }
    }

    /// Uses native dialogs from `rfd`.
    pub fn with_native_dialogs() -> Self {
        Self::new(Box::new(RfdFilePicker))
    }

    pub fn textures(&self) -> &EguiTextures {
        &self.textures
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Queues an action as if a panel had raised it.
    pub fn push_action(&mut self, action: EditorAction) {
        self.pending_actions.push(action);
    }

    pub fn show(&mut self, ctx: &egui::Context, session: &mut EditorSession) {
        self.textures.sync(ctx, session.registry_mut());

        if self.show_properties {
            let mut open = self.show_properties;
            egui::Window::new("Properties Editor").open(&mut open).default_width(360.0).show(ctx, |ui| {
                properties::show(ui, session, &mut self.pending_actions);
            });
            self.show_properties = open;
        }
        if self.show_recipe {
            let mut open = self.show_recipe;
            egui::Window::new("Recipe Editor")
                .open(&mut open)
                .default_size(egui::vec2(400.0, 600.0))
                .show(ctx, |ui| {
                    recipe::show(ui, session, &mut self.pending_actions);
                });
            self.show_recipe = open;
        }
        self.show_error_window(ctx);

        egui::CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
            canvas::show(ui, session, &self.textures);
        });

        self.apply_actions(session);
    }

    fn show_error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.as_ref() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message.as_str());
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.error = None;
        }
    }

    fn apply_actions(&mut self, session: &mut EditorSession) {
        for action in std::mem::take(&mut self.pending_actions) {
            if let Err(err) = self.apply(action, session) {
                log::error!("[editor] {action:?} failed: {err:?}");
                self.error = Some(format!("{err:#}"));
            }
        }
    }

    fn apply(&mut self, action: EditorAction, session: &mut EditorSession) -> Result<()> {
        let picker = self.picker.as_mut();
        match action {
            EditorAction::OpenLevel => {
                if session.open_level_from_picker(picker)? {
                    if let Some(path) = session.level_path() {
                        log::info!("[editor] opened {}", path.display());
                    }
                }
            }
            EditorAction::SaveLevel => {
                session.save_level()?;
                if let Some(path) = session.level_path() {
                    log::info!("[editor] saved {}", path.display());
                }
            }
            EditorAction::SaveLevelAs => {
                session.save_level_from_picker(picker)?;
            }
            EditorAction::Add(kind) => {
                session.add_object_from_picker(kind, picker)?;
            }
            EditorAction::DeleteSelected => {
                session.delete_selected();
            }
            EditorAction::Select(slot) => session.select(slot),
            EditorAction::SelectFood(index) => session.select_food(index),
            EditorAction::MoveSelectedFood(offset) => {
                session.move_selected_food(offset);
            }
        }
        Ok(())
    }
}

fn to_pos2(value: glam::Vec2) -> egui::Pos2 {
    egui::pos2(value.x, value.y)
}

fn from_pos2(value: egui::Pos2) -> glam::Vec2 {
    glam::Vec2::new(value.x, value.y)
}

fn rect_from(min: glam::Vec2, max: glam::Vec2) -> egui::Rect {
    egui::Rect::from_min_max(to_pos2(min), to_pos2(max))
}
