use super::EditorAction;
use crate::level::{LevelObjectMut, ObjectModel, ObjectSlot, PlanetOrder, PlanetType};
use crate::session::{EditorSession, NewObjectKind};
use egui::{Color32, DragValue, Ui};

const HEADER: Color32 = Color32::from_rgb(240, 200, 120);

pub(super) fn show(ui: &mut Ui, session: &mut EditorSession, actions: &mut Vec<EditorAction>) {
    show_file_state(ui, session, actions);
    ui.separator();
    show_level_properties(ui, session, actions);
    ui.separator();
    show_object_properties(ui, session, actions);
}

fn show_file_state(ui: &mut Ui, session: &EditorSession, actions: &mut Vec<EditorAction>) {
    ui.colored_label(HEADER, "JSON File");
    match session.level_path() {
        Some(path) => ui.label(format!("Current file: {}", path.display())),
        None => ui.label("No file open"),
    };
    ui.horizontal(|ui| {
        if ui.button("Open").clicked() {
            actions.push(EditorAction::OpenLevel);
        }
        let has_level = session.level().is_some();
        if ui.add_enabled(has_level && session.level_path().is_some(), egui::Button::new("Save")).clicked() {
            actions.push(EditorAction::SaveLevel);
        }
        if ui.add_enabled(has_level, egui::Button::new("Save As")).clicked() {
            actions.push(EditorAction::SaveLevelAs);
        }
    });
}

fn show_level_properties(ui: &mut Ui, session: &mut EditorSession, actions: &mut Vec<EditorAction>) {
    ui.colored_label(HEADER, "Level Properties");
    let Some(level) = session.level_mut() else {
        ui.label("No level loaded");
        return;
    };
    egui::Grid::new("level_properties").num_columns(2).show(ui, |ui| {
        ui.label("Level number");
        ui.add(unclamped(DragValue::new(&mut level.level_number).range(0..=i32::MAX)));
        ui.end_row();
        ui.label("Timer (s)");
        ui.add(unclamped(DragValue::new(&mut level.level_timer).speed(1.0).range(0.0..=f32::MAX)));
        ui.end_row();
    });
    ui.small(format!("Planets: {}  Foods: {}", level.planets.len(), level.foods.len()));

    ui.horizontal_wrapped(|ui| {
        for (label, kind) in [
            ("Add planet", NewObjectKind::Planet),
            ("Add food", NewObjectKind::Food),
            ("Set player", NewObjectKind::Player),
            ("Set customer", NewObjectKind::Customer),
        ] {
            if ui.button(label).clicked() {
                actions.push(EditorAction::Add(kind));
            }
        }
    });
    ui.checkbox(&mut session.show_gravity_ranges, "Show gravity ranges");
}

fn show_object_properties(ui: &mut Ui, session: &mut EditorSession, actions: &mut Vec<EditorAction>) {
    ui.colored_label(HEADER, "Object Properties");
    let Some(slot) = session.selection() else {
        ui.label("No selected object");
        return;
    };
    let texture_path = session.level().and_then(|level| level.base(slot)).map(|object| {
        session
            .registry()
            .asset_relative_path(&object.texture)
            .unwrap_or_else(|_| object.texture.path().display().to_string())
    });
    let Some(object) = session.level_mut().and_then(|level| level.object_mut(slot)) else {
        ui.label("No selected object");
        return;
    };
    ui.label(format!("Selected: {}", slot.label()));
    if let Some(texture_path) = texture_path {
        ui.label(format!("Texture filepath: {texture_path}"));
    }

    match object {
        LevelObjectMut::Generic(base) => {
            base_properties(ui, base);
            ui.horizontal(|ui| {
                ui.add_enabled(false, egui::Checkbox::new(&mut (slot == ObjectSlot::Player), "Is player"));
                ui.add_enabled(false, egui::Checkbox::new(&mut (slot == ObjectSlot::Customer), "Is customer"));
            });
        }
        LevelObjectMut::Planet(planet) => {
            base_properties(ui, &mut planet.object);
            ui.separator();
            ui.colored_label(HEADER, "Planet Properties");
            ui.horizontal(|ui| {
                for order in [PlanetOrder::Start, PlanetOrder::Middle, PlanetOrder::End] {
                    ui.radio_value(&mut planet.order, order, order.label());
                }
            });
            egui::ComboBox::from_label("Planet type").selected_text(planet.kind.label()).show_ui(ui, |ui| {
                for kind in PlanetType::ALL {
                    ui.selectable_value(&mut planet.kind, kind, kind.label());
                }
            });
            ui.checkbox(&mut planet.has_food, "Has food");
        }
        LevelObjectMut::Food(food) => {
            base_properties(ui, &mut food.object);
            ui.separator();
            ui.colored_label(HEADER, "Food Properties");
            ui.checkbox(&mut food.cookable, "Cookable");
            ui.checkbox(&mut food.seasonable, "Seasonable");
        }
    }

    ui.separator();
    if ui.button("Delete object").clicked() {
        actions.push(EditorAction::DeleteSelected);
    }
}

fn base_properties(ui: &mut Ui, object: &mut ObjectModel) {
    egui::Grid::new("object_properties").num_columns(2).show(ui, |ui| {
        ui.label("Position");
        ui.horizontal(|ui| {
            ui.add(DragValue::new(&mut object.position.x).speed(1.0).prefix("x: "));
            ui.add(DragValue::new(&mut object.position.y).speed(1.0).prefix("y: "));
        });
        ui.end_row();
        ui.label("Anchor");
        ui.horizontal(|ui| {
            ui.add(unclamped(DragValue::new(&mut object.anchor.x).speed(0.01).range(0.0..=1.0)));
            ui.add(unclamped(DragValue::new(&mut object.anchor.y).speed(0.01).range(0.0..=1.0)));
        });
        ui.end_row();
        ui.label("Scale");
        ui.add(egui::Slider::new(&mut object.scale, 0.1..=2.0).clamping(egui::SliderClamping::Edits));
        ui.end_row();
        ui.label("Texture columns");
        ui.add(unclamped(DragValue::new(&mut object.cols).range(1..=u32::MAX)));
        ui.end_row();
        ui.label("Texture span");
        ui.add(unclamped(DragValue::new(&mut object.span).range(1..=u32::MAX)));
        ui.end_row();
    });
}

/// Ranges bound user edits only; imported values outside them are shown as they are.
fn unclamped(value: DragValue<'_>) -> DragValue<'_> {
    value.clamp_existing_to_range(false)
}
