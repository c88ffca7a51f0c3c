use super::EditorAction;
use crate::level::ObjectSlot;
use crate::session::EditorSession;
use egui::Ui;

/// Food list in recipe order. Selecting a food centres the canvas on it.
pub(super) fn show(ui: &mut Ui, session: &EditorSession, actions: &mut Vec<EditorAction>) {
    let Some(level) = session.level() else {
        ui.label("No level loaded");
        return;
    };
    if level.foods.is_empty() {
        ui.label("The recipe is empty. Add food from the Properties Editor.");
        return;
    }
    let selected = match session.selection() {
        Some(ObjectSlot::Food(index)) => Some(index),
        _ => None,
    };

    ui.label("Recipe order");
    egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
        for (index, food) in level.foods.iter().enumerate() {
            let name = format!("{}. {}", index + 1, food.object.texture.file_name());
            if ui.selectable_label(selected == Some(index), name).clicked() && selected != Some(index) {
                actions.push(EditorAction::SelectFood(index));
            }
        }
    });

    ui.horizontal(|ui| {
        let last = level.foods.len() - 1;
        if ui.add_enabled(selected.is_some_and(|index| index < last), egui::Button::new("Move down")).clicked() {
            actions.push(EditorAction::MoveSelectedFood(1));
        }
        if ui.add_enabled(selected.is_some_and(|index| index > 0), egui::Button::new("Move up")).clicked() {
            actions.push(EditorAction::MoveSelectedFood(-1));
        }
    });
}
