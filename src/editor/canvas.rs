use super::{from_pos2, rect_from, to_pos2, EguiTextures};
use crate::level::ObjectModel;
use crate::session::{EditorSession, PointerState};
use crate::viewport::Canvas;
use egui::{Color32, Rect, Sense, Stroke, StrokeKind, Ui};

const BACKGROUND: Color32 = Color32::from_rgb(20, 20, 24);
const GRID: Color32 = Color32::from_rgb(50, 50, 50);
const SELECTION: Color32 = Color32::from_rgb(255, 196, 94);
const MISSING_TEXTURE: Color32 = Color32::from_rgb(200, 60, 200);

/// The level view: grid, sprites, gravity ranges and the selection outline.
pub(super) fn show(ui: &mut Ui, session: &mut EditorSession, textures: &EguiTextures) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
    let rect = response.rect;
    let size = glam::Vec2::new(rect.width(), rect.height());
    session.viewport_mut().set_canvas(Canvas::from_min_size(from_pos2(rect.min), size));

    let pointer = ui.input(|input| PointerState {
        pos: input.pointer.latest_pos().map(from_pos2),
        pressed: input.pointer.primary_pressed(),
        down: input.pointer.primary_down(),
        hovered: response.hovered(),
    });
    session.handle_canvas_input(&pointer);

    painter.rect_filled(rect, 0.0, BACKGROUND);
    for line in session.viewport().grid_lines(session.config().canvas.grid_spacing) {
        painter.line_segment([to_pos2(line.from), to_pos2(line.to)], Stroke::new(1.0, GRID));
    }

    let Some(level) = session.level() else {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Open a level from the Properties Editor",
            egui::FontId::proportional(16.0),
            ui.visuals().weak_text_color(),
        );
        return;
    };

    let range_texture = session
        .gravity_range_texture()
        .filter(|_| session.show_gravity_ranges)
        .and_then(|texture| textures.id(texture.handle()));
    for planet in &level.planets {
        draw_object(&painter, session, textures, &planet.object);
        if let (Some(range_id), Some((min, max))) = (range_texture, session.gravity_range_bounds(planet)) {
            let viewport = session.viewport();
            let screen = rect_from(viewport.world_to_screen(min), viewport.world_to_screen(max));
            let uv = Rect::from_min_max(egui::pos2(0.2, 0.0), egui::pos2(0.4, 1.0));
            painter.image(range_id, screen, uv, Color32::WHITE);
        }
    }
    for food in &level.foods {
        draw_object(&painter, session, textures, &food.object);
    }
    for object in level.player.iter().chain(level.customer.iter()) {
        draw_object(&painter, session, textures, object);
    }

    if let Some(selected) = session.selection().and_then(|slot| level.base(slot)) {
        let screen = screen_rect(session, selected);
        painter.rect_stroke(screen, 0.0, Stroke::new(2.0, SELECTION), StrokeKind::Outside);
    }
}

fn screen_rect(session: &EditorSession, object: &ObjectModel) -> Rect {
    let (min, max) = object.world_bounds();
    let viewport = session.viewport();
    rect_from(viewport.world_to_screen(min), viewport.world_to_screen(max))
}

fn draw_object(painter: &egui::Painter, session: &EditorSession, textures: &EguiTextures, object: &ObjectModel) {
    let screen = screen_rect(session, object);
    match textures.id(object.texture.handle()) {
        Some(id) => {
            let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), to_pos2(object.uv_end()));
            painter.image(id, screen, uv, Color32::WHITE);
        }
        None => {
            painter.rect_stroke(screen, 0.0, Stroke::new(1.0, MISSING_TEXTURE), StrokeKind::Inside);
        }
    }
}
