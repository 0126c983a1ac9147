//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use arbor_rendering::{
    PanelView, SliderEdits, SliderRange, ANGLE_RANGE, ANGLE_VARIANCE_RANGE, BRANCH_LENGTH_RANGE,
    BRANCH_WIDTH_RANGE, LEAF_LENGTH_RANGE, LEAF_WIDTH_RANGE,
};
use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Id, Ui},
};

/// Buttons pressed and sliders moved while drawing the control panel this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ControlPanelUiResult {
    pub regenerate_pressed: bool,
    pub growth_pressed: bool,
    pub random_pressed: bool,
    pub leaf_color_pressed: bool,
    pub sliders: SliderEdits,
}

/// Layout and content of the control panel for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ControlPanelUiContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin.
    pub background: Color,
    /// Parameter lines and rule description.
    pub view: &'a PanelView,
}

/// Renders the control panel's labels and buttons for the current frame.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext<'_>,
) -> ControlPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 2.0, 2.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(60, 72, 60, 255))
        .color_hovered(Color::from_rgba(84, 100, 84, 255))
        .color_clicked(Color::from_rgba(48, 56, 48, 255))
        .color_selected(Color::from_rgba(60, 72, 60, 255))
        .color_selected_hovered(Color::from_rgba(84, 100, 84, 255))
        .color_inactive(Color::from_rgba(48, 56, 48, 200))
        .margin(RectOffset::new(0.0, 0.0, 6.0, 6.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut result = ControlPanelUiResult::default();
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        for line in &context.view.lines {
            ui.label(None, line);
        }
        ui.separator();
        for line in context.view.rule_description.lines() {
            ui.label(None, line);
        }
        ui.separator();

        let parameters = context.view.parameters;
        result.sliders = SliderEdits {
            angle: slider(ui, hash!("angle"), "Angle", ANGLE_RANGE, parameters.angle),
            branch_length: slider(
                ui,
                hash!("branch_length"),
                "Branch length",
                BRANCH_LENGTH_RANGE,
                parameters.branch_length,
            ),
            branch_width: slider(
                ui,
                hash!("branch_width"),
                "Branch width",
                BRANCH_WIDTH_RANGE,
                parameters.branch_width,
            ),
            leaf_length: slider(
                ui,
                hash!("leaf_length"),
                "Leaf length",
                LEAF_LENGTH_RANGE,
                parameters.leaf_length,
            ),
            leaf_start_width: slider(
                ui,
                hash!("leaf_start_width"),
                "Leaf start",
                LEAF_WIDTH_RANGE,
                parameters.leaf_start_width,
            ),
            leaf_end_width: slider(
                ui,
                hash!("leaf_end_width"),
                "Leaf end",
                LEAF_WIDTH_RANGE,
                parameters.leaf_end_width,
            ),
            // Variance only applies in random mode.
            angle_variance: if parameters.random_mode {
                slider(
                    ui,
                    hash!("angle_variance"),
                    "Variance",
                    SliderRange::new(
                        *ANGLE_VARIANCE_RANGE.start() as f32,
                        *ANGLE_VARIANCE_RANGE.end() as f32,
                    ),
                    parameters.angle_variance as f32,
                )
                .map(|degrees| degrees.round() as i32)
            } else {
                None
            },
        };
        ui.separator();

        result.regenerate_pressed = ui.button(None, "Regenerate (R)");
        result.growth_pressed = ui.button(None, "Observe growth (G)");
        result.random_pressed = ui.button(None, "Random mode (M)");
        result.leaf_color_pressed = ui.button(None, "Random leaf colour (L)");
    });

    ui.pop_skin();

    result
}

/// Draws one slider and returns its value when the user moved it.
fn slider(ui: &mut Ui, id: Id, label: &str, range: SliderRange, current: f32) -> Option<f32> {
    let mut value = current;
    ui.slider(id, label, range.min()..range.max(), &mut value);
    ((value - current).abs() > f32::EPSILON).then_some(value)
}
