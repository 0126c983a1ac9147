#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Arbor.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment, so
//! the crate depends on macroquad without its default `audio` feature.
//!
//! Trees are drawn as 3D lines under an orbiting camera framed around the
//! scene bounds. All UI-specific calls live inside the local `ui` module.

mod ui;

use self::ui::{draw_control_panel_ui, ControlPanelUiContext, ControlPanelUiResult};
use anyhow::Result;
use arbor_rendering::{
    Bounds, Color, FrameInput, Presentation, RenderingBackend, SliderEdits, TreeScene,
};
use glam::Vec3;
use macroquad::{
    camera::{set_camera, set_default_camera, Camera3D},
    input::{is_key_pressed, KeyCode},
    math::{vec2, vec3},
    models::draw_line_3d,
    ui::root_ui,
};
use std::{f32::consts::TAU, time::Duration};
use tracing::info;

const PANEL_WIDTH: f32 = 300.0;
const PANEL_BACKGROUND: Color = Color::new(0.08, 0.09, 0.08, 0.85);

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    regenerate_latched: bool,
    growth_latched: bool,
    random_latched: bool,
    leaf_color_latched: bool,
    slider_edits: SliderEdits,
}

impl ControlPanelInputState {
    /// Returns whether the UI requested a regeneration and clears the latch.
    pub fn take_regenerate(&mut self) -> bool {
        std::mem::take(&mut self.regenerate_latched)
    }

    /// Records that the regenerate button was pressed this frame.
    pub fn register_regenerate(&mut self) {
        self.regenerate_latched = true;
    }

    /// Returns whether the UI requested a growth-mode toggle and clears the latch.
    pub fn take_growth_toggle(&mut self) -> bool {
        std::mem::take(&mut self.growth_latched)
    }

    /// Records that the growth toggle button was pressed this frame.
    pub fn register_growth_toggle(&mut self) {
        self.growth_latched = true;
    }

    /// Returns whether the UI requested a random-mode toggle and clears the latch.
    pub fn take_random_toggle(&mut self) -> bool {
        std::mem::take(&mut self.random_latched)
    }

    /// Records that the random-mode button was pressed this frame.
    pub fn register_random_toggle(&mut self) {
        self.random_latched = true;
    }

    /// Returns whether the UI requested a leaf-colour toggle and clears the latch.
    pub fn take_leaf_color_toggle(&mut self) -> bool {
        std::mem::take(&mut self.leaf_color_latched)
    }

    /// Records that the leaf-colour button was pressed this frame.
    pub fn register_leaf_color_toggle(&mut self) {
        self.leaf_color_latched = true;
    }

    /// Returns the slider values changed since the last frame and clears them.
    pub fn take_slider_edits(&mut self) -> SliderEdits {
        std::mem::take(&mut self.slider_edits)
    }

    /// Records slider values changed this frame. Later values replace earlier ones.
    pub fn register_slider_edits(&mut self, edits: SliderEdits) {
        self.slider_edits = self.slider_edits.merge(edits);
    }

    fn register(&mut self, result: ControlPanelUiResult) {
        if result.regenerate_pressed {
            self.register_regenerate();
        }
        if result.growth_pressed {
            self.register_growth_toggle();
        }
        if result.random_pressed {
            self.register_random_toggle();
        }
        if result.leaf_color_pressed {
            self.register_leaf_color_toggle();
        }
        if !result.sliders.is_empty() {
            self.register_slider_edits(result.sliders);
        }
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit.
    quit_requested: bool,
    /// `R` regenerates the tree.
    regenerate: bool,
    /// `G` toggles growth observation.
    toggle_growth: bool,
    /// `M` toggles random mode.
    toggle_random: bool,
    /// `L` toggles random leaf colours.
    toggle_leaf_color: bool,
    /// Right arrow selects the next rule set.
    next_rule_set: bool,
    /// Left arrow selects the previous rule set.
    previous_rule_set: bool,
    /// Up arrow adds a rewrite pass.
    more_iterations: bool,
    /// Down arrow removes a rewrite pass.
    fewer_iterations: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            regenerate: is_key_pressed(KeyCode::R),
            toggle_growth: is_key_pressed(KeyCode::G),
            toggle_random: is_key_pressed(KeyCode::M),
            toggle_leaf_color: is_key_pressed(KeyCode::L),
            next_rule_set: is_key_pressed(KeyCode::Right),
            previous_rule_set: is_key_pressed(KeyCode::Left),
            more_iterations: is_key_pressed(KeyCode::Up),
            fewer_iterations: is_key_pressed(KeyCode::Down),
        }
    }
}

fn gather_frame_input(
    keyboard: KeyboardShortcuts,
    control_panel: &mut ControlPanelInputState,
) -> FrameInput {
    let regenerate = control_panel.take_regenerate();
    let toggle_growth = control_panel.take_growth_toggle();
    let toggle_random = control_panel.take_random_toggle();
    let toggle_leaf_color = control_panel.take_leaf_color_toggle();
    let sliders = control_panel.take_slider_edits();

    FrameInput {
        regenerate: regenerate || keyboard.regenerate,
        toggle_growth: toggle_growth || keyboard.toggle_growth,
        toggle_random: toggle_random || keyboard.toggle_random,
        toggle_leaf_color: toggle_leaf_color || keyboard.toggle_leaf_color,
        next_rule_set: keyboard.next_rule_set,
        previous_rule_set: keyboard.previous_rule_set,
        more_iterations: keyboard.more_iterations,
        fewer_iterations: keyboard.fewer_iterations,
        sliders,
    }
}

/// Camera circling the tree at a fixed angular speed.
#[derive(Clone, Copy, Debug, PartialEq)]
struct OrbitCamera {
    azimuth: f32,
    radians_per_second: f32,
}

impl OrbitCamera {
    const MIN_DISTANCE: f32 = 10.0;
    const ELEVATION: f32 = 0.35;

    fn new(radians_per_second: f32) -> Self {
        Self {
            azimuth: 0.0,
            radians_per_second,
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.azimuth = (self.azimuth + self.radians_per_second * dt.as_secs_f32()).rem_euclid(TAU);
    }

    /// Eye position and look-at target framing `bounds`.
    fn frame(&self, bounds: Option<Bounds>) -> (Vec3, Vec3) {
        let (target, radius) = bounds
            .map(|bounds| (bounds.center(), bounds.radius()))
            .unwrap_or((Vec3::ZERO, 0.0));
        let distance = (radius * 2.5).max(Self::MIN_DISTANCE);
        let horizontal = distance * Self::ELEVATION.cos();
        let eye = target
            + Vec3::new(
                horizontal * self.azimuth.cos(),
                distance * Self::ELEVATION.sin(),
                horizontal * self.azimuth.sin(),
            );
        (eye, target)
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    orbit_speed: f32,
    show_panel: bool,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            orbit_speed: 0.25,
            show_panel: true,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Sets the camera's orbit speed in radians per second. Zero keeps it still.
    #[must_use]
    pub fn with_orbit_speed(mut self, radians_per_second: f32) -> Self {
        self.orbit_speed = radians_per_second;
        self
    }

    /// Configures whether the parameter panel is drawn.
    #[must_use]
    pub fn with_panel(mut self, show: bool) -> Self {
        self.show_panel = show;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut TreeScene) + 'static,
    {
        let Self {
            swap_interval,
            orbit_speed,
            show_panel,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 900,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        info!("opening viewer window");
        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let mut camera = OrbitCamera::new(orbit_speed);
            let mut control_panel_input = ControlPanelInputState::default();
            let background = to_macroquad_color(clear_color);
            let panel_background = to_macroquad_color(PANEL_BACKGROUND);

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = gather_frame_input(keyboard, &mut control_panel_input);

                update_scene(frame_dt, frame_input, &mut scene);
                camera.advance(frame_dt);

                macroquad::window::clear_background(background);

                let (eye, target) = camera.frame(scene.bounds());
                set_camera(&Camera3D {
                    position: to_macroquad_vec3(eye),
                    target: to_macroquad_vec3(target),
                    up: vec3(0.0, 1.0, 0.0),
                    ..Camera3D::default()
                });
                draw_tree(&scene);
                set_default_camera();

                if show_panel {
                    if let Some(view) = scene.panel.as_ref() {
                        let screen_height = macroquad::window::screen_height();
                        let result = draw_control_panel_ui(
                            &mut root_ui(),
                            ControlPanelUiContext {
                                origin: vec2(0.0, 0.0),
                                size: vec2(PANEL_WIDTH, screen_height),
                                background: panel_background,
                                view,
                            },
                        );
                        control_panel_input.register(result);
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn draw_tree(scene: &TreeScene) {
    let branch_color = to_macroquad_color(scene.branch_color);
    for segment in &scene.segments {
        draw_line_3d(
            to_macroquad_vec3(segment.start),
            to_macroquad_vec3(segment.end),
            branch_color,
        );
    }

    for leaf in &scene.leaves {
        draw_line_3d(
            to_macroquad_vec3(leaf.anchor),
            to_macroquad_vec3(leaf.tip()),
            to_macroquad_color(scene.leaf_color_for(leaf)),
        );
    }
}

fn to_macroquad_vec3(value: Vec3) -> macroquad::math::Vec3 {
    vec3(value.x, value.y, value.z)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
