use eframe::egui;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use voxview::render::colormap::{ControlPoint, PRESET_NAMES};
use voxview::render::shaders;
use voxview::VolumeRenderer;

/// Native viewer host around the rendering engine.
///
/// The engine lives behind a mutex: the UI thread mutates camera and render
/// settings, and the GL paint callback locks it to run the frame. Loading
/// happens here with no GL context current, which is exactly what the
/// engine's deferred resource setup is for.
pub struct App {
    engine: Arc<Mutex<VolumeRenderer>>,
    shaders_dir: PathBuf,
    path_input: String,
    tf_path_input: String,
    status: Option<String>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_volume: Option<PathBuf>) -> Self {
        cc.egui_ctx.set_pixels_per_point(1.25);
        let mut app = Self {
            engine: Arc::new(Mutex::new(VolumeRenderer::new())),
            shaders_dir: shaders::default_shader_dir(),
            path_input: String::new(),
            tf_path_input: String::new(),
            status: None,
        };
        if let Some(path) = initial_volume {
            app.path_input = path.display().to_string();
            app.load_requested_volume();
        }
        app
    }

    fn load_requested_volume(&mut self) {
        let path = PathBuf::from(self.path_input.trim());
        let loaded = self
            .engine
            .lock()
            .map(|mut engine| engine.load_volume(&path))
            .unwrap_or(false);
        self.status = Some(if loaded {
            format!("Loaded {}", path.display())
        } else {
            format!("Failed to load {} (see log)", path.display())
        });
    }

    fn load_transfer_function(&mut self) {
        let path = PathBuf::from(self.tf_path_input.trim());
        let result = std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|text| {
                serde_json::from_str::<Vec<ControlPoint>>(&text).map_err(|err| err.to_string())
            });
        match result {
            Ok(points) => {
                if let Ok(mut engine) = self.engine.lock() {
                    engine.set_transfer_function_points(points);
                    engine.set_colormap_custom_mode(true);
                }
                self.status = Some(format!("Transfer function from {}", path.display()));
            }
            Err(err) => {
                self.status = Some(format!("Transfer function load failed: {err}"));
            }
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("voxview");
        ui.separator();

        ui.label("Volume path (.nii, .nii.gz, .vtk or DICOM directory):");
        ui.text_edit_singleline(&mut self.path_input);
        if ui.button("Load").clicked() {
            self.load_requested_volume();
        }
        if let Some(status) = &self.status {
            ui.label(status.clone());
        }
        ui.separator();

        let Ok(mut engine) = self.engine.lock() else {
            return;
        };

        if engine.is_volume_loaded() {
            let spacing = engine.spacing();
            ui.label(format!(
                "Dimensions: {}x{}x{}",
                engine.volume_width(),
                engine.volume_height(),
                engine.volume_depth()
            ));
            ui.label(format!(
                "Spacing: {:.3} / {:.3} / {:.3} mm",
                spacing[0], spacing[1], spacing[2]
            ));
        } else {
            ui.label("No volume loaded");
        }
        ui.separator();

        // Colormap
        ui.label("Colormap:");
        let mut preset = engine.colormap_preset();
        egui::ComboBox::from_id_salt("preset")
            .selected_text(PRESET_NAMES[preset as usize])
            .show_ui(ui, |ui| {
                for (index, name) in PRESET_NAMES.iter().enumerate() {
                    ui.selectable_value(&mut preset, index as i32, *name);
                }
            });
        if preset != engine.colormap_preset() {
            engine.set_colormap_preset(preset);
            engine.set_colormap_custom_mode(false);
        }

        ui.label("Custom transfer function (JSON):");
        ui.text_edit_singleline(&mut self.tf_path_input);
        let load_tf = ui.button("Load transfer function").clicked();
        ui.separator();

        // Bounding box
        let mut show_bbox = engine.show_bounding_box();
        if ui.checkbox(&mut show_bbox, "Show bounding box").changed() {
            engine.set_show_bounding_box(show_bbox);
        }
        let mut scale = engine.bounding_box_scale();
        if ui
            .add(egui::Slider::new(&mut scale, 0.1..=5.0).text("box scale"))
            .changed()
        {
            engine.set_bounding_box_scale(scale);
        }

        let mut background = engine.background_color();
        if ui.color_edit_button_rgb(&mut background).changed() {
            engine.set_background_color(background[0], background[1], background[2]);
        }
        ui.separator();

        // Slicing
        let mut slice_mode = engine.slice_mode();
        if ui.checkbox(&mut slice_mode, "Slice mode").changed() {
            engine.set_slice_mode(slice_mode);
        }
        if slice_mode {
            let mut axis = engine.slice_axis() as i32;
            ui.horizontal(|ui| {
                ui.selectable_value(&mut axis, 0, "Z");
                ui.selectable_value(&mut axis, 1, "Y");
                ui.selectable_value(&mut axis, 2, "X");
            });
            engine.set_slice_axis(axis);

            let extent = engine.volume().axis_extent(engine.slice_axis()).max(1);
            let mut index = engine.effective_slice_index();
            if ui
                .add(egui::Slider::new(&mut index, 0..=extent - 1).text("slice"))
                .changed()
            {
                engine.set_slice_index(index as i32);
            }
        }
        ui.separator();

        // Fields (structured-grid sources)
        if engine.field_count() > 1 {
            ui.label("Field:");
            let mut field = engine.current_field_index();
            let names: Vec<String> = engine
                .volume()
                .fields
                .iter()
                .map(|f| f.name.clone())
                .collect();
            egui::ComboBox::from_id_salt("field")
                .selected_text(names[field].clone())
                .show_ui(ui, |ui| {
                    for (index, name) in names.iter().enumerate() {
                        ui.selectable_value(&mut field, index, name);
                    }
                });
            if field != engine.current_field_index() {
                engine.set_current_field_index(field);
            }
            ui.separator();
        }

        if ui.button("Frame camera to volume").clicked() {
            engine.frame_camera_to_box();
        }

        drop(engine);
        if load_tf {
            self.load_transfer_function();
        }
    }

    fn render_viewport(&mut self, ui: &mut egui::Ui) {
        let available_size = ui.available_size();
        let (rect, response) =
            ui.allocate_exact_size(available_size, egui::Sense::click_and_drag());

        if let Ok(mut engine) = self.engine.lock() {
            if response.dragged() {
                let delta = response.drag_delta();
                // Degrees per pixel of drag.
                engine.camera_rotate(delta.x * 0.4, delta.y * 0.4);
            }
            let scroll_delta = ui.input(|i| i.raw_scroll_delta.y);
            if scroll_delta != 0.0 {
                let radius = engine.camera().radius().max(1.0);
                engine.camera_zoom(scroll_delta * 0.01 * radius);
            }
            if rect.height() > 0.0 {
                engine.set_aspect_ratio(rect.width() / rect.height());
            }
        }

        let engine = self.engine.clone();
        let shaders_dir = self.shaders_dir.clone();
        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                if let Ok(mut engine) = engine.lock() {
                    if !engine.is_initialized() {
                        engine.init(painter.gl(), &shaders_dir);
                    }
                    engine.render(painter.gl());
                }
            })),
        };
        ui.painter().add(callback);

        ui.ctx().request_repaint();
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        let fps = 1.0 / ui.ctx().input(|i| i.stable_dt).max(0.001);
        ui.label(format!("{fps:.0} fps"));
        ui.label("voxview v0.1.0");
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::right("sidebar")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                self.render_sidebar(ui);
                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    self.render_footer(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_viewport(ui);
        });
    }

    fn on_exit(&mut self, gl: Option<&eframe::glow::Context>) {
        if let (Some(gl), Ok(mut engine)) = (gl, self.engine.lock()) {
            engine.destroy(gl);
        }
    }
}
