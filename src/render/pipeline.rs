use glam::{Mat4, Vec3};
use glow::HasContext;
use std::path::Path;

use crate::render::camera::Camera;
use crate::render::colormap::{ControlPoint, TransferFunction, LUT_SIZE};
use crate::render::geometry;
use crate::render::shaders::{self, ShaderCatalog};
use crate::volume::buffer::{FieldData, VolumeBuffer};
use crate::volume::loader;

/// Marching step floor, preventing runaway iteration on degenerate boxes.
const MIN_STEP: f32 = 0.001;

/// Target number of samples across the volume's diagonal.
const STEP_TARGET_SAMPLES: f32 = 256.0;

/// Per-frame render settings mutated by the interaction surface.
struct RenderSettings {
    background: [f32; 3],
    show_bounding_box: bool,
    bbox_scale: f32,
    slice_mode: bool,
    /// 0 = Z, 1 = Y, 2 = X
    slice_axis: u8,
    slice_index: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            background: [0.1, 0.1, 0.2],
            show_bounding_box: true,
            bbox_scale: 1.0,
            slice_mode: false,
            slice_axis: 0,
            slice_index: 0,
        }
    }
}

/// Volume renderer and compositor.
///
/// Owns the loaded volume, camera, transfer function and every GPU resource.
/// GPU resources are never built eagerly: loading happens with no guaranteed
/// rendering context, so construction is deferred behind a needs-setup flag
/// checked at the start of each `render` call. Callers must make the GL
/// context current before `init`, `render` or `resize`, and must not call
/// `render` concurrently with `load_volume`.
pub struct VolumeRenderer {
    volume: VolumeBuffer,
    current_field: usize,
    camera: Camera,
    transfer: TransferFunction,
    settings: RenderSettings,

    needs_setup: bool,
    frame_camera_next: bool,
    initialized: bool,
    slice_compile_attempted: bool,
    catalog: Option<ShaderCatalog>,

    volume_texture: Option<glow::Texture>,
    lut_texture: Option<glow::Texture>,
    volume_program: Option<glow::Program>,
    slice_program: Option<glow::Program>,
    bbox_program: Option<glow::Program>,
    quad_vao: Option<glow::VertexArray>,
    quad_vbo: Option<glow::Buffer>,
    bbox_vao: Option<glow::VertexArray>,
    bbox_vbo: Option<glow::Buffer>,
    slice_vao: Option<glow::VertexArray>,
    slice_vbo: Option<glow::Buffer>,
}

impl Default for VolumeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeRenderer {
    pub fn new() -> Self {
        Self {
            volume: VolumeBuffer::default(),
            current_field: 0,
            camera: Camera::default(),
            transfer: TransferFunction::default(),
            settings: RenderSettings::default(),
            needs_setup: false,
            frame_camera_next: false,
            initialized: false,
            slice_compile_attempted: false,
            catalog: None,
            volume_texture: None,
            lut_texture: None,
            volume_program: None,
            slice_program: None,
            bbox_program: None,
            quad_vao: None,
            quad_vbo: None,
            bbox_vao: None,
            bbox_vbo: None,
            slice_vao: None,
            slice_vbo: None,
        }
    }

    // ----- volume control -----

    /// Loads a DICOM series directory, a NIfTI file or a legacy VTK file.
    /// On failure the buffer stays cleared and camera/render state is
    /// untouched; details go to the log.
    pub fn load_volume(&mut self, path: &Path) -> bool {
        self.volume.clear();
        self.current_field = 0;
        match loader::load_volume(path) {
            Ok(volume) => {
                log::info!(
                    "loaded volume {}x{}x{}, {} field(s), from {}",
                    volume.width,
                    volume.height,
                    volume.depth,
                    volume.field_count(),
                    path.display()
                );
                self.volume = volume;
                self.needs_setup = true;
                self.frame_camera_next = true;
                true
            }
            Err(err) => {
                log::error!("failed to load {}: {err}", path.display());
                false
            }
        }
    }

    /// Adopts an already-decoded volume, e.g. from an external loader.
    pub fn set_volume(&mut self, volume: VolumeBuffer) {
        self.volume = volume;
        self.current_field = 0;
        self.needs_setup = true;
        self.frame_camera_next = true;
    }

    pub fn is_volume_loaded(&self) -> bool {
        !self.volume.is_empty()
    }

    pub fn volume(&self) -> &VolumeBuffer {
        &self.volume
    }

    pub fn volume_width(&self) -> u32 {
        self.volume.width
    }

    pub fn volume_height(&self) -> u32 {
        self.volume.height
    }

    pub fn volume_depth(&self) -> u32 {
        self.volume.depth
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.volume.spacing
    }

    // ----- field selection (structured-grid sources) -----

    pub fn field_count(&self) -> usize {
        self.volume.field_count()
    }

    pub fn current_field_index(&self) -> usize {
        self.current_field
    }

    pub fn set_current_field_index(&mut self, index: usize) {
        if self.volume.fields.is_empty() {
            return;
        }
        self.current_field = index.min(self.volume.fields.len() - 1);
        self.needs_setup = true;
    }

    // ----- camera control -----

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_rotate(&mut self, dx: f32, dy: f32) {
        self.camera.rotate(dx, dy);
    }

    pub fn camera_zoom(&mut self, delta: f32) {
        self.camera.zoom(delta);
    }

    pub fn set_camera_angles(&mut self, azimuth_deg: f32, elevation_deg: f32) {
        self.camera.set_angles(azimuth_deg, elevation_deg);
    }

    pub fn frame_camera_to_box(&mut self) {
        if !self.is_volume_loaded() {
            return;
        }
        let size = self.volume.physical_size();
        self.camera.frame_box(size.x, size.y, size.z);
    }

    // ----- appearance -----

    pub fn set_background_color(&mut self, r: f32, g: f32, b: f32) {
        self.settings.background = [r, g, b];
    }

    pub fn background_color(&self) -> [f32; 3] {
        self.settings.background
    }

    pub fn set_show_bounding_box(&mut self, show: bool) {
        self.settings.show_bounding_box = show;
    }

    pub fn show_bounding_box(&self) -> bool {
        self.settings.show_bounding_box
    }

    pub fn set_bounding_box_scale(&mut self, scale: f32) {
        self.settings.bbox_scale = scale.clamp(0.1, 5.0);
        self.needs_setup = true;
    }

    pub fn bounding_box_scale(&self) -> f32 {
        self.settings.bbox_scale
    }

    pub fn set_colormap_preset(&mut self, index: i32) {
        self.transfer.set_preset(index);
        self.needs_setup = true;
    }

    pub fn colormap_preset(&self) -> i32 {
        self.transfer.preset()
    }

    pub fn set_colormap_custom_mode(&mut self, enabled: bool) {
        self.transfer.set_custom_mode(enabled);
        self.needs_setup = true;
    }

    pub fn set_transfer_function_points(&mut self, points: Vec<ControlPoint>) {
        self.transfer.set_control_points(points);
        self.needs_setup = true;
    }

    // ----- slicing -----

    pub fn set_slice_mode(&mut self, enabled: bool) {
        self.settings.slice_mode = enabled;
    }

    pub fn slice_mode(&self) -> bool {
        self.settings.slice_mode
    }

    pub fn set_slice_axis(&mut self, axis: i32) {
        self.settings.slice_axis = axis.clamp(0, 2) as u8;
    }

    pub fn slice_axis(&self) -> u8 {
        self.settings.slice_axis
    }

    pub fn set_slice_index(&mut self, index: i32) {
        self.settings.slice_index = index.max(0) as u32;
    }

    /// Requested slice index clamped to the active axis's voxel extent.
    pub fn effective_slice_index(&self) -> u32 {
        let extent = self.volume.axis_extent(self.settings.slice_axis).max(1);
        self.settings.slice_index.min(extent - 1)
    }

    // ----- lifecycle -----

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// One-time setup: reads the shader catalog and compiles the bounding-box
    /// program. Requires a current GL context.
    pub fn init(&mut self, gl: &glow::Context, shaders_dir: &Path) {
        match ShaderCatalog::load(shaders_dir) {
            Ok(catalog) => {
                self.bbox_program =
                    shaders::link_program(gl, "bbox", &catalog.bbox_vert, &catalog.bbox_frag);
                self.catalog = Some(catalog);
            }
            Err(err) => {
                log::error!(
                    "cannot read shaders from {}: {err}",
                    shaders_dir.display()
                );
            }
        }
        unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.disable(glow::CULL_FACE);
        }
        self.initialized = true;
    }

    pub fn resize(&mut self, gl: &glow::Context, width: i32, height: i32) {
        unsafe {
            gl.viewport(0, 0, width, height);
        }
        if height > 0 {
            self.camera.set_aspect_ratio(width as f32 / height as f32);
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.camera.set_aspect_ratio(aspect);
    }

    /// Renders one frame. Clears to the background color; with no volume
    /// loaded that is all a frame does.
    pub fn render(&mut self, gl: &glow::Context) {
        let [r, g, b] = self.settings.background;
        unsafe {
            gl.clear_color(r, g, b, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        if !self.is_volume_loaded() {
            return;
        }

        if self.needs_setup {
            self.setup_resources(gl);
            self.needs_setup = false;
        }
        if self.frame_camera_next {
            self.frame_camera_to_box();
            self.frame_camera_next = false;
        }

        if self.settings.slice_mode {
            self.slice_pass(gl);
        } else {
            self.volume_pass(gl);
        }

        // Box overlay goes last, depth test off, so ray-marched content
        // never occludes it.
        if self.settings.show_bounding_box {
            self.bbox_pass(gl);
        }
    }

    /// Frees every GPU resource. Requires a current GL context.
    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            for program in [
                self.volume_program.take(),
                self.slice_program.take(),
                self.bbox_program.take(),
            ]
            .into_iter()
            .flatten()
            {
                gl.delete_program(program);
            }
            for texture in [self.volume_texture.take(), self.lut_texture.take()]
                .into_iter()
                .flatten()
            {
                gl.delete_texture(texture);
            }
            for vao in [self.quad_vao.take(), self.bbox_vao.take(), self.slice_vao.take()]
                .into_iter()
                .flatten()
            {
                gl.delete_vertex_array(vao);
            }
            for vbo in [self.quad_vbo.take(), self.bbox_vbo.take(), self.slice_vbo.take()]
                .into_iter()
                .flatten()
            {
                gl.delete_buffer(vbo);
            }
        }
        self.initialized = false;
        self.slice_compile_attempted = false;
    }

    // ----- resource setup -----

    /// Idempotent rebuild of everything the needs-setup flag covers. Texture
    /// and geometry have no interdependency; programs compile once and cache.
    fn setup_resources(&mut self, gl: &glow::Context) {
        self.upload_volume_texture(gl);
        self.upload_lut_texture(gl);
        self.setup_fullscreen_quad(gl);
        self.setup_bounding_box(gl);
        if self.volume_program.is_none() {
            if let Some(catalog) = &self.catalog {
                self.volume_program = shaders::link_program(
                    gl,
                    "volume",
                    &catalog.volume_vert,
                    &catalog.volume_frag,
                );
            }
        }
    }

    /// Uploads the active field as a 3D texture in its native numeric width,
    /// with a RED-to-grayscale swizzle so a scalar read is visualizable
    /// without a LUT. No-op when nothing is loaded.
    fn upload_volume_texture(&mut self, gl: &glow::Context) {
        let Some(field) = self.volume.field(self.current_field) else {
            return;
        };
        let (w, h, d) = (
            self.volume.width as i32,
            self.volume.height as i32,
            self.volume.depth as i32,
        );
        unsafe {
            let texture = match self.volume_texture {
                Some(texture) => texture,
                None => {
                    let texture = gl.create_texture().unwrap();
                    self.volume_texture = Some(texture);
                    texture
                }
            };
            gl.bind_texture(glow::TEXTURE_3D, Some(texture));
            gl.tex_parameter_i32(
                glow::TEXTURE_3D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_3D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_3D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_3D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_3D,
                glow::TEXTURE_WRAP_R,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            match &field.data {
                FieldData::U16(data) => {
                    gl.tex_image_3d(
                        glow::TEXTURE_3D,
                        0,
                        glow::R16 as i32,
                        w,
                        h,
                        d,
                        0,
                        glow::RED,
                        glow::UNSIGNED_SHORT,
                        Some(bytemuck::cast_slice(data)),
                    );
                }
                FieldData::F32(data) => {
                    gl.tex_image_3d(
                        glow::TEXTURE_3D,
                        0,
                        glow::R32F as i32,
                        w,
                        h,
                        d,
                        0,
                        glow::RED,
                        glow::FLOAT,
                        Some(bytemuck::cast_slice(data)),
                    );
                }
            }

            gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_SWIZZLE_R, glow::RED as i32);
            gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_SWIZZLE_G, glow::RED as i32);
            gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_SWIZZLE_B, glow::RED as i32);
            gl.tex_parameter_i32(glow::TEXTURE_3D, glow::TEXTURE_SWIZZLE_A, glow::ONE as i32);
            gl.bind_texture(glow::TEXTURE_3D, None);
        }
    }

    fn upload_lut_texture(&mut self, gl: &glow::Context) {
        let lut = self.transfer.build_lut();
        unsafe {
            let texture = match self.lut_texture {
                Some(texture) => texture,
                None => {
                    let texture = gl.create_texture().unwrap();
                    self.lut_texture = Some(texture);
                    texture
                }
            };
            gl.bind_texture(glow::TEXTURE_1D, Some(texture));
            gl.tex_parameter_i32(
                glow::TEXTURE_1D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_1D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_1D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_1d(
                glow::TEXTURE_1D,
                0,
                glow::RGBA8 as i32,
                LUT_SIZE as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(lut.as_slice()),
            );
            gl.bind_texture(glow::TEXTURE_1D, None);
        }
    }

    fn setup_fullscreen_quad(&mut self, gl: &glow::Context) {
        if self.quad_vao.is_some() {
            return;
        }
        let quad = geometry::fullscreen_quad();
        unsafe {
            let vao = gl.create_vertex_array().unwrap();
            let vbo = gl.create_buffer().unwrap();
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&quad),
                glow::STATIC_DRAW,
            );
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 2 * 4, 0);
            gl.enable_vertex_attrib_array(0);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);
            self.quad_vao = Some(vao);
            self.quad_vbo = Some(vbo);
        }
    }

    fn setup_bounding_box(&mut self, gl: &glow::Context) {
        let size = self.volume.physical_size();
        let vertices =
            geometry::bounding_box_lines(size.x, size.y, size.z, self.settings.bbox_scale);
        unsafe {
            let vao = match self.bbox_vao {
                Some(vao) => vao,
                None => {
                    let vao = gl.create_vertex_array().unwrap();
                    self.bbox_vao = Some(vao);
                    vao
                }
            };
            let vbo = match self.bbox_vbo {
                Some(vbo) => vbo,
                None => {
                    let vbo = gl.create_buffer().unwrap();
                    self.bbox_vbo = Some(vbo);
                    vbo
                }
            };
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&vertices),
                glow::STATIC_DRAW,
            );
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 6 * 4, 0);
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, 6 * 4, 3 * 4);
            gl.enable_vertex_attrib_array(1);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);
        }
    }

    // ----- render passes -----

    /// Physical box extents of the sampled volume, centered at the origin.
    /// Always the true physical extent, unscaled by the bbox display scale.
    fn physical_box(&self) -> (Vec3, Vec3) {
        let size = self.volume.physical_size();
        (-0.5 * size, 0.5 * size)
    }

    fn volume_pass(&mut self, gl: &glow::Context) {
        let (Some(program), Some(texture), Some(vao)) =
            (self.volume_program, self.volume_texture, self.quad_vao)
        else {
            return;
        };

        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        let view_proj = projection * view;
        let inv_view_proj = view_proj.inverse();
        // Camera world position is the translation column of the inverse view.
        let cam_pos = view.inverse().w_axis.truncate();

        let (box_min, box_max) = self.physical_box();
        let step = march_step(box_max - box_min);

        unsafe {
            gl.use_program(Some(program));

            let loc = gl.get_uniform_location(program, "uInvViewProj");
            gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &inv_view_proj.to_cols_array());
            let loc = gl.get_uniform_location(program, "uCamPos");
            gl.uniform_3_f32(loc.as_ref(), cam_pos.x, cam_pos.y, cam_pos.z);
            let loc = gl.get_uniform_location(program, "uBoxMin");
            gl.uniform_3_f32(loc.as_ref(), box_min.x, box_min.y, box_min.z);
            let loc = gl.get_uniform_location(program, "uBoxMax");
            gl.uniform_3_f32(loc.as_ref(), box_max.x, box_max.y, box_max.z);
            let loc = gl.get_uniform_location(program, "uStep");
            gl.uniform_1_f32(loc.as_ref(), step);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_3D, Some(texture));
            let loc = gl.get_uniform_location(program, "uVolume");
            gl.uniform_1_i32(loc.as_ref(), 0);

            if let Some(lut) = self.lut_texture {
                gl.active_texture(glow::TEXTURE1);
                gl.bind_texture(glow::TEXTURE_1D, Some(lut));
                let loc = gl.get_uniform_location(program, "uLUT");
                gl.uniform_1_i32(loc.as_ref(), 1);
            }

            // Every pixel is a candidate ray: depth test off for the quad,
            // restored afterward for the box overlay pass.
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.disable(glow::DEPTH_TEST);
            gl.bind_vertex_array(Some(vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 6);
            gl.bind_vertex_array(None);
            gl.enable(glow::DEPTH_TEST);
            gl.disable(glow::BLEND);
            gl.use_program(None);
        }
    }

    fn slice_pass(&mut self, gl: &glow::Context) {
        let Some(texture) = self.volume_texture else {
            return;
        };

        // The slice shader compiles lazily on the first slice-mode frame.
        if self.slice_program.is_none() && !self.slice_compile_attempted {
            self.slice_compile_attempted = true;
            if let Some(catalog) = &self.catalog {
                self.slice_program =
                    shaders::link_program(gl, "slice", &catalog.slice_vert, &catalog.slice_frag);
            }
        }
        let Some(program) = self.slice_program else {
            return;
        };

        let (box_min, box_max) = self.physical_box();
        let index = self.effective_slice_index();
        let quad = geometry::slice_quad(
            self.settings.slice_axis,
            index,
            box_min,
            box_max,
            [self.volume.width, self.volume.height, self.volume.depth],
        );

        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();

        unsafe {
            let vao = match self.slice_vao {
                Some(vao) => vao,
                None => {
                    let vao = gl.create_vertex_array().unwrap();
                    self.slice_vao = Some(vao);
                    vao
                }
            };
            let vbo = match self.slice_vbo {
                Some(vbo) => vbo,
                None => {
                    let vbo = gl.create_buffer().unwrap();
                    self.slice_vbo = Some(vbo);
                    vbo
                }
            };
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&quad),
                glow::DYNAMIC_DRAW,
            );
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 3 * 4, 0);
            gl.enable_vertex_attrib_array(0);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            gl.use_program(Some(program));
            let loc = gl.get_uniform_location(program, "model");
            gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &Mat4::IDENTITY.to_cols_array());
            let loc = gl.get_uniform_location(program, "view");
            gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &view.to_cols_array());
            let loc = gl.get_uniform_location(program, "projection");
            gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &projection.to_cols_array());
            let loc = gl.get_uniform_location(program, "uBoxMin");
            gl.uniform_3_f32(loc.as_ref(), box_min.x, box_min.y, box_min.z);
            let loc = gl.get_uniform_location(program, "uBoxMax");
            gl.uniform_3_f32(loc.as_ref(), box_max.x, box_max.y, box_max.z);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_3D, Some(texture));
            let loc = gl.get_uniform_location(program, "uVolume");
            gl.uniform_1_i32(loc.as_ref(), 0);

            if let Some(lut) = self.lut_texture {
                gl.active_texture(glow::TEXTURE1);
                gl.bind_texture(glow::TEXTURE_1D, Some(lut));
                let loc = gl.get_uniform_location(program, "uLUT");
                gl.uniform_1_i32(loc.as_ref(), 1);
            }

            // The quad may be viewed from either side.
            gl.disable(glow::CULL_FACE);
            gl.bind_vertex_array(Some(vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 6);
            gl.bind_vertex_array(None);
            gl.use_program(None);
        }
    }

    fn bbox_pass(&mut self, gl: &glow::Context) {
        let (Some(program), Some(vao)) = (self.bbox_program, self.bbox_vao) else {
            return;
        };
        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        unsafe {
            gl.disable(glow::DEPTH_TEST);
            gl.use_program(Some(program));
            let loc = gl.get_uniform_location(program, "model");
            gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &Mat4::IDENTITY.to_cols_array());
            let loc = gl.get_uniform_location(program, "view");
            gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &view.to_cols_array());
            let loc = gl.get_uniform_location(program, "projection");
            gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &projection.to_cols_array());
            gl.bind_vertex_array(Some(vao));
            gl.draw_arrays(glow::LINES, 0, 24);
            gl.bind_vertex_array(None);
            gl.use_program(None);
            gl.enable(glow::DEPTH_TEST);
        }
    }
}

/// Marching step size targeting `STEP_TARGET_SAMPLES` samples across the
/// volume's diagonal, floored at `MIN_STEP`.
fn march_step(box_size: Vec3) -> f32 {
    (box_size.length() / STEP_TARGET_SAMPLES).max(MIN_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::buffer;

    fn renderer_with_volume(w: u32, h: u32, d: u32, spacing: [f64; 3]) -> VolumeRenderer {
        let mut renderer = VolumeRenderer::new();
        renderer.set_volume(buffer::from_u16_samples(
            w,
            h,
            d,
            spacing,
            vec![0; (w * h * d) as usize],
        ));
        renderer
    }

    #[test]
    fn new_renderer_has_no_volume() {
        let renderer = VolumeRenderer::new();
        assert!(!renderer.is_volume_loaded());
        assert_eq!(renderer.volume_width(), 0);
    }

    #[test]
    fn load_failure_reports_false_and_stays_cleared() {
        let mut renderer = VolumeRenderer::new();
        assert!(!renderer.load_volume(Path::new("/no/such/volume.nii")));
        assert!(!renderer.is_volume_loaded());
    }

    #[test]
    fn set_volume_arms_deferred_setup_and_framing() {
        let renderer = renderer_with_volume(8, 8, 8, [1.0; 3]);
        assert!(renderer.needs_setup);
        assert!(renderer.frame_camera_next);
    }

    #[test]
    fn preset_and_scale_clamp_silently() {
        let mut renderer = VolumeRenderer::new();
        renderer.set_colormap_preset(29);
        assert_eq!(renderer.colormap_preset(), 9);
        renderer.set_colormap_preset(-3);
        assert_eq!(renderer.colormap_preset(), 0);

        renderer.set_bounding_box_scale(99.0);
        assert_eq!(renderer.bounding_box_scale(), 5.0);
        renderer.set_bounding_box_scale(0.0);
        assert_eq!(renderer.bounding_box_scale(), 0.1);
    }

    #[test]
    fn slice_axis_and_index_clamp_to_volume_extents() {
        let mut renderer = renderer_with_volume(30, 100, 50, [1.0; 3]);
        renderer.set_slice_axis(7);
        assert_eq!(renderer.slice_axis(), 2);
        renderer.set_slice_axis(-1);
        assert_eq!(renderer.slice_axis(), 0);

        // Y axis, height 100: any input lands in [0, 99].
        renderer.set_slice_axis(1);
        renderer.set_slice_index(150);
        assert_eq!(renderer.effective_slice_index(), 99);
        renderer.set_slice_index(-20);
        assert_eq!(renderer.effective_slice_index(), 0);
    }

    #[test]
    fn slice_index_clamps_against_depth_on_z_axis() {
        let mut renderer = renderer_with_volume(64, 64, 32, [1.0; 3]);
        renderer.set_slice_axis(0);
        for input in [-5, 0, 31, 32, 1_000_000] {
            renderer.set_slice_index(input);
            let effective = renderer.effective_slice_index();
            assert!(effective < 32);
        }
    }

    #[test]
    fn framing_uses_physical_extents() {
        let mut renderer = renderer_with_volume(64, 64, 32, [1.0, 1.0, 2.0]);
        renderer.frame_camera_to_box();
        let r = 0.5 * f32::sqrt(64.0 * 64.0 * 3.0);
        let expected = 1.2 * (r / (22.5f32.to_radians()).sin());
        assert!((renderer.camera().radius() - expected).abs() < 1e-3);
    }

    #[test]
    fn field_selection_clamps_and_rearms_setup() {
        let mut renderer = renderer_with_volume(4, 4, 4, [1.0; 3]);
        renderer.needs_setup = false;
        renderer.set_current_field_index(10);
        assert_eq!(renderer.current_field_index(), 0);
        assert!(renderer.needs_setup);
    }

    #[test]
    fn march_step_tracks_diagonal_with_floor() {
        let step = march_step(Vec3::new(64.0, 64.0, 64.0));
        let diag = f32::sqrt(3.0 * 64.0 * 64.0);
        assert!((step - diag / 256.0).abs() < 1e-5);
        assert_eq!(march_step(Vec3::ZERO), MIN_STEP);
    }
}
