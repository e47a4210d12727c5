use glow::HasContext;
use std::io;
use std::path::{Path, PathBuf};

/// Shader source text for every pass, read once from the shader directory at
/// `init()` time and treated as a static configuration asset.
pub struct ShaderCatalog {
    pub volume_vert: String,
    pub volume_frag: String,
    pub slice_vert: String,
    pub slice_frag: String,
    pub bbox_vert: String,
    pub bbox_frag: String,
}

impl ShaderCatalog {
    pub fn load(dir: &Path) -> io::Result<Self> {
        let read = |name: &str| std::fs::read_to_string(dir.join(name));
        Ok(Self {
            volume_vert: read("volume.vert")?,
            volume_frag: read("volume.frag")?,
            slice_vert: read("slice.vert")?,
            slice_frag: read("slice.frag")?,
            bbox_vert: read("bbox.vert")?,
            bbox_frag: read("bbox.frag")?,
        })
    }
}

/// Shader directory override via `VOXVIEW_SHADERS_DIR`, defaulting to the
/// `shaders` directory next to the working directory.
pub fn default_shader_dir() -> PathBuf {
    std::env::var_os("VOXVIEW_SHADERS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shaders"))
}

/// Compiles and links a program. Failures are logged with the driver's
/// diagnostics and yield `None`, so the pass that depends on the program
/// becomes a no-op instead of tearing down the frame.
pub fn link_program(
    gl: &glow::Context,
    label: &str,
    vert_src: &str,
    frag_src: &str,
) -> Option<glow::Program> {
    unsafe {
        let vert = compile_stage(gl, label, glow::VERTEX_SHADER, vert_src)?;
        let Some(frag) = compile_stage(gl, label, glow::FRAGMENT_SHADER, frag_src) else {
            gl.delete_shader(vert);
            return None;
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(err) => {
                log::error!("{label}: failed to create program object: {err}");
                gl.delete_shader(vert);
                gl.delete_shader(frag);
                return None;
            }
        };
        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);
        gl.delete_shader(vert);
        gl.delete_shader(frag);

        if !gl.get_program_link_status(program) {
            log::error!("{label}: link error: {}", gl.get_program_info_log(program));
            gl.delete_program(program);
            return None;
        }
        Some(program)
    }
}

fn compile_stage(
    gl: &glow::Context,
    label: &str,
    stage: u32,
    source: &str,
) -> Option<glow::Shader> {
    let stage_name = if stage == glow::VERTEX_SHADER {
        "vertex"
    } else {
        "fragment"
    };
    unsafe {
        let shader = match gl.create_shader(stage) {
            Ok(shader) => shader,
            Err(err) => {
                log::error!("{label}: failed to create {stage_name} shader: {err}");
                return None;
            }
        };
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            log::error!(
                "{label}: {stage_name} shader error: {}",
                gl.get_shader_info_log(shader)
            );
            gl.delete_shader(shader);
            return None;
        }
        Some(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_loads_from_repository_shader_dir() {
        let catalog = ShaderCatalog::load(Path::new("shaders")).expect("shader sources");
        for source in [
            &catalog.volume_vert,
            &catalog.volume_frag,
            &catalog.slice_vert,
            &catalog.slice_frag,
            &catalog.bbox_vert,
            &catalog.bbox_frag,
        ] {
            assert!(source.contains("void main"));
        }
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        assert!(ShaderCatalog::load(Path::new("no-such-shader-dir")).is_err());
    }
}
