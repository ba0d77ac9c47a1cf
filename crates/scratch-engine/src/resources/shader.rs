use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::gfx::{GpuResult, GraphicsApi, UniformLocation};

/// Compiled vertex + fragment program with a per-name uniform location cache.
///
/// Writing a uniform the program does not expose is ignored after a one-time
/// warning, the same way a `-1` location is ignored by GL.
pub struct Shader<A: GraphicsApi> {
    program: A::Program,
    label: String,
    locations: RefCell<HashMap<String, Option<UniformLocation>>>,
}

impl<A: GraphicsApi> Shader<A> {
    /// Reads a combined shader file and compiles it.
    pub fn from_file(api: &mut A, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader {}", path.display()))?;
        let shader = Self::from_source(api, &path.display().to_string(), &source)?;
        log::info!("compiled shader {}", path.display());
        Ok(shader)
    }

    pub fn from_source(api: &mut A, label: &str, source: &str) -> GpuResult<Self> {
        Ok(Self {
            program: api.create_program(label, source)?,
            label: label.to_string(),
            locations: RefCell::default(),
        })
    }

    pub fn bind(&self, api: &mut A) {
        api.bind_program(Some(&self.program));
    }

    pub fn unbind(api: &mut A) {
        api.bind_program(None);
    }

    pub fn set_uniform_4f(
        &self,
        api: &mut A,
        name: &str,
        v0: f32,
        v1: f32,
        v2: f32,
        v3: f32,
    ) -> GpuResult<()> {
        match self.uniform_location(api, name) {
            Some(location) => api.set_uniform_vec4(&self.program, location, [v0, v1, v2, v3]),
            None => Ok(()),
        }
    }

    pub fn set_uniform_1i(&self, api: &mut A, name: &str, value: i32) -> GpuResult<()> {
        match self.uniform_location(api, name) {
            Some(location) => api.set_uniform_int(&self.program, location, value),
            None => Ok(()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn uniform_location(&self, api: &A, name: &str) -> Option<UniformLocation> {
        if let Some(cached) = self.locations.borrow().get(name) {
            return *cached;
        }

        let location = api.uniform_location(&self.program, name);
        if location.is_none() {
            log::warn!("shader `{}`: uniform `{name}` does not exist", self.label);
        }
        self.locations.borrow_mut().insert(name.to_string(), location);
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GpuCall, GpuError, RecordingApi};

    const SOURCE: &str = "@vertex fn vs_main() {} @fragment fn fs_main() {}";

    #[test]
    fn uniform_write_is_forwarded() {
        let mut api = RecordingApi::new();
        let shader = Shader::from_source(&mut api, "basic", SOURCE).unwrap();
        shader.set_uniform_4f(&mut api, "u_Color", 0.5, 0.3, 0.8, 1.0).unwrap();

        assert!(api.calls().contains(&GpuCall::SetUniformVec4 {
            program: 1,
            name: "u_Color",
            value: [0.5, 0.3, 0.8, 1.0],
        }));
    }

    #[test]
    fn unknown_uniform_is_ignored_and_cached() {
        let mut api = RecordingApi::new();
        let shader = Shader::from_source(&mut api, "basic", SOURCE).unwrap();
        api.take_calls();

        shader.set_uniform_4f(&mut api, "u_Missing", 1.0, 1.0, 1.0, 1.0).unwrap();
        shader.set_uniform_4f(&mut api, "u_Missing", 1.0, 1.0, 1.0, 1.0).unwrap();

        assert!(api.calls().is_empty());
        assert_eq!(shader.locations.borrow().get("u_Missing"), Some(&None));
    }

    #[test]
    fn bind_and_unbind_program() {
        let mut api = RecordingApi::new();
        let shader = Shader::from_source(&mut api, "basic", SOURCE).unwrap();
        shader.bind(&mut api);
        Shader::<RecordingApi>::unbind(&mut api);

        assert_eq!(
            api.calls()[1..],
            [GpuCall::BindProgram(Some(1)), GpuCall::BindProgram(None)]
        );
    }

    #[test]
    fn type_mismatch_surfaces() {
        let mut api = RecordingApi::new();
        let shader = Shader::from_source(&mut api, "basic", SOURCE).unwrap();
        assert_eq!(
            shader.set_uniform_1i(&mut api, "u_Color", 0),
            Err(GpuError::UniformTypeMismatch { name: "u_Color" })
        );
    }

    #[test]
    fn from_file_compiles_source_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic.wgsl");
        std::fs::write(&path, SOURCE).unwrap();

        let mut api = RecordingApi::new();
        let shader = Shader::from_file(&mut api, &path).unwrap();
        assert_eq!(shader.label(), path.display().to_string());
    }

    #[test]
    fn compile_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wgsl");
        std::fs::write(&path, "@vertex fn vs_main() {}").unwrap();

        let mut api = RecordingApi::new();
        let err = Shader::from_file(&mut api, &path).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<GpuError>(),
            Some(GpuError::ShaderCompile { .. })
        ));
    }
}
