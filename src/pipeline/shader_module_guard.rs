use std::{fs::File, io, ops::Deref, path::Path, rc::Rc};

use ash::{
    util::read_spv,
    vk::{ShaderModule, ShaderModuleCreateInfo},
};
use tracing::debug;

use crate::{
    error::{RendererError, RendererResult},
    vulkan::LogicalDeviceGuard,
};

pub struct ShaderModuleGuard {
    shader_module: ShaderModule,
    logical_device: Rc<LogicalDeviceGuard>,
}

impl ShaderModuleGuard {
    pub fn try_new(path: &Path, logical_device: &Rc<LogicalDeviceGuard>) -> RendererResult<Self> {
        let code = load_spirv(path)?;
        let create_info = ShaderModuleCreateInfo::builder().code(&code);
        let shader_module = unsafe { logical_device.create_shader_module(&create_info, None) }
            .map_err(RendererError::PipelineCreation)?;
        debug!("Shader module created from {}", path.display());
        Ok(Self {
            shader_module,
            logical_device: Rc::clone(logical_device),
        })
    }
}

/// Reads a compiled SPIR-V binary as aligned words. Fails if the file is
/// missing or its size isn't a multiple of 4.
pub fn load_spirv(path: &Path) -> RendererResult<Vec<u32>> {
    let to_error = |source: io::Error| RendererError::ShaderLoad {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(to_error)?;
    read_spv(&mut file).map_err(to_error)
}

impl Drop for ShaderModuleGuard {
    fn drop(&mut self) {
        debug!("Dropping ShaderModuleGuard");
        unsafe {
            self.logical_device
                .destroy_shader_module(self.shader_module, None)
        }
    }
}

impl Deref for ShaderModuleGuard {
    type Target = ShaderModule;

    fn deref(&self) -> &Self::Target {
        &self.shader_module
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;

    fn scratch_file(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "{}-{}-{name}",
            env!("CARGO_PKG_NAME"),
            std::process::id()
        ));
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = Path::new("does/not/exist.spv");
        let err = load_spirv(path).unwrap_err();
        assert!(matches!(&err, RendererError::ShaderLoad { path: p, .. } if p == path));
        assert!(err.to_string().contains("does/not/exist.spv"));
        assert_eq!(err.stage(), "pipeline");
    }

    #[test]
    fn words_are_read_in_native_order() {
        // SPIR-V magic number followed by one more word
        let mut bytes = 0x0723_0203u32.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&42u32.to_ne_bytes());
        let path = scratch_file("words.spv", &bytes);
        let code = load_spirv(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(code, vec![0x0723_0203, 42]);
    }

    #[test]
    fn truncated_binary_is_rejected() {
        let path = scratch_file("truncated.spv", &[0x03, 0x02, 0x23]);
        let result = load_spirv(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(RendererError::ShaderLoad { .. })));
    }
}
