use std::{ffi::CString, ops::Deref, rc::Rc};

use ash::{
    vk::{make_api_version, ApplicationInfo, InstanceCreateInfo, API_VERSION_1_0},
    Entry, Instance,
};
use tracing::debug;

use crate::error::{RendererError, RendererResult};

const API_VERSION: u32 = API_VERSION_1_0;

/// RAII for Instance. Also keeps the loader alive for as long as anything
/// created from it.
pub struct InstanceGuard {
    instance: Instance,
    entry: Entry,
}

impl InstanceGuard {
    pub fn try_new(
        entry: Entry,
        extension_names: &[String],
        layer_names: &[&str],
    ) -> RendererResult<Rc<Self>> {
        debug!("Creating instance...");

        let appname = cstring(env!("CARGO_PKG_NAME"))?;
        let app_version = make_api_version(
            0,
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        );

        let application_info = ApplicationInfo::builder()
            .application_name(&appname)
            .application_version(app_version)
            .api_version(API_VERSION)
            .engine_name(&appname)
            .engine_version(app_version);

        let extension_names = extension_names
            .iter()
            .map(|name| cstring(name))
            .collect::<RendererResult<Vec<_>>>()?;
        let extension_name_pointers = extension_names
            .iter()
            .map(|extension_name| extension_name.as_ptr())
            .collect::<Vec<_>>();

        let layer_names = layer_names
            .iter()
            .map(|name| cstring(name))
            .collect::<RendererResult<Vec<_>>>()?;
        let layer_name_pointers = layer_names
            .iter()
            .map(|layer_name| layer_name.as_ptr())
            .collect::<Vec<_>>();

        let instance_create_info = InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_extension_names(&extension_name_pointers)
            .enabled_layer_names(&layer_name_pointers);

        let instance = unsafe { entry.create_instance(&instance_create_info, None) }
            .map_err(RendererError::InstanceCreation)?;

        debug!("Instance created");

        Ok(Rc::new(Self { instance, entry }))
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        debug!("Dropping InstanceGuard");
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

impl Deref for InstanceGuard {
    type Target = Instance;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

fn cstring(name: &str) -> RendererResult<CString> {
    CString::new(name).map_err(|_| {
        RendererError::InvalidState(format!("name contains an interior nul: {name:?}"))
    })
}
