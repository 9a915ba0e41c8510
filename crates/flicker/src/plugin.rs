use std::collections::BTreeMap;
use std::sync::Arc;

use flicker_image::Raster;

use crate::error::TransformError;
use crate::session::TransformParams;

/// An externally provided transform addressed by a numeric slot.
pub trait TransformPlugin: Send + Sync {
    /// Display name of the plugin.
    fn name(&self) -> &str;

    /// Write the transformed `src` into `dst`, which has the same size.
    fn apply(
        &self,
        src: &Raster,
        dst: &mut Raster,
        params: &TransformParams,
    ) -> Result<(), TransformError>;
}

/// Plugins by slot.
///
/// # Example
///
/// ```
/// use flicker::{PluginRegistry, TransformError, TransformParams, TransformPlugin};
/// use flicker::image::Raster;
///
/// struct Passthrough;
///
/// impl TransformPlugin for Passthrough {
///     fn name(&self) -> &str {
///         "copy"
///     }
///
///     fn apply(
///         &self,
///         src: &Raster,
///         dst: &mut Raster,
///         _: &TransformParams,
///     ) -> Result<(), TransformError> {
///         dst.as_slice_mut().copy_from_slice(src.as_slice());
///         Ok(())
///     }
/// }
///
/// let mut registry = PluginRegistry::default();
/// registry.register(3, Passthrough);
/// assert_eq!(registry.get(3).map(|p| p.name().to_string()), Some("copy".to_string()));
/// assert!(registry.get(4).is_none());
/// ```
#[derive(Clone, Default)]
pub struct PluginRegistry {
    slots: BTreeMap<u32, Arc<dyn TransformPlugin>>,
}

impl PluginRegistry {
    /// Register `plugin` under `slot`, returning the plugin it replaces.
    pub fn register(
        &mut self,
        slot: u32,
        plugin: impl TransformPlugin + 'static,
    ) -> Option<Arc<dyn TransformPlugin>> {
        log::debug!("registering plugin `{}` in slot {slot}", plugin.name());
        self.slots.insert(slot, Arc::new(plugin))
    }

    /// Remove the plugin in `slot`.
    pub fn unregister(&mut self, slot: u32) -> Option<Arc<dyn TransformPlugin>> {
        self.slots.remove(&slot)
    }

    /// The plugin in `slot`.
    pub fn get(&self, slot: u32) -> Option<Arc<dyn TransformPlugin>> {
        self.slots.get(&slot).cloned()
    }

    /// Occupied slots in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.keys().copied()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(slot, p)| (slot, p.name())))
            .finish()
    }
}
