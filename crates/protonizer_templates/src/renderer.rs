//! Rendering of embedded assets against typed records.

use serde::Serialize;
use tracing::debug;

use crate::error::TemplateResult;
use crate::registry::{TemplateAsset, TemplateRegistry};

/// Renders assets from a shared [`TemplateRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct TemplateRenderer<'a> {
    registry: &'a TemplateRegistry,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Render an asset. Verbatim assets ignore `data` and are copied as is.
    pub fn render<T: Serialize>(&self, asset: TemplateAsset, data: &T) -> TemplateResult<Vec<u8>> {
        if asset.is_verbatim() {
            return Ok(self.copy(asset));
        }

        let rendered = self.registry.template(asset)?.render(data)?;
        debug!("Rendered {} ({} bytes)", asset, rendered.len());
        Ok(rendered.into_bytes())
    }

    /// Raw bytes of an asset.
    pub fn copy(&self, asset: TemplateAsset) -> Vec<u8> {
        asset.source().as_bytes().to_vec()
    }
}
