//! Style submission and keyword-based assignment

use serde_json::json;
use std::path::PathBuf;

use super::Publisher;
use crate::error::Result;
use crate::formats::sld::read_sld;
use crate::models::{listing_names, StyleCategory, StyleReport, UploadType};
use crate::naming::{matching_styles, style_name};
use crate::ports::Transport;

impl<T: Transport> Publisher<T> {
    /// Names of every style on the server
    pub async fn style_names(&self) -> Result<Vec<String>> {
        let styles = self.transport.get("styles").await?;
        Ok(listing_names(&styles, "styles", "style"))
    }

    /// Upload SLD files as styles
    ///
    /// An existing style is deleted and recreated when the overwrite policy
    /// allows it, otherwise it is skipped.
    pub async fn submit_styles(&self, files: &[PathBuf]) -> Result<StyleReport> {
        let existing = self.style_names().await?;
        tracing::info!("Uploading {} styles.", files.len());
        tracing::info!("{} styles already exist.", existing.len());

        let mut report = StyleReport::default();
        for file in files {
            let (body, summary) = read_sld(file)?;
            let name = style_name(file);
            if let Some(layer) = &summary.named_layer {
                tracing::debug!("{} styles named layer {}", file.display(), layer);
            }
            let resource = format!("styles/{}", name);

            if existing.contains(&name) {
                let question = format!("You are about to overwrite the style {}.\nDo you want to continue?", name);
                if !self.allow_overwrite(&question)? {
                    tracing::warn!("Skipping overwriting {}!", name);
                    report.skipped.push(name);
                    continue;
                }
                self.transport.delete(&resource, &[]).await?;
                report.replaced.push(name.clone());
            }

            tracing::info!("Adding the {} style to the geoserver...", name);
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let payload = json!({"style": {"name": name, "filename": filename}});
            self.transport.post("styles", &payload).await?;
            self.transport
                .put_body(&resource, body, UploadType::Styles.content_type())
                .await?;
            report.uploaded.push(name);
        }

        Ok(report)
    }

    /// Attach keyword-matched styles and the category default to a layer
    ///
    /// The layer's default style is left as GeoServer chose it.
    pub async fn assign_styles(
        &self,
        basin: &str,
        layer: &str,
        category: StyleCategory,
    ) -> Result<Vec<String>> {
        let available = self.style_names().await?;
        let mut styles = matching_styles(&available, layer);
        tracing::info!("{}/{} available styles are matching", styles.len(), available.len());

        let fallback = category.default_style().to_string();
        if !styles.contains(&fallback) {
            styles.push(fallback);
        }

        let resource = format!("layers/{}:{}/styles", basin, layer);
        for style in &styles {
            tracing::debug!("Assigning style {} to {}:{}", style, basin, layer);
            self.transport
                .post(&resource, &json!({"style": {"name": style}}))
                .await?;
        }
        tracing::info!("No default style set for {}:{}, keeping the server default", basin, layer);

        Ok(styles)
    }
}
