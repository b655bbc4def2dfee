//! Workspace > store > layer existence checks

use super::Publisher;
use crate::error::{GudsError, Result};
use crate::models::{listing_names, StoreKind};
use crate::ports::Transport;

/// Levels to look for, the basin is always checked
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistsQuery<'a> {
    pub basin: &'a str,
    pub coverage_store: Option<&'a str>,
    pub data_store: Option<&'a str>,
    pub layer: Option<&'a str>,
}

impl<'a> ExistsQuery<'a> {
    pub fn basin(basin: &'a str) -> Self {
        Self {
            basin,
            ..Default::default()
        }
    }

    pub fn coverage_store(mut self, store: &'a str) -> Self {
        self.coverage_store = Some(store);
        self
    }

    pub fn data_store(mut self, store: &'a str) -> Self {
        self.data_store = Some(store);
        self
    }

    /// Store of either kind
    pub fn store(self, kind: StoreKind, store: &'a str) -> Self {
        match kind {
            StoreKind::Coverage => self.coverage_store(store),
            StoreKind::Data => self.data_store(store),
        }
    }

    pub fn layer(mut self, layer: &'a str) -> Self {
        self.layer = Some(layer);
        self
    }

    fn store_target(&self) -> Result<Option<(StoreKind, &'a str)>> {
        match (self.coverage_store, self.data_store) {
            (Some(_), Some(_)) => Err(GudsError::InvalidInput(
                "cannot check a coverage store and a data store at once".to_string(),
            )),
            (Some(store), None) => Ok(Some((StoreKind::Coverage, store))),
            (None, Some(store)) => Ok(Some((StoreKind::Data, store))),
            (None, None) => Ok(None),
        }
    }

    fn describe(&self) -> String {
        [
            Some(self.basin),
            self.coverage_store.or(self.data_store),
            self.layer,
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" > ")
    }
}

impl<T: Transport> Publisher<T> {
    /// True only when every requested level exists
    pub async fn exists(&self, query: &ExistsQuery<'_>) -> Result<bool> {
        let target = query.store_target()?;
        let found = self.resolve(query, target).await?;

        if found {
            tracing::debug!("{} already exists on the geoserver.", query.describe());
        } else {
            tracing::debug!("{} doesn't exist on the geoserver.", query.describe());
        }
        Ok(found)
    }

    async fn resolve(
        &self,
        query: &ExistsQuery<'_>,
        target: Option<(StoreKind, &str)>,
    ) -> Result<bool> {
        let basin = query.basin.to_lowercase();
        let workspaces = self.transport.get("workspaces").await?;
        if !listing_names(&workspaces, "workspaces", "workspace").contains(&basin) {
            return Ok(false);
        }

        let (kind, store) = match target {
            Some(target) => target,
            // A layer without a store cannot be located
            None => return Ok(query.layer.is_none()),
        };

        let (outer, inner) = kind.listing_keys();
        let stores = self
            .transport
            .get(&format!("workspaces/{}/{}.json", basin, kind.collection()))
            .await?;
        if !listing_names(&stores, outer, inner).iter().any(|s| s == store) {
            return Ok(false);
        }

        let layer = match query.layer {
            Some(layer) => layer,
            None => return Ok(true),
        };

        let (outer, inner) = kind.layer_listing_keys();
        let layers = self
            .transport
            .get(&format!(
                "workspaces/{}/{}/{}/{}.json",
                basin,
                kind.collection(),
                store,
                kind.layer_collection()
            ))
            .await?;
        Ok(listing_names(&layers, outer, inner).iter().any(|l| l == layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_target_conflict() {
        let query = ExistsQuery::basin("kings").coverage_store("a").data_store("b");
        assert!(matches!(query.store_target(), Err(GudsError::InvalidInput(_))));
    }

    #[test]
    fn test_describe() {
        let query = ExistsQuery::basin("kings")
            .store(StoreKind::Coverage, "kings_topo")
            .layer("dem");
        assert_eq!(query.describe(), "kings > kings_topo > dem");
        assert_eq!(ExistsQuery::basin("brb").describe(), "brb");
    }
}
