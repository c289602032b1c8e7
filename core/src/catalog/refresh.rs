use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::{Catalog, CatalogError};
use crate::remote::{CatalogApi, RemoteError};

const GENERATIONS: &str = "generation?limit=10000";

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct GenerationList {
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    pokemon_species: Vec<NamedResource>,
}

/// Id of a listed resource: the second-to-last segment of
/// `https://host/api/v2/generation/3/`.
fn resource_id(url: &str) -> Option<&str> {
    let mut segments = url.rsplit('/');
    let last = segments.next()?;
    let id = if last.is_empty() { segments.next()? } else { last };
    (!id.is_empty()).then_some(id)
}

/// Build a fresh catalog from the generation listing API.
pub async fn fetch_catalog<A: CatalogApi>(api: &A) -> Result<Catalog, CatalogError> {
    let list: GenerationList = api.get_json(GENERATIONS).await?;

    let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for generation in &list.results {
        let id = resource_id(&generation.url).ok_or_else(|| RemoteError::Decode {
            url: generation.url.clone(),
            message: format!("no id in url of generation '{}'", generation.name),
        })?;

        let detail: Generation = api
            .get_json(&format!("generation/{id}?limit=10000"))
            .await?;
        tracing::debug!(generation = %generation.name, species = detail.pokemon_species.len(), "Fetched generation");

        for species in detail.pokemon_species {
            let tags = entries.entry(species.name).or_default();
            if !tags.iter().any(|t| t == id) {
                tags.push(id.to_string());
            }
        }
    }

    if entries.is_empty() {
        return Err(CatalogError::EmptyListing);
    }
    Ok(Catalog { entries })
}

/// Rebuild the catalog and overwrite `path`. On any failure the existing
/// file is left untouched.
pub async fn refresh_catalog<A: CatalogApi>(api: &A, path: &Path) -> Result<Catalog, CatalogError> {
    let catalog = fetch_catalog(api).await?;
    catalog.save(path)?;
    tracing::info!(path = ?path, entries = catalog.len(), "Catalog refreshed");
    Ok(catalog)
}
