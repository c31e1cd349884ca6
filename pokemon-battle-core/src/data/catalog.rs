use crate::data::moves::MoveData;
use crate::data::normalize_id;
use crate::data::species::SpeciesData;
use crate::error::{EngineError, RecordKind};
use anyhow::Context;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const BUILTIN_JSON: &str = include_str!("catalog.json");

static BUILTIN: OnceCell<Arc<MemoryCatalog>> = OnceCell::new();

/// Read-only source of species and move records.
///
/// Lookups are keyed by normalized id, so display names and kebab-case ids
/// resolve to the same record.
pub trait Catalog: Send + Sync {
    fn species(&self, id: &str) -> Result<SpeciesData, EngineError>;

    fn move_data(&self, id: &str) -> Result<MoveData, EngineError>;

    /// Species lookup that never fails; misses become a neutral placeholder.
    fn species_or_placeholder(&self, id: &str) -> SpeciesData {
        match self.species(id) {
            Ok(species) => species,
            Err(err) => {
                tracing::warn!(%err, "substituting placeholder species");
                SpeciesData::placeholder(id)
            }
        }
    }

    /// Move lookup that never fails; misses become struggle.
    fn move_or_struggle(&self, id: &str) -> MoveData {
        match self.move_data(id) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(%err, "substituting struggle for unknown move");
                MoveData::struggle()
            }
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    species: Vec<SpeciesData>,
    #[serde(default)]
    moves: Vec<MoveData>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    species: HashMap<String, SpeciesData>,
    moves: HashMap<String, MoveData>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(raw).context("Failed to parse catalog JSON")?;
        let mut catalog = Self::new();
        for species in file.species {
            catalog.insert_species(species);
        }
        for data in file.moves {
            catalog.insert_move(data);
        }
        Ok(catalog)
    }

    pub fn insert_species(&mut self, species: SpeciesData) {
        self.species.insert(species.id(), species);
    }

    pub fn insert_move(&mut self, data: MoveData) {
        self.moves.insert(data.id(), data);
    }

    pub fn species_ids(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    pub fn move_ids(&self) -> impl Iterator<Item = &str> {
        self.moves.keys().map(String::as_str)
    }
}

impl Catalog for MemoryCatalog {
    fn species(&self, id: &str) -> Result<SpeciesData, EngineError> {
        self.species
            .get(normalize_id(id).as_str())
            .cloned()
            .ok_or_else(|| EngineError::DataUnavailable {
                kind: RecordKind::Species,
                id: id.to_string(),
            })
    }

    fn move_data(&self, id: &str) -> Result<MoveData, EngineError> {
        self.moves
            .get(normalize_id(id).as_str())
            .cloned()
            .ok_or_else(|| EngineError::DataUnavailable {
                kind: RecordKind::Move,
                id: id.to_string(),
            })
    }
}

/// The catalog bundled with the crate, parsed once per process.
pub fn builtin() -> anyhow::Result<Arc<MemoryCatalog>> {
    BUILTIN
        .get_or_try_init(|| MemoryCatalog::from_json_str(BUILTIN_JSON).map(Arc::new))
        .cloned()
        .context("Built-in catalog is malformed")
}
