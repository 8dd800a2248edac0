//! Resource loading.
//!
//! Resource files ship gzip-compressed (`gmod-vis-3-4a.json.gz`, ...). The
//! `ResourceProvider` trait is the contract between the [`crate::Vis`] cache
//! and wherever the bytes come from: a directory on disk in production, an
//! in-memory table in tests and embedders.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::dto::{GmodDto, GmodVersioningDto, LocationsDto};
use crate::vis_version::VisVersion;
use crate::{Error, Result};

/// Environment variable naming the resources directory.
pub const RESOURCES_ENV_VAR: &str = "VISTA_SDK_RESOURCES";

/// Source of decoded resource DTOs.
pub trait ResourceProvider: Send + Sync {
    fn gmod_dto(&self, vis_version: VisVersion) -> Result<GmodDto>;
    fn locations_dto(&self, vis_version: VisVersion) -> Result<LocationsDto>;
    fn versioning_dto(&self) -> Result<HashMap<String, GmodVersioningDto>>;
}

// ============================================================================
// FileResources
// ============================================================================

/// Reads gzip-compressed resource files from a directory.
pub struct FileResources {
    dir: PathBuf,
}

impl FileResources {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory named by `VISTA_SDK_RESOURCES`, falling back to
    /// `resources/` in the working directory.
    pub fn discover() -> Self {
        let dir = std::env::var_os(RESOURCES_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("resources"));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_gzip_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let path = self.dir.join(file_name);
        if !path.is_file() {
            return Err(Error::ResourceMissing(path.display().to_string()));
        }

        tracing::debug!(file = %path.display(), "loading resource");

        let file = std::fs::File::open(&path)?;
        let mut decoder = flate2::read::GzDecoder::new(file);
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes)?;

        serde_json::from_slice(&bytes)
            .map_err(|err| Error::Decode(format!("{}: {err}", path.display())))
    }
}

impl ResourceProvider for FileResources {
    fn gmod_dto(&self, vis_version: VisVersion) -> Result<GmodDto> {
        self.read_gzip_json(&format!("gmod-vis-{vis_version}.json.gz"))
    }

    fn locations_dto(&self, vis_version: VisVersion) -> Result<LocationsDto> {
        self.read_gzip_json(&format!("locations-vis-{vis_version}.json.gz"))
    }

    fn versioning_dto(&self) -> Result<HashMap<String, GmodVersioningDto>> {
        self.read_gzip_json("gmod-vis-versioning.json.gz")
    }
}

// ============================================================================
// MemoryResources
// ============================================================================

/// In-memory resource table for tests and embedders.
#[derive(Default)]
pub struct MemoryResources {
    gmods: HashMap<VisVersion, GmodDto>,
    locations: HashMap<VisVersion, LocationsDto>,
    versioning: HashMap<String, GmodVersioningDto>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gmod(mut self, vis_version: VisVersion, dto: GmodDto) -> Self {
        self.gmods.insert(vis_version, dto);
        self
    }

    pub fn with_locations(mut self, vis_version: VisVersion, dto: LocationsDto) -> Self {
        self.locations.insert(vis_version, dto);
        self
    }

    pub fn with_versioning(mut self, versioning: HashMap<String, GmodVersioningDto>) -> Self {
        self.versioning = versioning;
        self
    }
}

impl ResourceProvider for MemoryResources {
    fn gmod_dto(&self, vis_version: VisVersion) -> Result<GmodDto> {
        self.gmods
            .get(&vis_version)
            .cloned()
            .ok_or_else(|| Error::ResourceMissing(format!("gmod-vis-{vis_version}")))
    }

    fn locations_dto(&self, vis_version: VisVersion) -> Result<LocationsDto> {
        self.locations
            .get(&vis_version)
            .cloned()
            .ok_or_else(|| Error::ResourceMissing(format!("locations-vis-{vis_version}")))
    }

    fn versioning_dto(&self) -> Result<HashMap<String, GmodVersioningDto>> {
        Ok(self.versioning.clone())
    }
}
