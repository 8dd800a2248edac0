//! Process-wide VIS entry point and resource cache.
//!
//! One `Gmod` and one `Locations` are cached per VIS version, plus one
//! `GmodVersioning` overall. Entries are dropped when more than ten versions
//! are live or an entry has sat idle for over an hour — the taxonomy of one
//! release is a few megabytes, and most processes touch one or two releases.
//!
//! All cached values are `Arc`s: loading is serialized behind a mutex, reads
//! after the handout are lock-free.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::gmod::{Gmod, GmodNode, GmodPath};
use crate::local_id::LocalIdBuilder;
use crate::locations::Locations;
use crate::resources::{FileResources, ResourceProvider};
use crate::versioning::GmodVersioning;
use crate::vis_version::VisVersion;
use crate::Result;

const MAX_CACHE_ENTRIES: usize = 10;
const CACHE_IDLE_EVICTION: Duration = Duration::from_secs(60 * 60);

// ============================================================================
// Cache
// ============================================================================

struct CacheItem<V> {
    value: V,
    last_access: Instant,
}

/// Small LRU-ish cache: evicts the least recently used entry over capacity
/// and sweeps idle entries once per eviction period.
struct Cache<K, V> {
    map: HashMap<K, CacheItem<V>>,
    last_cleanup: Instant,
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    fn new() -> Self {
        Self { map: HashMap::new(), last_cleanup: Instant::now() }
    }

    fn get_or_create(&mut self, key: K, factory: impl FnOnce() -> Result<V>) -> Result<V> {
        let now = Instant::now();

        if now.duration_since(self.last_cleanup) > CACHE_IDLE_EVICTION {
            self.map
                .retain(|_, item| now.duration_since(item.last_access) <= CACHE_IDLE_EVICTION);
            self.last_cleanup = now;
        }

        if let Some(item) = self.map.get_mut(&key) {
            item.last_access = now;
            return Ok(item.value.clone());
        }

        if self.map.len() >= MAX_CACHE_ENTRIES {
            if let Some(oldest) = self
                .map
                .iter()
                .min_by_key(|(_, item)| item.last_access)
                .map(|(key, _)| key.clone())
            {
                self.map.remove(&oldest);
                tracing::trace!("cache eviction performed (removed oldest)");
            }
        }

        let value = factory()?;
        self.map.insert(key, CacheItem { value: value.clone(), last_access: now });
        Ok(value)
    }
}

// ============================================================================
// Vis
// ============================================================================

/// Entry point to loaded VIS data. Usually accessed through
/// [`Vis::instance`]; embed a custom [`ResourceProvider`] with
/// [`Vis::with_provider`].
pub struct Vis {
    provider: Box<dyn ResourceProvider>,
    gmods: Mutex<Cache<VisVersion, Arc<Gmod>>>,
    locations: Mutex<Cache<VisVersion, Arc<Locations>>>,
    versioning: Mutex<Option<Arc<GmodVersioning>>>,
}

impl Vis {
    /// The process-wide instance, backed by the resource directory named by
    /// `VISTA_SDK_RESOURCES` (or `resources/`).
    pub fn instance() -> &'static Vis {
        static INSTANCE: OnceLock<Vis> = OnceLock::new();
        INSTANCE.get_or_init(|| Vis::with_provider(FileResources::discover()))
    }

    pub fn with_provider(provider: impl ResourceProvider + 'static) -> Vis {
        Vis {
            provider: Box::new(provider),
            gmods: Mutex::new(Cache::new()),
            locations: Mutex::new(Cache::new()),
            versioning: Mutex::new(None),
        }
    }

    /// The taxonomy graph of a release, loading it on first use.
    pub fn gmod(&self, vis_version: VisVersion) -> Result<Arc<Gmod>> {
        self.gmods.lock().get_or_create(vis_version, || {
            tracing::debug!(%vis_version, "loading GMOD");
            let dto = self.provider.gmod_dto(vis_version)?;
            Ok(Arc::new(Gmod::new(vis_version, &dto)?))
        })
    }

    /// The location alphabet of a release, loading it on first use.
    pub fn locations(&self, vis_version: VisVersion) -> Result<Arc<Locations>> {
        self.locations.lock().get_or_create(vis_version, || {
            tracing::debug!(%vis_version, "loading locations");
            let dto = self.provider.locations_dto(vis_version)?;
            Ok(Arc::new(Locations::new(vis_version, &dto)?))
        })
    }

    /// The cross-version converter, loading it on first use.
    pub fn gmod_versioning(&self) -> Result<Arc<GmodVersioning>> {
        let mut slot = self.versioning.lock();
        if let Some(versioning) = slot.as_ref() {
            return Ok(versioning.clone());
        }

        tracing::debug!("loading GMOD versioning");
        let dto = self.provider.versioning_dto()?;
        let versioning = Arc::new(GmodVersioning::new(&dto)?);
        *slot = Some(versioning.clone());
        Ok(versioning)
    }

    // ------------------------------------------------------------------------
    // Conversion conveniences
    // ------------------------------------------------------------------------

    pub fn convert_node(
        &self,
        source_version: VisVersion,
        node: &GmodNode,
        target_version: VisVersion,
    ) -> Result<Option<GmodNode>> {
        self.gmod_versioning()?
            .convert_node(self, source_version, node, target_version)
    }

    pub fn convert_path(
        &self,
        source_version: VisVersion,
        path: &GmodPath,
        target_version: VisVersion,
    ) -> Result<Option<GmodPath>> {
        self.gmod_versioning()?
            .convert_path(self, source_version, path, target_version)
    }

    pub fn convert_local_id(
        &self,
        local_id: &LocalIdBuilder,
        target_version: VisVersion,
    ) -> Result<Option<LocalIdBuilder>> {
        self.gmod_versioning()?
            .convert_local_id(self, local_id, target_version)
    }
}
