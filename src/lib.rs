//! # vista-rs — DNV Vessel Information Structure (VIS) core
//!
//! A Rust implementation of the ISO 19848 / DNV VIS Generic Product Model
//! (GMOD): a large, versioned taxonomy of shipboard functional and product
//! nodes, plus the machinery to address individual equipment through it.
//!
//! ## Design Principles
//!
//! 1. **Read-only after load**: `Gmod`, `Locations` and `GmodVersioning` are
//!    built once from resource DTOs and never mutated
//! 2. **Arena graph**: nodes live in a flat arena indexed by `NodeId`;
//!    the perfect-hash dictionary maps codes to ids — no pointer graphs
//! 3. **Parsers own nothing**: path and location parsing are pure functions
//!    from strings to values over a borrowed `Gmod`/`Locations`
//! 4. **`try_` first**: every fallible operation exists as a `try_` variant;
//!    the erroring form is a thin wrapper
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vista_rs::{Vis, VisVersion, GmodPath};
//!
//! # fn example() -> vista_rs::Result<()> {
//! let vis = Vis::instance();
//! let gmod = vis.gmod(VisVersion::V3_4a)?;
//!
//! let path = GmodPath::parse("411.1/C101.31-2", VisVersion::V3_4a)?;
//! println!("{}", path.to_full_path_string());
//!
//! let node = gmod.get("411.1")?;
//! println!("{} -> {}", node.code(), node.metadata().name());
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|---------------|
//! | `chd` | Perfect-hash dictionary (Compress, Hash & Displace) |
//! | `locations` | Location grammar, parser and builder |
//! | `gmod` | Taxonomy graph, traversal, paths and path parsing |
//! | `versioning` | Node/path/local-id conversion between VIS releases |
//! | `vis` | Process-wide resource cache |

// ============================================================================
// Modules
// ============================================================================

pub mod chd;
pub mod dto;
pub mod gmod;
pub mod local_id;
pub mod locations;
pub mod resources;
pub mod versioning;
pub mod vis;
pub mod vis_version;

// ============================================================================
// Re-exports: Taxonomy
// ============================================================================

pub use gmod::{
    Gmod, GmodIndividualizableSet, GmodNode, GmodNodeMetadata, GmodPath, NodeId, Parents,
    TraversalHandlerResult, TraversalOptions,
};

// ============================================================================
// Re-exports: Locations
// ============================================================================

pub use locations::{
    Location, LocationBuilder, LocationGroup, LocationValidationResult, Locations, ParsingErrors,
    RelativeLocation,
};

// ============================================================================
// Re-exports: Versioning
// ============================================================================

pub use local_id::{LocalIdBuilder, MetadataTag};
pub use versioning::GmodVersioning;

// ============================================================================
// Re-exports: Loading
// ============================================================================

pub use vis::Vis;
pub use vis_version::VisVersion;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Resource not found: {0}")]
    ResourceMissing(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Perfect hash construction failed: {0}")]
    ChdConstruction(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid GMOD path: {0}")]
    InvalidPath(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
