//! Minimal local-id builder.
//!
//! A local id names a data channel: a primary (and optional secondary) GMOD
//! path plus free-text metadata tags, all bound to one VIS version. This
//! module carries exactly the surface the cross-version converter needs;
//! tag codebook validation lives outside the core.

use crate::gmod::GmodPath;
use crate::vis_version::VisVersion;

/// One `name = value` metadata tag (quantity, content, position, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTag {
    name: String,
    value: String,
}

impl MetadataTag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Builder for local ids. All `with_` methods move the builder.
#[derive(Debug, Clone, Default)]
pub struct LocalIdBuilder {
    vis_version: Option<VisVersion>,
    verbose_mode: bool,
    primary_item: Option<GmodPath>,
    secondary_item: Option<GmodPath>,
    quantity: Option<MetadataTag>,
    content: Option<MetadataTag>,
    calculation: Option<MetadataTag>,
    state: Option<MetadataTag>,
    command: Option<MetadataTag>,
    type_tag: Option<MetadataTag>,
    position: Option<MetadataTag>,
    detail: Option<MetadataTag>,
}

impl LocalIdBuilder {
    pub fn create(vis_version: VisVersion) -> Self {
        Self { vis_version: Some(vis_version), ..Default::default() }
    }

    pub fn vis_version(&self) -> Option<VisVersion> {
        self.vis_version
    }

    pub fn is_verbose_mode(&self) -> bool {
        self.verbose_mode
    }

    pub fn primary_item(&self) -> Option<&GmodPath> {
        self.primary_item.as_ref()
    }

    pub fn secondary_item(&self) -> Option<&GmodPath> {
        self.secondary_item.as_ref()
    }

    pub fn quantity(&self) -> Option<&MetadataTag> {
        self.quantity.as_ref()
    }

    pub fn content(&self) -> Option<&MetadataTag> {
        self.content.as_ref()
    }

    pub fn calculation(&self) -> Option<&MetadataTag> {
        self.calculation.as_ref()
    }

    pub fn state(&self) -> Option<&MetadataTag> {
        self.state.as_ref()
    }

    pub fn command(&self) -> Option<&MetadataTag> {
        self.command.as_ref()
    }

    pub fn type_tag(&self) -> Option<&MetadataTag> {
        self.type_tag.as_ref()
    }

    pub fn position(&self) -> Option<&MetadataTag> {
        self.position.as_ref()
    }

    pub fn detail(&self) -> Option<&MetadataTag> {
        self.detail.as_ref()
    }

    // ------------------------------------------------------------------------
    // With-ers
    // ------------------------------------------------------------------------

    pub fn with_vis_version(mut self, vis_version: VisVersion) -> Self {
        self.vis_version = Some(vis_version);
        self
    }

    pub fn with_verbose_mode(mut self, verbose_mode: bool) -> Self {
        self.verbose_mode = verbose_mode;
        self
    }

    pub fn with_primary_item(mut self, item: GmodPath) -> Self {
        self.primary_item = Some(item);
        self
    }

    pub fn try_with_primary_item(mut self, item: Option<GmodPath>) -> Self {
        if let Some(item) = item {
            self.primary_item = Some(item);
        }
        self
    }

    pub fn with_secondary_item(mut self, item: GmodPath) -> Self {
        self.secondary_item = Some(item);
        self
    }

    pub fn try_with_secondary_item(mut self, item: Option<GmodPath>) -> Self {
        if let Some(item) = item {
            self.secondary_item = Some(item);
        }
        self
    }

    pub fn with_quantity(mut self, tag: MetadataTag) -> Self {
        self.quantity = Some(tag);
        self
    }

    pub fn with_content(mut self, tag: MetadataTag) -> Self {
        self.content = Some(tag);
        self
    }

    pub fn with_calculation(mut self, tag: MetadataTag) -> Self {
        self.calculation = Some(tag);
        self
    }

    pub fn with_state(mut self, tag: MetadataTag) -> Self {
        self.state = Some(tag);
        self
    }

    pub fn with_command(mut self, tag: MetadataTag) -> Self {
        self.command = Some(tag);
        self
    }

    pub fn with_type_tag(mut self, tag: MetadataTag) -> Self {
        self.type_tag = Some(tag);
        self
    }

    pub fn with_position(mut self, tag: MetadataTag) -> Self {
        self.position = Some(tag);
        self
    }

    pub fn with_detail(mut self, tag: MetadataTag) -> Self {
        self.detail = Some(tag);
        self
    }

    /// Carry every metadata tag of `other`, leaving absent tags absent.
    pub(crate) fn with_metadata_from(mut self, other: &LocalIdBuilder) -> Self {
        self.quantity = other.quantity.clone();
        self.content = other.content.clone();
        self.calculation = other.calculation.clone();
        self.state = other.state.clone();
        self.command = other.command.clone();
        self.type_tag = other.type_tag.clone();
        self.position = other.position.clone();
        self.detail = other.detail.clone();
        self
    }
}
