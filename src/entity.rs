//! Entity type resolution for configuration names
//!
//! Configuration entities are recognized by the prefix of their name
//! (`node.type.article` is a `node_type`). Everything else is simple
//! configuration.

use std::collections::BTreeMap;

/// Entity type id used for configuration that is not a configuration entity.
pub const SIMPLE_CONFIG: &str = "system.simple";

/// Built-in name prefixes of well-known configuration entity types.
const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("block.block.", "block"),
    ("core.entity_form_display.", "entity_form_display"),
    ("core.entity_view_display.", "entity_view_display"),
    ("field.field.", "field_config"),
    ("field.storage.", "field_storage_config"),
    ("image.style.", "image_style"),
    ("menu_link_content.menu_link_config.", "menu_link_config"),
    ("node.type.", "node_type"),
    ("system.menu.", "menu"),
    ("taxonomy.vocabulary.", "taxonomy_vocabulary"),
    ("user.role.", "user_role"),
    ("views.view.", "view"),
];

/// Maps configuration name prefixes to entity type ids
#[derive(Debug, Clone)]
pub struct EntityTypeResolver {
    prefixes: BTreeMap<String, String>,
}

impl Default for EntityTypeResolver {
    fn default() -> Self {
        let mut resolver = Self::empty();
        for (prefix, entity_type) in DEFAULT_PREFIXES {
            resolver.register(prefix, entity_type);
        }
        resolver
    }
}

impl EntityTypeResolver {
    /// Resolver with no registered prefixes; every name is simple config.
    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// Register (or override) the entity type for a name prefix.
    pub fn register(&mut self, prefix: &str, entity_type: &str) -> &mut Self {
        self.prefixes
            .insert(prefix.to_string(), entity_type.to_string());
        self
    }

    /// The configuration entity type of `name`, if it is one.
    ///
    /// The longest matching prefix wins.
    pub fn entity_type_for(&self, name: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix.as_str()) && name.len() > prefix.len())
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, entity_type)| entity_type.as_str())
    }

    /// Like [`entity_type_for`](Self::entity_type_for), falling back to
    /// [`SIMPLE_CONFIG`].
    pub fn resolve(&self, name: &str) -> &str {
        self.entity_type_for(name).unwrap_or(SIMPLE_CONFIG)
    }

    /// Whether `name` is a configuration entity rather than simple config.
    pub fn is_entity(&self, name: &str) -> bool {
        self.entity_type_for(name).is_some()
    }
}
