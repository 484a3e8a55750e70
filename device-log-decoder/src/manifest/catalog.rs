//! Read-only manifest catalog
//!
//! Maps category ids to category descriptors, each holding the message
//! templates of that category.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Wire type of a single message parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    /// 4 bytes, signed
    Integer,
    /// 4 bytes, unsigned
    UnsignedInteger,
    /// 4 bytes, dotted quad
    IpAddress,
    /// 16 bytes, UUID
    UniqueId,
    /// 4 bytes, passed to the error translator
    CommonError,
    /// NUL-terminated text
    String,
}

impl ParameterType {
    /// Fixed payload width, `None` for variable-length strings
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            ParameterType::Integer
            | ParameterType::UnsignedInteger
            | ParameterType::IpAddress
            | ParameterType::CommonError => Some(4),
            ParameterType::UniqueId => Some(16),
            ParameterType::String => None,
        }
    }
}

/// A named, typed message parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    #[serde(rename = "paramName")]
    pub name: String,
    #[serde(rename = "paramType")]
    pub param_type: ParameterType,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}

/// A message template: format string plus ordered parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    #[serde(rename = "msgId")]
    pub id: u16,
    #[serde(rename = "msgString")]
    pub format: String,
    #[serde(default)]
    pub params: Vec<ParameterDescriptor>,
}

impl MessageTemplate {
    pub fn new(id: u16, format: impl Into<String>) -> Self {
        Self {
            id,
            format: format.into(),
            params: Vec::new(),
        }
    }

    /// Builder method: append a parameter
    pub fn with_param(mut self, name: impl Into<String>, param_type: ParameterType) -> Self {
        self.params.push(ParameterDescriptor::new(name, param_type));
        self
    }
}

/// A log category and its messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDescriptor {
    pub id: u16,
    pub name: String,
    messages: HashMap<u16, MessageTemplate>,
}

impl CategoryDescriptor {
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            messages: HashMap::new(),
        }
    }

    /// Builder method: add a message template
    ///
    /// A later template with the same id replaces the earlier one.
    pub fn with_message(mut self, template: MessageTemplate) -> Self {
        self.add_message(template);
        self
    }

    pub fn add_message(&mut self, template: MessageTemplate) {
        self.messages.insert(template.id, template);
    }

    pub fn message(&self, message_id: u16) -> Option<&MessageTemplate> {
        self.messages.get(&message_id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageTemplate> {
        self.messages.values()
    }

    pub fn num_messages(&self) -> usize {
        self.messages.len()
    }
}

/// The manifest catalog
#[derive(Debug, Clone, Default)]
pub struct ManifestCatalog {
    /// All categories by category id
    categories: HashMap<u16, CategoryDescriptor>,
}

impl ManifestCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            categories: HashMap::new(),
        }
    }

    /// Add a category; a second category with the same id is rejected
    pub fn add_category(&mut self, category: CategoryDescriptor) -> Result<()> {
        if self.categories.contains_key(&category.id) {
            return Err(DecoderError::DuplicateCategory(category.id));
        }
        self.categories.insert(category.id, category);
        Ok(())
    }

    pub fn category(&self, category_id: u16) -> Option<&CategoryDescriptor> {
        self.categories.get(&category_id)
    }

    pub fn category_name(&self, category_id: u16) -> Option<&str> {
        self.category(category_id).map(|c| c.name.as_str())
    }

    /// Look up a template by category and message id
    pub fn message(&self, category_id: u16, message_id: u16) -> Option<&MessageTemplate> {
        self.category(category_id)
            .and_then(|category| category.message(message_id))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// All category ids, sorted
    pub fn category_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.categories.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get catalog statistics
    pub fn stats(&self) -> CatalogStats {
        let num_messages = self.categories.values().map(|c| c.num_messages()).sum();
        let num_parameters = self
            .categories
            .values()
            .flat_map(|c| c.messages())
            .map(|m| m.params.len())
            .sum();

        CatalogStats {
            num_categories: self.len(),
            num_messages,
            num_parameters,
        }
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub num_categories: usize,
    pub num_messages: usize,
    pub num_parameters: usize,
}
