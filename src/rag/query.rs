//! Validated question requests.

use crate::config::RetrievalSettings;
use crate::content::ContentType;
use crate::error::{Result, VidsageError};
use crate::source::normalize_source_id;
use crate::vector_store::SearchFilter;

/// A question from one owner, validated before any backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    question: String,
    owner_id: String,
    content_type: ContentType,
    scope_id: Option<String>,
    limit: usize,
}

impl Query {
    /// Create a query over the owner's whole library for one content type.
    pub fn new(question: &str, owner_id: &str, content_type: ContentType) -> Result<Self> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VidsageError::InvalidInput(
                "Question must not be empty".to_string(),
            ));
        }

        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(VidsageError::InvalidInput(
                "Owner id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            question: question.to_string(),
            owner_id: owner_id.to_string(),
            content_type,
            scope_id: None,
            limit: RetrievalSettings::default().default_limit,
        })
    }

    /// Restrict the query to one source. A blank scope is rejected.
    pub fn with_scope(mut self, scope_id: Option<&str>) -> Result<Self> {
        self.scope_id = match scope_id {
            Some(scope) => Some(normalize_source_id(self.content_type, scope).map_err(|_| {
                VidsageError::InvalidInput(format!("Invalid source id: {:?}", scope))
            })?),
            None => None,
        };
        Ok(self)
    }

    /// Apply a requested result limit, falling back to the default when it
    /// is missing or out of range.
    pub fn with_limit(mut self, requested: Option<usize>, settings: &RetrievalSettings) -> Self {
        self.limit = settings.resolve_limit(requested);
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn scope_id(&self) -> Option<&str> {
        self.scope_id.as_deref()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Metadata predicate every retrieved chunk must satisfy.
    pub fn filter(&self) -> SearchFilter {
        let filter = SearchFilter::owner(&self.owner_id).with_content_type(self.content_type);
        match &self.scope_id {
            Some(scope) => filter.with_source(scope),
            None => filter,
        }
    }
}
