//! Listing and search criteria.

use super::Contact;

/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Errors raised while building query criteria.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryValidationError {
    /// Every search filter was absent or empty.
    #[error("No search parameters provided")]
    NoSearchFilters,
    /// Page limit was outside `1..=MAX_PAGE_LIMIT`.
    #[error("limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}")]
    LimitOutOfRange { limit: u32 },
}

/// Offset pagination over contacts ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    skip: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request, applying defaults for absent values.
    pub fn new(skip: Option<u32>, limit: Option<u32>) -> Result<Self, QueryValidationError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(QueryValidationError::LimitOutOfRange { limit });
        }
        Ok(Self {
            skip: skip.unwrap_or(0),
            limit,
        })
    }

    /// Number of leading records to skip.
    #[must_use]
    pub const fn skip(&self) -> u32 {
        self.skip
    }

    /// Maximum number of records to return.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Exact-match search filters combined with AND.
///
/// Empty strings count as absent; at least one filter must remain.
///
/// # Examples
/// ```
/// use contacts_backend::domain::ContactSearch;
///
/// let search = ContactSearch::new(Some("Ada".into()), Some(String::new()), None).unwrap();
/// assert_eq!(search.first_name(), Some("Ada"));
/// assert_eq!(search.last_name(), None);
/// assert!(ContactSearch::new(None, None, Some(String::new())).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSearch {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

impl ContactSearch {
    /// Build a search from optional raw filters.
    pub fn new(
        first_name: Option<String>,
        last_name: Option<String>,
        email: Option<String>,
    ) -> Result<Self, QueryValidationError> {
        let search = Self {
            first_name: first_name.filter(|value| !value.is_empty()),
            last_name: last_name.filter(|value| !value.is_empty()),
            email: email.filter(|value| !value.is_empty()),
        };
        if search.first_name.is_none() && search.last_name.is_none() && search.email.is_none() {
            return Err(QueryValidationError::NoSearchFilters);
        }
        Ok(search)
    }

    /// First-name filter, if set.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Last-name filter, if set.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Email filter, if set.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Whether `contact` satisfies every present filter.
    pub fn matches(&self, contact: &Contact) -> bool {
        let field_matches =
            |filter: Option<&str>, value: &str| filter.is_none_or(|expected| expected == value);
        field_matches(self.first_name(), contact.first_name.as_str())
            && field_matches(self.last_name(), contact.last_name.as_str())
            && field_matches(self.email(), contact.email.as_str())
    }
}
