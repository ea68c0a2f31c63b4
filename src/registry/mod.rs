use crate::error::{ExceptionError, Result};
use crate::exception::{RegisteredFilter, RpcFault};
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

/// Ordered store of custom exception filters
///
/// Filters are searched in registration order and the first match wins.
/// Replacing the list swaps an immutable snapshot, so a lookup never holds
/// the lock while a filter runs.
pub struct FilterRegistry {
    filters: RwLock<Arc<[RegisteredFilter]>>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::with_filters(Vec::new())
    }

    pub fn with_filters(filters: Vec<RegisteredFilter>) -> Self {
        Self {
            filters: RwLock::new(Arc::from(filters)),
        }
    }

    /// Replace every stored filter
    ///
    /// Accepts `Vec<RegisteredFilter>`, `Box<[RegisteredFilter]>` or
    /// `Arc<[RegisteredFilter]>`. Anything else, including a lone
    /// `RegisteredFilter`, is rejected and the current list is kept.
    pub fn set_filters<T: Any>(&self, filters: T) -> Result<()> {
        let filters = into_filter_list(filters)?;
        tracing::debug!("Registered {} custom exception filters", filters.len());
        *self.filters.write() = filters;
        Ok(())
    }

    /// First filter, in registration order, that catches `exception`
    pub fn find_match(&self, exception: &RpcFault) -> Option<RegisteredFilter> {
        let filters = self.snapshot();
        if filters.is_empty() {
            return None;
        }
        filters
            .iter()
            .find(|filter| filter.matches(exception))
            .cloned()
    }

    /// The filter list as currently registered
    pub fn snapshot(&self) -> Arc<[RegisteredFilter]> {
        Arc::clone(&self.filters.read())
    }

    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }
}

fn into_filter_list<T: Any>(filters: T) -> Result<Arc<[RegisteredFilter]>> {
    let filters: Box<dyn Any> = Box::new(filters);
    let filters = match filters.downcast::<Vec<RegisteredFilter>>() {
        Ok(list) => return Ok(Arc::from(*list)),
        Err(other) => other,
    };
    let filters = match filters.downcast::<Box<[RegisteredFilter]>>() {
        Ok(list) => return Ok(Arc::from(*list)),
        Err(other) => other,
    };
    match filters.downcast::<Arc<[RegisteredFilter]>>() {
        Ok(list) => Ok(*list),
        Err(_) => Err(ExceptionError::invalid_filters(std::any::type_name::<T>())),
    }
}
