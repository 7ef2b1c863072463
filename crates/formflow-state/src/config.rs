//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::paging::{PageMode, PageSize, PagingError, DEFAULT_PAGE_SIZE};

/// Default key under which snapshots are stored.
pub const DEFAULT_STORAGE_KEY: &str = "formflow-data";

/// Settings a [`FormSession`](crate::FormSession) starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SessionConfig {
    /// Key of the stored snapshot.
    pub storage_key: String,
    /// Start in multi-step mode.
    pub multi_step: bool,
    /// Questions per page in multi-step mode, 2 to 6.
    pub page_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            multi_step: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SessionConfig {
    /// The initial page mode. Fails if `page_size` is out of range, even in
    /// single mode.
    pub fn page_mode(&self) -> Result<PageMode, PagingError> {
        let size = PageSize::new(self.page_size)?;
        Ok(if self.multi_step {
            PageMode::MultiStep(size)
        } else {
            PageMode::Single
        })
    }
}
