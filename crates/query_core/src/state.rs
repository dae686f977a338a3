//! Query phase record and the merge reducer applied to it.

use crate::error::QueryError;

/// Merged lifecycle record for one query. `data` and `error` are mutually
/// exclusive; the controller only ever applies patches that keep it so.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<QueryError>,
    pub fetching: bool,
    pub loaded: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetching: false,
            loaded: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Fetching,
    Loaded,
    Errored,
}

impl<T> QueryState<T> {
    /// Resolves the flag combination into a single phase. A refetch keeps
    /// the previous `data`/`loaded` fields visible, so `fetching` takes
    /// precedence over them.
    pub fn phase(&self) -> QueryPhase {
        if self.fetching {
            QueryPhase::Fetching
        } else if self.error.is_some() {
            QueryPhase::Errored
        } else if self.loaded {
            QueryPhase::Loaded
        } else {
            QueryPhase::Idle
        }
    }
}

impl<T: Clone> QueryState<T> {
    /// Pure union: every present patch field overwrites, absent fields are
    /// preserved from `self`.
    pub fn merge(&self, patch: QueryPatch<T>) -> Self {
        Self {
            data: patch.data.unwrap_or_else(|| self.data.clone()),
            error: patch.error.unwrap_or_else(|| self.error.clone()),
            fetching: patch.fetching.unwrap_or(self.fetching),
            loaded: patch.loaded.unwrap_or(self.loaded),
        }
    }
}

/// Partial update over [`QueryState`]: `Some` means overwrite the field,
/// `None` means leave it alone.
#[derive(Debug, Clone)]
pub struct QueryPatch<T> {
    pub data: Option<Option<T>>,
    pub error: Option<Option<QueryError>>,
    pub fetching: Option<bool>,
    pub loaded: Option<bool>,
}

impl<T> Default for QueryPatch<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetching: None,
            loaded: None,
        }
    }
}

impl<T> QueryPatch<T> {
    pub fn fetch_started() -> Self {
        Self {
            fetching: Some(true),
            ..Self::default()
        }
    }

    pub fn resolved(data: T) -> Self {
        Self {
            data: Some(Some(data)),
            error: Some(None),
            fetching: Some(false),
            loaded: Some(true),
        }
    }

    pub fn rejected(error: QueryError) -> Self {
        Self {
            data: Some(None),
            error: Some(Some(error)),
            fetching: Some(false),
            loaded: Some(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_present_fields_and_preserves_the_rest() {
        let state = QueryState {
            data: Some(1),
            error: None,
            fetching: false,
            loaded: true,
        };

        let merged = state.merge(QueryPatch {
            fetching: Some(true),
            ..QueryPatch::default()
        });

        assert_eq!(merged.data, Some(1));
        assert!(merged.loaded);
        assert!(merged.fetching);
        assert_eq!(merged.error, None);
    }

    #[test]
    fn resolved_patch_clears_error_and_stops_fetching() {
        let errored = QueryState::<i32>::default().merge(QueryPatch::rejected(
            QueryError::Transport("boom".to_string()),
        ));

        let merged = errored.merge(QueryPatch::resolved(7));

        assert_eq!(merged.data, Some(7));
        assert_eq!(merged.error, None);
        assert!(merged.loaded);
        assert!(!merged.fetching);
    }

    #[test]
    fn rejected_patch_clears_data_and_loaded() {
        let loaded = QueryState::<i32>::default().merge(QueryPatch::resolved(7));

        let merged = loaded.merge(QueryPatch::rejected(QueryError::Unavailable));

        assert_eq!(merged.data, None);
        assert_eq!(merged.error, Some(QueryError::Unavailable));
        assert!(!merged.loaded);
        assert!(!merged.fetching);
    }

    #[test]
    fn refetch_keeps_previous_data_visible() {
        let loaded = QueryState::<i32>::default().merge(QueryPatch::resolved(7));

        let refetching = loaded.merge(QueryPatch::fetch_started());

        assert_eq!(refetching.data, Some(7));
        assert!(refetching.loaded);
        assert_eq!(refetching.phase(), QueryPhase::Fetching);
    }

    #[test]
    fn patches_fold_left_to_the_terminal_state() {
        let folded = QueryState::<i32>::default()
            .merge(QueryPatch::fetch_started())
            .merge(QueryPatch::resolved(7));

        let direct = QueryState::<i32>::default().merge(QueryPatch::resolved(7));

        assert_eq!(folded, direct);
    }

    #[test]
    fn phase_resolution_covers_all_flag_combinations() {
        let idle = QueryState::<i32>::default();
        assert_eq!(idle.phase(), QueryPhase::Idle);

        let fetching = idle.merge(QueryPatch::fetch_started());
        assert_eq!(fetching.phase(), QueryPhase::Fetching);

        let loaded = fetching.merge(QueryPatch::resolved(7));
        assert_eq!(loaded.phase(), QueryPhase::Loaded);

        let errored = loaded.merge(QueryPatch::rejected(QueryError::Unavailable));
        assert_eq!(errored.phase(), QueryPhase::Errored);
    }
}
