use tracing::debug;

use crate::error::ApiError;
use crate::store::fence::{Fence, Ticket};
use crate::types::{List, ListId};

/// All lists of the signed-in user and the one the task view is scoped to.
///
/// `lists` is `None` until the first fetch. Whenever `lists` is non-empty,
/// `current` names one of its entries; it is `None` only for an empty or
/// unloaded collection.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub lists: Option<Vec<List>>,
    pub current: Option<ListId>,
    pub is_loading: bool,
    fence: Fence,
}

impl ListState {
    pub fn begin_fetch(&mut self, force: bool, authenticated: bool) -> Option<Ticket> {
        if !force && (self.lists.is_some() || self.is_loading) {
            return None;
        }
        if !authenticated {
            return None;
        }
        self.is_loading = true;
        Some(self.fence.issue())
    }

    pub fn finish_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<List>, ApiError>,
    ) -> Result<(), ApiError> {
        let current = self.fence.is_current(ticket);
        if current {
            self.is_loading = false;
        }
        let lists = result?;
        if current {
            self.replace(lists);
        } else {
            debug!("discarding stale lists response");
        }
        Ok(())
    }

    /// Replace the collection and select its first entry.
    pub fn replace(&mut self, lists: Vec<List>) {
        self.current = lists.first().map(|list| list.id.clone());
        self.lists = Some(lists);
    }

    /// Append a newly created list. Selects it when nothing was selected.
    /// An unloaded collection stays unloaded so the next fetch sees every list.
    pub fn add(&mut self, list: List) {
        let Some(lists) = self.lists.as_mut() else {
            return;
        };
        if self.current.is_none() {
            self.current = Some(list.id.clone());
        }
        lists.push(list);
    }

    pub fn rename(&mut self, id: &ListId, title: &str) {
        if let Some(list) = self
            .lists
            .iter_mut()
            .flatten()
            .find(|list| &list.id == id)
        {
            list.title = title.to_string();
        }
    }

    pub fn remove(&mut self, id: &ListId) {
        let Some(lists) = self.lists.as_mut() else {
            return;
        };
        lists.retain(|list| &list.id != id);
        if self.current.as_ref() == Some(id) {
            self.current = lists.first().map(|list| list.id.clone());
        }
    }

    /// Select a loaded list. Returns `false` (and changes nothing) for an id
    /// that is not in the collection.
    pub fn set_current(&mut self, id: &ListId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.current = Some(id.clone());
        true
    }

    pub fn get(&self, id: &ListId) -> Option<&List> {
        self.lists.iter().flatten().find(|list| &list.id == id)
    }

    pub fn current_list(&self) -> Option<&List> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    pub fn reset(&mut self) {
        self.lists = None;
        self.current = None;
        self.is_loading = false;
        self.fence.invalidate();
    }
}
