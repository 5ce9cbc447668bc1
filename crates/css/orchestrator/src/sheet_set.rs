//! The ordered set of stylesheets attached to a document.
//!
//! The set is shared between the document mirror (embedded `<style>` sheets) and
//! the loader (linked sheets), so it is a cheap clonable handle around a lock.
//! Each attach hands out a fresh block of global source orders; a replaced sheet
//! therefore orders after everything attached before it.

use css_media_queries::MediaEnvironment;
use log::debug;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::dom::NodeKey;
use crate::types::{Rule, Stylesheet};

/// A sheet as seen by the resolver.
#[derive(Clone, Debug)]
pub struct AttachedSheet {
    /// Element that owns the sheet (`<style>` or `<link>`).
    pub owner: NodeKey,
    pub sheet: Arc<Stylesheet>,
    /// Global source order of the sheet's first rule.
    pub base_order: u32,
    /// Whether an alternate sheet has been selected by the user.
    pub selected: bool,
}

impl AttachedSheet {
    /// Global source order of `rule`, which must belong to this sheet.
    #[inline]
    pub const fn source_order(&self, rule: &Rule) -> u32 {
        self.base_order.saturating_add(rule.index)
    }

    /// Whether the sheet contributes to the cascade under `environment`.
    pub fn is_active(&self, environment: &MediaEnvironment) -> bool {
        if self.sheet.disabled || (self.sheet.alternate && !self.selected) {
            return false;
        }
        environment.matches_text(&self.sheet.media)
    }
}

#[derive(Debug, Default)]
struct SheetSetState {
    sheets: Vec<AttachedSheet>,
    next_order: u32,
    selected_alternates: HashSet<NodeKey>,
    /// Owners detached since their last attach. Late loads for them are refused.
    retired: HashSet<NodeKey>,
}

/// Shared handle to the attached sheets of one document.
#[derive(Clone, Debug, Default)]
pub struct StyleSheetSet {
    state: Arc<RwLock<SheetSetState>>,
}

impl StyleSheetSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `sheet` for `owner`, replacing whatever `owner` had attached.
    /// Returns the base source order given to the sheet.
    #[inline]
    pub fn attach(&self, owner: NodeKey, sheet: Stylesheet) -> u32 {
        self.attach_shared(owner, Arc::new(sheet))
    }

    /// Attach an already shared sheet. See [`StyleSheetSet::attach`].
    pub fn attach_shared(&self, owner: NodeKey, sheet: Arc<Stylesheet>) -> u32 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.retired.remove(&owner);
        Self::push_sheet(&mut state, owner, sheet)
    }

    /// Attach `sheet` unless `owner` was detached and not revived since.
    /// Loads that finish after their owner left the document use this.
    pub fn attach_if_live(&self, owner: NodeKey, sheet: Stylesheet) -> Option<u32> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.retired.contains(&owner) {
            debug!("Refusing sheet for detached owner {owner:?}");
            return None;
        }
        Some(Self::push_sheet(&mut state, owner, Arc::new(sheet)))
    }

    /// Allow late loads for `owner` to attach again after a `detach`.
    pub fn revive(&self, owner: NodeKey) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retired
            .remove(&owner);
    }

    fn push_sheet(state: &mut SheetSetState, owner: NodeKey, sheet: Arc<Stylesheet>) -> u32 {
        let base_order = state.next_order;
        let span = u32::try_from(sheet.len()).unwrap_or(u32::MAX).max(1);
        state.next_order = base_order.saturating_add(span);
        let selected = state.selected_alternates.contains(&owner);
        let replaced = state.sheets.iter().any(|entry| entry.owner == owner);
        state.sheets.retain(|entry| entry.owner != owner);
        debug!(
            "Attaching sheet for {owner:?}: {} rules at order {base_order} (replaced: {replaced})",
            sheet.len()
        );
        state.sheets.push(AttachedSheet {
            owner,
            sheet,
            base_order,
            selected,
        });
        base_order
    }

    /// Remove the sheet owned by `owner`, returning it if there was one.
    /// Until `owner` attaches or is revived, `attach_if_live` refuses it.
    pub fn detach(&self, owner: NodeKey) -> Option<Arc<Stylesheet>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.selected_alternates.remove(&owner);
        state.retired.insert(owner);
        let position = state.sheets.iter().position(|entry| entry.owner == owner)?;
        debug!("Detaching sheet for {owner:?}");
        Some(state.sheets.remove(position).sheet)
    }

    /// Select or deselect the alternate sheet of `owner`. The choice sticks across
    /// replacements of that owner's sheet.
    pub fn select_alternate(&self, owner: NodeKey, selected: bool) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if selected {
            state.selected_alternates.insert(owner);
        } else {
            state.selected_alternates.remove(&owner);
        }
        for entry in state.sheets.iter_mut().filter(|entry| entry.owner == owner) {
            entry.selected = selected;
        }
    }

    /// The sheet currently attached for `owner`.
    pub fn sheet_for(&self, owner: NodeKey) -> Option<Arc<Stylesheet>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .sheets
            .iter()
            .find(|entry| entry.owner == owner)
            .map(|entry| Arc::clone(&entry.sheet))
    }

    /// Consistent copy of the attached sheets in attach order.
    pub fn snapshot(&self) -> Vec<AttachedSheet> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.sheets.clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sheets
            .len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
