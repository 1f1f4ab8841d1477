use crate::models::{Extension, ExtensionEntry, ExtensionId, Filter};

/// Everything the page knows: the loaded list (if any) and the filter.
#[derive(Debug, Default)]
pub struct PageState {
    extensions: Option<Vec<ExtensionEntry>>,
    filter: Filter,
    next_id: u64,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.extensions.is_some()
    }

    /// Replace the list, giving every record a fresh id.
    /// Ids keep counting up across loads, so stale ids never match.
    pub fn load(&mut self, list: Vec<Extension>) {
        let entries = list
            .into_iter()
            .map(|extension| {
                let id = ExtensionId(self.next_id);
                self.next_id += 1;
                ExtensionEntry { id, extension }
            })
            .collect();
        self.extensions = Some(entries);
    }

    pub fn unload(&mut self) {
        self.extensions = None;
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// The full list in load order.
    pub fn all(&self) -> &[ExtensionEntry] {
        self.extensions.as_deref().unwrap_or_default()
    }

    pub fn filtered(&self, filter: Filter) -> Vec<&ExtensionEntry> {
        self.all()
            .iter()
            .filter(|e| filter.matches(&e.extension))
            .collect()
    }

    /// What the grid shows under the current filter.
    pub fn visible(&self) -> Vec<&ExtensionEntry> {
        self.filtered(self.filter)
    }

    pub fn get(&self, id: ExtensionId) -> Option<&ExtensionEntry> {
        self.all().iter().find(|e| e.id == id)
    }

    /// Id of the record at a position in the full list.
    pub fn id_at(&self, index: usize) -> Option<ExtensionId> {
        self.all().get(index).map(|e| e.id)
    }

    pub fn remove(&mut self, id: ExtensionId) -> Option<Extension> {
        let list = self.extensions.as_mut()?;
        let position = list.iter().position(|e| e.id == id)?;
        Some(list.remove(position).extension)
    }

    /// Flip a record's active flag, returning the new value.
    pub fn toggle_active(&mut self, id: ExtensionId) -> Option<bool> {
        let entry = self.extensions.as_mut()?.iter_mut().find(|e| e.id == id)?;
        entry.extension.is_active = !entry.extension.is_active;
        Some(entry.extension.is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Extension> {
        vec![
            Extension::new("DevLens", "Inspect layouts", "devlens.svg", true),
            Extension::new("StyleSpy", "Inspect CSS", "stylespy.svg", true),
            Extension::new("SpeedBoost", "Optimize loading", "speedboost.svg", false),
            Extension::new("JSONWizard", "Format JSON", "jsonwizard.svg", true),
            Extension::new("TabMaster Pro", "Organize tabs", "tabmaster.svg", false),
        ]
    }

    fn names(entries: &[&ExtensionEntry]) -> Vec<String> {
        entries.iter().map(|e| e.extension.name.clone()).collect()
    }

    #[test]
    fn test_filters_keep_relative_order() {
        let mut state = PageState::new();
        state.load(sample());

        assert_eq!(names(&state.filtered(Filter::Active)), ["DevLens", "StyleSpy", "JSONWizard"]);
        assert_eq!(names(&state.filtered(Filter::Inactive)), ["SpeedBoost", "TabMaster Pro"]);
        assert_eq!(state.filtered(Filter::All).len(), 5);
    }

    #[test]
    fn test_remove_by_id_keeps_others_in_order() {
        let mut state = PageState::new();
        state.load(sample());

        for index in 0..5 {
            let mut state = PageState::new();
            state.load(sample());
            let id = state.id_at(index).unwrap();
            let removed = state.remove(id).unwrap();

            let mut expected: Vec<String> = sample().into_iter().map(|e| e.name).collect();
            assert_eq!(removed.name, expected.remove(index));
            assert_eq!(names(&state.visible()), expected);
        }

        let id = state.id_at(1).unwrap();
        state.remove(id);
        assert!(state.remove(id).is_none());
    }

    #[test]
    fn test_ids_survive_earlier_removals() {
        let mut state = PageState::new();
        state.load(sample());
        let last = state.id_at(4).unwrap();
        state.remove(state.id_at(0).unwrap());
        assert_eq!(state.get(last).unwrap().extension.name, "TabMaster Pro");
        assert_eq!(state.id_at(3), Some(last));
    }

    #[test]
    fn test_ids_not_reused_across_loads() {
        let mut state = PageState::new();
        state.load(sample());
        let old = state.id_at(0).unwrap();
        state.load(sample());
        assert!(state.get(old).is_none());
    }

    #[test]
    fn test_toggle_active() {
        let mut state = PageState::new();
        state.load(sample());
        let id = state.id_at(2).unwrap();
        assert_eq!(state.toggle_active(id), Some(true));
        assert_eq!(state.filtered(Filter::Active).len(), 4);
        assert_eq!(state.toggle_active(ExtensionId(999)), None);
    }

    #[test]
    fn test_unloaded_state_is_empty() {
        let mut state = PageState::new();
        assert!(!state.is_loaded());
        assert!(state.visible().is_empty());
        assert!(state.remove(ExtensionId(0)).is_none());
    }
}
