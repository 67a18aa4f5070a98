//! Cache generations and the controller slot.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// One build's set of store names. Exactly these stores survive activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub id: String,
    pub static_store: String,
    pub dynamic_store: String,
}

impl Generation {
    pub fn new(
        id: impl Into<String>,
        static_store: impl Into<String>,
        dynamic_store: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            static_store: static_store.into(),
            dynamic_store: dynamic_store.into(),
        }
    }

    pub fn expected_stores(&self) -> [&str; 2] {
        [&self.static_store, &self.dynamic_store]
    }

    pub fn owns(&self, store: &str) -> bool {
        self.expected_stores().contains(&store)
    }
}

/// Which generation currently controls traffic. Shared by every generation
/// built against the same registry.
#[derive(Debug, Default)]
pub struct ControllerSlot {
    current: ArcSwapOption<String>,
}

impl ControllerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<String>> {
        self.current.load_full()
    }

    pub fn is_attached(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn is(&self, generation_id: &str) -> bool {
        self.current
            .load()
            .as_deref()
            .map(|id| id.as_str() == generation_id)
            .unwrap_or(false)
    }

    /// Hand control to `generation_id`, returning the previous controller.
    pub fn claim(&self, generation_id: &str) -> Option<Arc<String>> {
        self.current.swap(Some(Arc::new(generation_id.to_string())))
    }

    /// Empty the slot, but only while `generation_id` holds it.
    pub fn release_if(&self, generation_id: &str) -> bool {
        let current = self.current.load_full();
        match current {
            Some(ref id) if id.as_str() == generation_id => {
                let prev = self.current.compare_and_swap(&current, None::<Arc<String>>);
                matches!(&*prev, Some(p) if Arc::ptr_eq(p, id))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_replaces_controller() {
        let slot = ControllerSlot::new();
        assert!(!slot.is_attached());
        assert!(slot.claim("v1").is_none());
        assert!(slot.is("v1"));
        let prev = slot.claim("v2").unwrap();
        assert_eq!(prev.as_str(), "v1");
        assert!(slot.is("v2"));
        assert!(!slot.is("v1"));
    }

    #[test]
    fn test_release_only_by_holder() {
        let slot = ControllerSlot::new();
        slot.claim("v1");
        assert!(!slot.release_if("v2"));
        assert!(slot.is("v1"));
        assert!(slot.release_if("v1"));
        assert!(!slot.is_attached());
        assert!(!slot.release_if("v1"));
    }

    #[test]
    fn test_generation_owns_only_its_stores() {
        let g = Generation::new("v3", "static-v3", "dynamic-v2");
        assert!(g.owns("static-v3"));
        assert!(g.owns("dynamic-v2"));
        assert!(!g.owns("static-v2"));
    }
}
