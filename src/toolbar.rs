//! Capability table behind the toolbar.
//!
//! The shell renders whatever [`Toolbar::actions`] holds and dispatches on
//! [`ToolEffect`]; adding an action means adding a row here.

use crate::store::DatasetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledWhen {
    Always,
    /// A dataset is active and its rows have arrived.
    DatasetLoaded,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEffect {
    /// `GET /analysis/{id}/` and show the summary.
    Analyze,
    /// `GET /export/` for the chosen format and write the file.
    Export,
    NotImplemented,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAction {
    pub name: &'static str,
    pub tooltip: &'static str,
    pub enabled_when: EnabledWhen,
    pub effect: ToolEffect,
}

impl ToolAction {
    pub fn is_enabled(&self, store: &DatasetStore) -> bool {
        match self.enabled_when {
            EnabledWhen::Always => true,
            EnabledWhen::DatasetLoaded => store.active().is_some() && !store.is_fetching(),
            EnabledWhen::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar {
    actions: Vec<ToolAction>,
}

impl Default for Toolbar {
    fn default() -> Self {
        Self {
            actions: vec![
                ToolAction {
                    name: "Analyze",
                    tooltip: "Summary statistics for the active dataset",
                    enabled_when: EnabledWhen::DatasetLoaded,
                    effect: ToolEffect::Analyze,
                },
                ToolAction {
                    name: "Visualize",
                    tooltip: "Not available yet",
                    enabled_when: EnabledWhen::Never,
                    effect: ToolEffect::NotImplemented,
                },
                ToolAction {
                    name: "Transform",
                    tooltip: "Not available yet",
                    enabled_when: EnabledWhen::Never,
                    effect: ToolEffect::NotImplemented,
                },
                ToolAction {
                    name: "Export",
                    tooltip: "Download the active dataset",
                    enabled_when: EnabledWhen::DatasetLoaded,
                    effect: ToolEffect::Export,
                },
            ],
        }
    }
}

impl Toolbar {
    pub fn actions(&self) -> &[ToolAction] {
        &self.actions
    }

    pub fn find(&self, name: &str) -> Option<&ToolAction> {
        self.actions.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Adds `action`, replacing an existing one of the same name.
    #[must_use]
    pub fn with_action(mut self, action: ToolAction) -> Self {
        if let Some(existing) = self.actions.iter_mut().find(|a| a.name == action.name) {
            *existing = action;
        } else {
            self.actions.push(action);
        }
        self
    }
}
