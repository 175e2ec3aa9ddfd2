use glam::Vec2;
use mekanix_kernel::{PartEnd, PropertyEdit};
use serde::{Deserialize, Serialize};

/// The active editing tool. It decides what a pointer-down on the level does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    /// Select and drag.
    #[default]
    Move,
    /// Click empty space to place a platform.
    Platform,
    /// Click a part to grow a limb from it.
    Player,
    /// Click a joint to toggle its muscle.
    Controls,
    /// Click anything to remove it.
    Delete,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Move,
        Tool::Platform,
        Tool::Player,
        Tool::Controls,
        Tool::Delete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Platform => "platform",
            Self::Player => "player",
            Self::Controls => "controls",
            Self::Delete => "delete",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A toolbar or keyboard command. The session consumes these, never widget
/// events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectTool(Tool),
    /// Place a default platform centered at a world point.
    AddPlatform(Vec2),
    /// Grow a limb from the selected part's head or tail.
    AddConnectedPart(PartEnd),
    DeleteSelected,
    /// Edit a field of the selected entity.
    SetProperty(PropertyEdit),
    TogglePlay,
    Deselect,
    /// Throw away edits and reload the level the session started with.
    ResetLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_labels_roundtrip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_label(tool.label()), Some(tool));
        }
        assert_eq!(Tool::from_label("lasso"), None);
        assert_eq!(Tool::default(), Tool::Move);
    }

    #[test]
    fn set_property_carries_edit() {
        let a = Action::SetProperty(PropertyEdit::Width(40.0));
        assert!(matches!(a, Action::SetProperty(PropertyEdit::Width(w)) if w == 40.0));
        assert_eq!(format!("{}", Tool::Controls), "controls");
    }
}
