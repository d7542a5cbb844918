/// Composition event states.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CompositionState {
    #[default]
    None,
    Start,
    End,
    Compose,
    Result,
}

/// One step of an input-method composition.
///
/// Queued events carry only the field their notification updated; the other
/// fields keep their reset values.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CompositionEvent {
    pub text: Option<String>,
    pub cursor_position: i32,
    pub state: CompositionState,
}

impl CompositionEvent {
    pub fn start() -> Self {
        Self {
            state: CompositionState::Start,
            ..Self::default()
        }
    }

    pub fn end() -> Self {
        Self {
            state: CompositionState::End,
            ..Self::default()
        }
    }

    /// Committed text.
    pub fn result(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            state: CompositionState::Result,
            ..Self::default()
        }
    }

    /// In-progress composition text.
    pub fn compose(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            state: CompositionState::Compose,
            ..Self::default()
        }
    }

    /// Cursor movement inside the composition text, in characters.
    pub fn cursor(position: i32) -> Self {
        Self {
            cursor_position: position,
            state: CompositionState::Compose,
            ..Self::default()
        }
    }

    /// Back to state `None`, no text, cursor 0.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
