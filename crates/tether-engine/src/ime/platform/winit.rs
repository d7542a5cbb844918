use std::sync::Arc;

use winit::event::Ime;
use winit::window::Window;

use crate::error::PlatformError;
use crate::ime::{
    CompositionHandle, CompositionNotification, CompositionUpdate, ImeBackend, WindowHandle,
};

/// [`ImeBackend`] for a winit window.
///
/// winit owns the input-method context, so "association" maps onto
/// `Window::set_ime_allowed` and composition handles are plain counters.
pub struct WinitImeBackend {
    window: Arc<Window>,
    next_handle: u64,
}

impl WinitImeBackend {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_handle: 1,
        }
    }

    pub fn window_handle(&self) -> WindowHandle {
        WindowHandle::from(self.window.id())
    }
}

impl ImeBackend for WinitImeBackend {
    fn create_composition(
        &mut self,
        window: WindowHandle,
    ) -> Result<CompositionHandle, PlatformError> {
        if window != self.window_handle() {
            return Err(PlatformError::native(
                "create_composition",
                format!("{window:?} is not the window this backend was built for"),
            ));
        }
        let handle = CompositionHandle(self.next_handle);
        self.next_handle += 1;
        Ok(handle)
    }

    fn destroy_composition(&mut self, _composition: CompositionHandle) {}

    fn set_association(&mut self, _window: WindowHandle, composition: Option<CompositionHandle>) {
        self.window.set_ime_allowed(composition.is_some());
    }
}

/// Converts winit IME events into composition notifications.
///
/// winit has no explicit start/end messages, so the translator tracks
/// whether a composition is open: the first non-empty pre-edit starts one,
/// an empty pre-edit, a commit, or disabling ends it.
#[derive(Debug, Default)]
pub struct ImeTranslator {
    open: bool,
}

impl ImeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn translate(&mut self, ime: &Ime) -> Vec<CompositionNotification> {
        let mut out = Vec::new();
        match ime {
            Ime::Enabled => {}

            Ime::Preedit(text, _) if text.is_empty() => self.close(&mut out),

            Ime::Preedit(text, cursor) => {
                self.open(&mut out);
                out.push(CompositionNotification::Update(CompositionUpdate {
                    compose: Some(text.clone()),
                    cursor: cursor.map(|(start, _)| char_index(text, start)),
                    result: None,
                }));
            }

            Ime::Commit(text) => {
                self.open(&mut out);
                out.push(CompositionNotification::Update(CompositionUpdate {
                    result: Some(text.clone()),
                    ..Default::default()
                }));
                self.close(&mut out);
            }

            Ime::Disabled => self.close(&mut out),
        }
        out
    }

    fn open(&mut self, out: &mut Vec<CompositionNotification>) {
        if !self.open {
            self.open = true;
            out.push(CompositionNotification::Start);
        }
    }

    fn close(&mut self, out: &mut Vec<CompositionNotification>) {
        if self.open {
            self.open = false;
            out.push(CompositionNotification::End);
        }
    }
}

/// Character index of byte offset `byte` in `text`.
fn char_index(text: &str, byte: usize) -> i32 {
    let prefix = text.get(..byte).unwrap_or(text);
    i32::try_from(prefix.chars().count()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preedit(text: &str, cursor: Option<(usize, usize)>) -> Ime {
        Ime::Preedit(text.to_string(), cursor)
    }

    #[test]
    fn first_preedit_opens_a_composition() {
        let mut translator = ImeTranslator::new();
        let out = translator.translate(&preedit("ka", Some((2, 2))));

        assert_eq!(
            out,
            [
                CompositionNotification::Start,
                CompositionNotification::Update(CompositionUpdate {
                    compose: Some("ka".into()),
                    cursor: Some(2),
                    result: None,
                }),
            ]
        );
        assert!(translator.is_open());
    }

    #[test]
    fn cursor_is_converted_to_characters() {
        let mut translator = ImeTranslator::new();
        // "かな" is six bytes; byte 3 is after the first character.
        let out = translator.translate(&preedit("かな", Some((3, 3))));

        let CompositionNotification::Update(update) = &out[1] else {
            panic!("expected an update, got {out:?}");
        };
        assert_eq!(update.cursor, Some(1));
    }

    #[test]
    fn empty_preedit_closes_an_open_composition() {
        let mut translator = ImeTranslator::new();
        translator.translate(&preedit("a", None));

        assert_eq!(translator.translate(&preedit("", None)), [CompositionNotification::End]);
        assert!(translator.translate(&preedit("", None)).is_empty());
    }

    #[test]
    fn commit_is_a_result_inside_its_own_composition() {
        let mut translator = ImeTranslator::new();
        let out = translator.translate(&Ime::Commit("漢字".into()));

        assert_eq!(
            out,
            [
                CompositionNotification::Start,
                CompositionNotification::Update(CompositionUpdate {
                    result: Some("漢字".into()),
                    ..Default::default()
                }),
                CompositionNotification::End,
            ]
        );
        assert!(!translator.is_open());
    }

    #[test]
    fn enable_and_disable_only_close() {
        let mut translator = ImeTranslator::new();
        assert!(translator.translate(&Ime::Enabled).is_empty());
        assert!(translator.translate(&Ime::Disabled).is_empty());

        translator.translate(&preedit("x", None));
        assert_eq!(translator.translate(&Ime::Disabled), [CompositionNotification::End]);
    }
}
