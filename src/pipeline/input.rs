//! Keyboard input simulation for driving the game.
//!
//! All game interaction goes through hardware-level synthetic key events
//! (SendInput), because Minecraft's input layer ignores posted window
//! messages. Events are fire-and-forget: there is no acknowledgement from
//! the game, so callers insert fixed delays between dispatches.
//!
//! On non-Windows targets the functions compile to no-ops so the state
//! machine and its tests build everywhere; `backend_available()` reports
//! whether real input can be dispatched.

/// Named keys the pipeline taps. Mapped to virtual-key codes on Windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    Down,
    Escape,
    Backspace,
    /// The '/' key, which opens the Minecraft chat with a slash prefilled.
    Slash,
}

pub use platform::{
    backend_available, is_stop_key_held, tap_char, tap_char_with_ctrl, tap_key, type_text,
};

#[cfg(windows)]
mod platform {
    use super::Key;
    use anyhow::{anyhow, Result};

    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT,
        KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_BACK, VK_CAPITAL,
        VK_CONTROL, VK_DOWN, VK_ESCAPE, VK_OEM_2, VK_RETURN, VK_TAB,
    };

    pub fn backend_available() -> bool {
        true
    }

    fn virtual_key(key: Key) -> VIRTUAL_KEY {
        match key {
            Key::Tab => VK_TAB,
            Key::Enter => VK_RETURN,
            Key::Down => VK_DOWN,
            Key::Escape => VK_ESCAPE,
            Key::Backspace => VK_BACK,
            Key::Slash => VK_OEM_2,
        }
    }

    /// Builds one keyboard INPUT event.
    fn key_event(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: scan,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        }
    }

    fn dispatch(inputs: &[INPUT]) -> Result<()> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent != inputs.len() as u32 {
            return Err(anyhow!(
                "SendInput dispatched {} of {} events",
                sent,
                inputs.len()
            ));
        }
        Ok(())
    }

    /// Presses and releases a named key.
    pub fn tap_key(key: Key) -> Result<()> {
        let vk = virtual_key(key);
        dispatch(&[
            key_event(vk, 0, KEYBD_EVENT_FLAGS(0)),
            key_event(vk, 0, KEYEVENTF_KEYUP),
        ])
    }

    /// Presses and releases the key for an ASCII letter (e.g. 'e' to open
    /// the inventory). Uses the virtual-key code, not a unicode event, so
    /// the game sees a real keybind press.
    pub fn tap_char(c: char) -> Result<()> {
        let vk = VIRTUAL_KEY(c.to_ascii_uppercase() as u16);
        dispatch(&[
            key_event(vk, 0, KEYBD_EVENT_FLAGS(0)),
            key_event(vk, 0, KEYEVENTF_KEYUP),
        ])
    }

    /// Taps a letter key while Ctrl is held (Ctrl+A, Ctrl+C).
    pub fn tap_char_with_ctrl(c: char) -> Result<()> {
        let vk = VIRTUAL_KEY(c.to_ascii_uppercase() as u16);
        dispatch(&[
            key_event(VK_CONTROL, 0, KEYBD_EVENT_FLAGS(0)),
            key_event(vk, 0, KEYBD_EVENT_FLAGS(0)),
            key_event(vk, 0, KEYEVENTF_KEYUP),
            key_event(VK_CONTROL, 0, KEYEVENTF_KEYUP),
        ])
    }

    /// Types a string as unicode key events, one down/up pair per UTF-16
    /// unit. The chat box receives the text regardless of keyboard layout.
    pub fn type_text(text: &str) -> Result<()> {
        let mut inputs = Vec::with_capacity(text.len() * 2);
        for unit in text.encode_utf16() {
            inputs.push(key_event(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE));
            inputs.push(key_event(
                VIRTUAL_KEY(0),
                unit,
                KEYEVENTF_UNICODE | KEYEVENTF_KEYUP,
            ));
        }
        dispatch(&inputs)
    }

    /// Returns true while the stop key (CapsLock) is physically held.
    pub fn is_stop_key_held() -> bool {
        let state = unsafe { GetAsyncKeyState(VK_CAPITAL.0 as i32) };
        (state as u16 & 0x8000) != 0
    }
}

#[cfg(not(windows))]
mod platform {
    use super::Key;
    use anyhow::Result;

    pub fn backend_available() -> bool {
        false
    }

    pub fn tap_key(_key: Key) -> Result<()> {
        Ok(())
    }

    pub fn tap_char(_c: char) -> Result<()> {
        Ok(())
    }

    pub fn tap_char_with_ctrl(_c: char) -> Result<()> {
        Ok(())
    }

    pub fn type_text(_text: &str) -> Result<()> {
        Ok(())
    }

    pub fn is_stop_key_held() -> bool {
        false
    }
}
