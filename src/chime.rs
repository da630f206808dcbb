//! Audible cue played just before jamaat.

use crate::config::BEEP_SOUND_URL;
use crate::error::{describe_js, CueError};
use log::warn;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

// HTMLMediaElement.HAVE_CURRENT_DATA
const HAVE_CURRENT_DATA: u16 = 2;

pub trait Chime {
    /// Start playback. Failing to play is never fatal to the caller.
    fn play(&self) -> Result<(), CueError>;
}

/// Plays a short sound through an `<audio>` element.
pub struct BrowserChime {
    audio: Option<HtmlAudioElement>,
}

impl BrowserChime {
    pub fn new() -> Self {
        let audio = match HtmlAudioElement::new_with_src(BEEP_SOUND_URL) {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!("Beep sound unavailable: {}", describe_js(&e));
                None
            }
        };
        Self { audio }
    }
}

impl Default for BrowserChime {
    fn default() -> Self {
        Self::new()
    }
}

impl Chime for BrowserChime {
    fn play(&self) -> Result<(), CueError> {
        let audio = self.audio.as_ref().ok_or(CueError::NotReady)?;
        if audio.ready_state() < HAVE_CURRENT_DATA {
            audio.load();
            return Err(CueError::NotReady);
        }
        let promise = audio.play().map_err(|e| CueError::Js(describe_js(&e)))?;
        // Autoplay policies reject asynchronously.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                warn!("Beep sound play failed: {}", describe_js(&e));
            }
        });
        Ok(())
    }
}
