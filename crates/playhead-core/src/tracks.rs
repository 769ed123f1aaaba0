//! Track selection
//!
//! Track lists are source-specific: they are cleared on every load and
//! refilled from the surface's track events. Selections are validated
//! against the current lists and fall back silently when stale.

use crate::types::{AudioSelection, SubtitleSelection, TrackRef};
use crate::Error;
use tracing::debug;

/// Audio and subtitle tracks of the current source
#[derive(Debug, Default)]
pub struct TrackSelector {
    audio: Vec<TrackRef>,
    text: Vec<TrackRef>,
    preferred_audio: Option<String>,
    preferred_subtitle: Option<String>,
}

impl TrackSelector {
    pub fn new(preferred_audio: Option<String>, preferred_subtitle: Option<String>) -> Self {
        Self {
            audio: Vec::new(),
            text: Vec::new(),
            preferred_audio,
            preferred_subtitle,
        }
    }

    pub fn audio_tracks(&self) -> &[TrackRef] {
        &self.audio
    }

    pub fn subtitle_tracks(&self) -> &[TrackRef] {
        &self.text
    }

    /// Forget the previous source's tracks
    pub fn clear(&mut self) {
        self.audio.clear();
        self.text.clear();
    }

    pub fn set_audio_tracks(&mut self, tracks: Vec<TrackRef>) {
        self.audio = tracks;
    }

    pub fn set_subtitle_tracks(&mut self, tracks: Vec<TrackRef>) {
        self.text = tracks;
    }

    /// Validate an audio selection, falling back to the system default
    pub fn resolve_audio(&self, selection: &AudioSelection) -> AudioSelection {
        match selection {
            AudioSelection::SystemDefault => AudioSelection::SystemDefault,
            AudioSelection::Track(track) => match find_track(&self.audio, track) {
                Some(found) => AudioSelection::Track(found.clone()),
                None => {
                    let err = Error::TrackSelection { kind: "audio", index: track.index };
                    debug!(error = %err, "Falling back to default audio");
                    AudioSelection::SystemDefault
                }
            },
        }
    }

    /// Validate a subtitle selection, falling back to disabled
    pub fn resolve_subtitle(&self, selection: &SubtitleSelection) -> SubtitleSelection {
        match selection {
            SubtitleSelection::Disabled => SubtitleSelection::Disabled,
            SubtitleSelection::Track(track) => match find_track(&self.text, track) {
                Some(found) => SubtitleSelection::Track(found.clone()),
                None => {
                    let err = Error::TrackSelection { kind: "subtitle", index: track.index };
                    debug!(error = %err, "Disabling subtitles");
                    SubtitleSelection::Disabled
                }
            },
        }
    }

    /// Audio track matching the preferred language, if configured
    pub fn preferred_audio(&self) -> Option<&TrackRef> {
        find_language(&self.audio, self.preferred_audio.as_deref()?)
    }

    /// Subtitle track matching the preferred language, if configured
    pub fn preferred_subtitle(&self) -> Option<&TrackRef> {
        find_language(&self.text, self.preferred_subtitle.as_deref()?)
    }
}

fn find_track<'a>(tracks: &'a [TrackRef], wanted: &TrackRef) -> Option<&'a TrackRef> {
    tracks.iter().find(|track| {
        track.index == wanted.index
            // A same-index track of another language belongs to a different source
            && (wanted.language.is_none() || track.language == wanted.language)
    })
}

fn find_language<'a>(tracks: &'a [TrackRef], language: &str) -> Option<&'a TrackRef> {
    tracks.iter().find(|track| {
        track
            .language
            .as_deref()
            .is_some_and(|code| same_language(code, language))
    })
}

fn same_language(a: &str, b: &str) -> bool {
    let a = normalize_code(a);
    let b = normalize_code(b);
    a == b || (language_name(&a).is_some() && language_name(&a) == language_name(&b))
}

fn normalize_code(code: &str) -> String {
    // "en-US" and "en_US" share the "en" primary subtag
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn language_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "en" | "eng" => "English",
        "es" | "spa" => "Spanish",
        "fr" | "fre" | "fra" => "French",
        "de" | "ger" | "deu" => "German",
        "it" | "ita" => "Italian",
        "pt" | "por" => "Portuguese",
        "ru" | "rus" => "Russian",
        "ja" | "jpn" => "Japanese",
        "ko" | "kor" => "Korean",
        "zh" | "chi" | "zho" => "Chinese",
        "ar" | "ara" => "Arabic",
        "hi" | "hin" => "Hindi",
        "nl" | "dut" | "nld" => "Dutch",
        "sv" | "swe" => "Swedish",
        "no" | "nor" | "nb" | "nob" => "Norwegian",
        "da" | "dan" => "Danish",
        "fi" | "fin" => "Finnish",
        "pl" | "pol" => "Polish",
        "tr" | "tur" => "Turkish",
        "el" | "gre" | "ell" => "Greek",
        "he" | "heb" => "Hebrew",
        "th" | "tha" => "Thai",
        "vi" | "vie" => "Vietnamese",
        "id" | "ind" => "Indonesian",
        "ms" | "may" | "msa" => "Malay",
        "cs" | "cze" | "ces" => "Czech",
        "hu" | "hun" => "Hungarian",
        "ro" | "rum" | "ron" => "Romanian",
        "uk" | "ukr" => "Ukrainian",
        "bg" | "bul" => "Bulgarian",
        "hr" | "hrv" => "Croatian",
        "sr" | "srp" => "Serbian",
        "fa" | "per" | "fas" => "Persian",
        "ta" | "tam" => "Tamil",
        "te" | "tel" => "Telugu",
        "bn" | "ben" => "Bengali",
        "ur" | "urd" => "Urdu",
        "tl" | "tgl" | "fil" => "Filipino",
        _ => return None,
    };
    Some(name)
}

/// Display name for a language code
///
/// Total: unmapped codes come back uppercased, and a blank code reads
/// "Unknown".
pub fn language_display_name(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return "Unknown".to_string();
    }
    match language_name(&normalize_code(trimmed)) {
        Some(name) => name.to_string(),
        None => trimmed.to_uppercase(),
    }
}

/// Label for a track picker row
pub fn track_label(track: &TrackRef) -> String {
    let title = track.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let language = track
        .language
        .as_deref()
        .filter(|code| !code.trim().is_empty())
        .map(language_display_name);

    match (title, language) {
        (Some(title), Some(language)) if !title.eq_ignore_ascii_case(&language) => {
            format!("{title} ({language})")
        }
        (Some(title), _) => title.to_string(),
        (None, Some(language)) => language,
        (None, None) => format!("Track {}", track.index + 1),
    }
}
