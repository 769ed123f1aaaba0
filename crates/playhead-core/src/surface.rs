//! Playback surface seam
//!
//! The decode/render engine is a black box: the controller sends it
//! [`SurfaceCommand`]s and receives [`SurfaceEvent`]s through the host.

use crate::types::{AudioSelection, SubtitleSelection, TrackRef};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Commands understood by the playback surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SurfaceCommand {
    Load { uri: String },
    Seek { time: f64 },
    SetPaused { paused: bool },
    SetRate { rate: f64 },
    SetVolume { level: f64 },
    SelectAudioTrack { selection: AudioSelection },
    SelectTextTrack { selection: SubtitleSelection },
}

/// Events emitted by the playback surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    /// Source loaded and ready to play
    Loaded { duration: f64 },
    /// Periodic position report
    Progress {
        time: f64,
        playable_duration: f64,
        seekable_duration: f64,
    },
    /// Buffering started or stopped
    Buffering { active: bool },
    /// Surface finished moving to a new position
    SeekComplete { time: f64 },
    /// Fatal error
    Error { message: String },
    AudioTracks { tracks: Vec<TrackRef> },
    TextTracks { tracks: Vec<TrackRef> },
    /// End of content reached
    Ended,
}

/// The video surface driven by the controller
pub trait PlaybackSurface: Send {
    fn load(&mut self, uri: &str);
    fn seek(&mut self, time: f64);
    fn set_paused(&mut self, paused: bool);
    fn set_rate(&mut self, rate: f64);
    fn set_volume(&mut self, level: f64);
    fn set_selected_audio_track(&mut self, selection: &AudioSelection);
    fn set_selected_text_track(&mut self, selection: &SubtitleSelection);

    /// Dispatch a command to the matching primitive
    fn apply(&mut self, command: &SurfaceCommand) {
        match command {
            SurfaceCommand::Load { uri } => self.load(uri),
            SurfaceCommand::Seek { time } => self.seek(*time),
            SurfaceCommand::SetPaused { paused } => self.set_paused(*paused),
            SurfaceCommand::SetRate { rate } => self.set_rate(*rate),
            SurfaceCommand::SetVolume { level } => self.set_volume(*level),
            SurfaceCommand::SelectAudioTrack { selection } => self.set_selected_audio_track(selection),
            SurfaceCommand::SelectTextTrack { selection } => self.set_selected_text_track(selection),
        }
    }
}

/// Surface that records every command it receives
///
/// Clones share the same log, so a host or test can keep one handle while
/// the runtime owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    log: Arc<Mutex<Vec<SurfaceCommand>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<SurfaceCommand> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Seek targets received so far
    pub fn seeks(&self) -> Vec<f64> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                SurfaceCommand::Seek { time } => Some(time),
                _ => None,
            })
            .collect()
    }

    fn record(&self, command: SurfaceCommand) {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command);
    }
}

impl PlaybackSurface for RecordingSurface {
    fn load(&mut self, uri: &str) {
        self.record(SurfaceCommand::Load { uri: uri.to_string() });
    }

    fn seek(&mut self, time: f64) {
        self.record(SurfaceCommand::Seek { time });
    }

    fn set_paused(&mut self, paused: bool) {
        self.record(SurfaceCommand::SetPaused { paused });
    }

    fn set_rate(&mut self, rate: f64) {
        self.record(SurfaceCommand::SetRate { rate });
    }

    fn set_volume(&mut self, level: f64) {
        self.record(SurfaceCommand::SetVolume { level });
    }

    fn set_selected_audio_track(&mut self, selection: &AudioSelection) {
        self.record(SurfaceCommand::SelectAudioTrack { selection: selection.clone() });
    }

    fn set_selected_text_track(&mut self, selection: &SubtitleSelection) {
        self.record(SurfaceCommand::SelectTextTrack { selection: selection.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_dispatches_to_primitives() {
        let recorder = RecordingSurface::new();
        let mut surface = recorder.clone();

        surface.apply(&SurfaceCommand::Load { uri: "https://cdn.example.com/a.m3u8".into() });
        surface.apply(&SurfaceCommand::Seek { time: 42.0 });
        surface.apply(&SurfaceCommand::SelectTextTrack { selection: SubtitleSelection::Disabled });

        assert_eq!(recorder.commands().len(), 3);
        assert_eq!(recorder.seeks(), vec![42.0]);
    }

    #[test]
    fn test_event_wire_format() {
        let event: SurfaceEvent = serde_json::from_str(
            r#"{"event":"progress","time":12.5,"playable_duration":30.0,"seekable_duration":600.0}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            SurfaceEvent::Progress {
                time: 12.5,
                playable_duration: 30.0,
                seekable_duration: 600.0
            }
        );
    }
}
