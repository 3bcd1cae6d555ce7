//! Sound engine implementations

use crossbeam_channel::{unbounded, Receiver, Sender};
use harmonia_core::{Note, SoundEngine};
use tracing::{debug, info};

/// Logs every chord and note with its frequency instead of rendering audio
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSoundEngine {
    pub use_flats: bool,
}

impl TracingSoundEngine {
    pub fn new(use_flats: bool) -> Self {
        Self { use_flats }
    }

    fn describe(&self, note: &Note) -> String {
        format!("{} ({:.2} Hz)", note.spelled(self.use_flats), note.frequency())
    }
}

impl SoundEngine for TracingSoundEngine {
    fn play_chord(&mut self, notes: &[Note]) {
        let described: Vec<String> = notes.iter().map(|n| self.describe(n)).collect();
        info!(notes = %described.join(", "), "Chord");
    }

    fn play_note(&mut self, note: Note) {
        info!(note = %self.describe(&note), "Note");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundEvent {
    Chord(Vec<Note>),
    Note(Note),
}

/// Forwards sound requests to another thread (e.g. an audio callback owner)
#[derive(Debug, Clone)]
pub struct ChannelSoundEngine {
    tx: Sender<SoundEvent>,
}

impl ChannelSoundEngine {
    pub fn new() -> (Self, Receiver<SoundEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SoundEvent) {
        if self.tx.send(event).is_err() {
            debug!("Sound receiver dropped");
        }
    }
}

impl SoundEngine for ChannelSoundEngine {
    fn play_chord(&mut self, notes: &[Note]) {
        self.forward(SoundEvent::Chord(notes.to_vec()));
    }

    fn play_note(&mut self, note: Note) {
        self.forward(SoundEvent::Note(note));
    }
}
