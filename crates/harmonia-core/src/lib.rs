//! harmonia-core: Tonal harmony and progression playback

pub mod chord;
pub mod engine;
mod error;
pub mod harmonic_field;
pub mod note;
pub mod progression;
pub mod scale;
pub mod sequencer;
pub mod store;

pub use chord::{build_chord, chord_notes, Chord, ChordKind, Quality};
pub use engine::SoundEngine;
pub use error::{HarmoniaError, Result};
pub use harmonic_field::{degree_labels, field_for, field_qualities, generate_field};
pub use note::{note_name, pitch_index, Note, PitchClass, SpelledNote, FLAT_NAMES, MAX_OFFSET, SHARP_NAMES};
pub use progression::{random_progression, Progression, ProgressionChord};
pub use scale::{build_scale, scale_notes, scale_offsets, Mode, ScaleNote};
pub use sequencer::{NowPlaying, PendingStep, Sequencer, SequencerState, DEFAULT_TEMPO_BPM};
pub use store::{validate_entry, MemoryStore, ProgressionStore};
