//! Sound engine capability

use crate::note::Note;

/// Something that can make notes audible.
///
/// Calls are fire-and-forget: the sequencer never waits for a sound to finish.
pub trait SoundEngine: Send {
    fn play_chord(&mut self, notes: &[Note]);
    fn play_note(&mut self, note: Note);
}

impl<E: SoundEngine + ?Sized> SoundEngine for Box<E> {
    fn play_chord(&mut self, notes: &[Note]) {
        (**self).play_chord(notes);
    }

    fn play_note(&mut self, note: Note) {
        (**self).play_note(note);
    }
}
