//! Diatonic seventh chords on every degree of a key

use crate::chord::{Chord, Quality};
use crate::note::{pitch_index, Note, PitchClass};
use crate::scale::{build_scale, strip_octave, Mode, SCALE_DEGREES};

/// Seventh-chord quality on each scale degree
pub fn field_qualities(mode: Mode) -> [Quality; SCALE_DEGREES] {
    use Quality::*;
    match mode {
        Mode::Major => [
            MajorSeventh,
            MinorSeventh,
            MinorSeventh,
            MajorSeventh,
            DominantSeventh,
            MinorSeventh,
            HalfDiminishedSeventh,
        ],
        Mode::Minor => [
            MinorSeventh,
            HalfDiminishedSeventh,
            MajorSeventh,
            MinorSeventh,
            MinorSeventh,
            MajorSeventh,
            DominantSeventh,
        ],
    }
}

/// Roman numerals: uppercase for major/dominant, lowercase for minor, `°` for diminished
pub fn degree_labels(mode: Mode) -> [&'static str; SCALE_DEGREES] {
    match mode {
        Mode::Major => ["I", "ii", "iii", "IV", "V", "vi", "vii°"],
        Mode::Minor => ["i", "ii°", "III", "iv", "v", "VI", "VII"],
    }
}

/// The seven diatonic chords of a key built on a known root
pub fn field_for(root: PitchClass, mode: Mode) -> Vec<Chord> {
    let scale = build_scale(root.index(), mode);
    let qualities = field_qualities(mode);
    let labels = degree_labels(mode);

    (0..SCALE_DEGREES)
        .map(|i| {
            // Tertian stacking wraps inside the seven scale entries
            let notes = [i, i + 2, i + 4, i + 6]
                .iter()
                .map(|&pos| Note::from_offset(scale[pos % SCALE_DEGREES]))
                .collect();
            Chord {
                root: PitchClass::new(scale[i]),
                quality: qualities[i],
                inversion: 0,
                degree: Some(labels[i].to_string()),
                notes,
            }
        })
        .collect()
}

/// Harmonic field for a spelled root (a trailing `/octave` is ignored).
///
/// Unknown roots yield an empty field.
pub fn generate_field(root: &str, mode: Mode, use_flats: bool) -> Vec<Chord> {
    match pitch_index(strip_octave(root), use_flats) {
        Some(index) => field_for(PitchClass::new(index), mode),
        None => Vec::new(),
    }
}
