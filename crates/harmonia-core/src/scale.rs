//! Diatonic scale construction

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarmoniaError;
use crate::note::{pitch_index, Note, SpelledNote};

/// Number of distinct degrees in a diatonic scale
pub const SCALE_DEGREES: usize = 7;

/// Labels for the seven degrees plus the octave
pub const DEGREE_NUMERALS: [&str; SCALE_DEGREES + 1] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];

/// Scale mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Major, Mode::Minor];

    /// Whole/half steps between consecutive degrees (sums to 12)
    pub fn steps(&self) -> &'static [i32; SCALE_DEGREES] {
        match self {
            Self::Major => &[2, 2, 1, 2, 2, 2, 1],
            Self::Minor => &[2, 1, 2, 2, 1, 2, 2],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = HarmoniaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "major" | "maj" | "ionian" => Ok(Self::Major),
            "minor" | "min" | "aeolian" => Ok(Self::Minor),
            _ => Err(HarmoniaError::UnknownMode(s.to_string())),
        }
    }
}

/// Build the scale as absolute semitone offsets from the reference C.
///
/// Returns the seven degrees followed by the root an octave up. Offsets are
/// accumulated without reducing mod 12, so the octave of each entry is
/// `4 + floor(offset / 12)`.
pub fn build_scale(root_index: i32, mode: Mode) -> [i32; SCALE_DEGREES + 1] {
    let mut scale = [root_index; SCALE_DEGREES + 1];
    let mut current = root_index;
    for (slot, step) in scale.iter_mut().skip(1).zip(mode.steps()) {
        current += step;
        *slot = current;
    }
    scale
}

/// Name-based variant of [`build_scale`]; unknown roots yield an empty scale
pub fn scale_offsets(root: &str, mode: Mode, use_flats: bool) -> Vec<i32> {
    match pitch_index(strip_octave(root), use_flats) {
        Some(root_index) => build_scale(root_index, mode).to_vec(),
        None => Vec::new(),
    }
}

/// Drop a trailing `/octave` from a note label such as `"C/4"`
pub(crate) fn strip_octave(name: &str) -> &str {
    name.split('/').next().unwrap_or(name)
}

/// A scale entry with its degree label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleNote {
    pub degree: &'static str,
    pub note: Note,
    pub spelled: SpelledNote,
}

/// Spelled scale notes labelled `I`..`VIII`; empty when the root is unknown
pub fn scale_notes(root: &str, mode: Mode, use_flats: bool) -> Vec<ScaleNote> {
    scale_offsets(root, mode, use_flats)
        .into_iter()
        .zip(DEGREE_NUMERALS)
        .map(|(offset, degree)| {
            let note = Note::from_offset(offset);
            ScaleNote {
                degree,
                note,
                spelled: note.spelled(use_flats),
            }
        })
        .collect()
}
