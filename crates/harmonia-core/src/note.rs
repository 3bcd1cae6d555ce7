//! Pitch-class spelling and octave bookkeeping

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarmoniaError;

/// Sharp spellings, indexed by pitch class
pub const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Flat spellings, positionally aligned with [`SHARP_NAMES`]
pub const FLAT_NAMES: [&str; 12] = ["C", "D♭", "D", "E♭", "E", "F", "G♭", "G", "A♭", "A", "B♭", "B"];

/// Octave that absolute offset 0 (middle C) lives in
pub const REFERENCE_OCTAVE: i32 = 4;

/// Largest absolute offset a [`Note`] may sit at, so `offset()` and `midi()` stay in `i32`
pub const MAX_OFFSET: i32 = i32::MAX - 128;

fn names(use_flats: bool) -> &'static [&'static str; 12] {
    if use_flats { &FLAT_NAMES } else { &SHARP_NAMES }
}

/// Spelling for `index mod 12` in the requested table
pub fn note_name(index: i32, use_flats: bool) -> &'static str {
    names(use_flats)[index.rem_euclid(12) as usize]
}

/// Exact, case-sensitive lookup in one spelling table.
///
/// A flat-spelled name is not found in sharp mode (and vice versa); use
/// [`PitchClass::parse`] to normalize free-form input first.
pub fn pitch_index(name: &str, use_flats: bool) -> Option<i32> {
    names(use_flats).iter().position(|&n| n == name).map(|i| i as i32)
}

/// One of the 12 semitone classes (C = 0 .. B = 11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: Self = Self(0);

    /// Reduce any semitone index into a pitch class
    pub fn new(index: i32) -> Self {
        Self(index.rem_euclid(12) as u8)
    }

    pub fn index(self) -> i32 {
        self.0 as i32
    }

    pub fn name(self, use_flats: bool) -> &'static str {
        note_name(self.index(), use_flats)
    }

    /// Strict lookup in a single table, see [`pitch_index`]
    pub fn lookup(name: &str, use_flats: bool) -> Option<Self> {
        pitch_index(name, use_flats).map(Self::new)
    }

    /// Lenient lookup accepting either table, plus `#`/`b` ASCII accidentals
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(pc) = Self::lookup(name, false).or_else(|| Self::lookup(name, true)) {
            return Some(pc);
        }

        let mut chars = name.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let base = pitch_index(&letter.to_string(), false)?;
        let shift: i32 = chars
            .map(|c| match c {
                '#' | '♯' => Some(1),
                'b' | '♭' => Some(-1),
                _ => None,
            })
            .sum::<Option<i32>>()?;
        Some(Self::new(base + shift))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name(false))
    }
}

/// A pitch class in a specific octave. Equality is by (pitch class, octave).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        Self { pitch_class, octave }
    }

    /// Note at an absolute semitone offset from C in the reference octave.
    ///
    /// Offsets are never reduced before this point, so `14` lands on D5.
    pub fn from_offset(offset: i32) -> Self {
        Self {
            pitch_class: PitchClass::new(offset),
            octave: REFERENCE_OCTAVE + offset.div_euclid(12),
        }
    }

    /// Checked [`Note::from_offset`] for wide intermediate arithmetic
    pub fn try_from_offset(offset: i64) -> Option<Self> {
        i32::try_from(offset)
            .ok()
            .filter(|o| (-MAX_OFFSET..=MAX_OFFSET).contains(o))
            .map(Self::from_offset)
    }

    /// Inverse of [`Note::from_offset`]
    pub fn offset(&self) -> i32 {
        (self.octave - REFERENCE_OCTAVE) * 12 + self.pitch_class.index()
    }

    /// MIDI note number (C4 = 60)
    pub fn midi(&self) -> i32 {
        (self.octave + 1) * 12 + self.pitch_class.index()
    }

    /// Equal-tempered frequency, A4 = 440 Hz
    pub fn frequency(&self) -> f64 {
        440.0 * 2.0_f64.powf((self.midi() - 69) as f64 / 12.0)
    }

    pub fn spelled(&self, use_flats: bool) -> SpelledNote {
        SpelledNote {
            name: self.pitch_class.name(use_flats),
            octave: self.octave,
        }
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.offset().cmp(&other.offset())
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelled(false))
    }
}

/// Parses `"C#/4"`, `"D♭/5"` or a bare `"E"` (reference octave)
impl FromStr for Note {
    type Err = HarmoniaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, octave) = match s.split_once('/') {
            Some((name, octave)) => {
                let octave = octave
                    .trim()
                    .parse()
                    .map_err(|_| HarmoniaError::InvalidNote(s.to_string()))?;
                (name, octave)
            }
            None => (s, REFERENCE_OCTAVE),
        };
        let pitch_class = PitchClass::parse(name).ok_or_else(|| HarmoniaError::InvalidNote(s.to_string()))?;
        Ok(Self::new(pitch_class, octave))
    }
}

/// A note with its display spelling resolved, as handed to a sound engine or UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpelledNote {
    pub name: &'static str,
    pub octave: i32,
}

impl fmt::Display for SpelledNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.octave)
    }
}
