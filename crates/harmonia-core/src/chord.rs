//! Chord qualities and voicing with inversions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarmoniaError, Result};
use crate::note::{pitch_index, Note, PitchClass, SpelledNote};

/// Chord quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    Major,
    Minor,
    Augmented,
    Diminished,
    Sus2,
    Sus4,
    DominantSeventh,
    MajorSeventh,
    MinorSeventh,
    HalfDiminishedSeventh,
    DiminishedSeventh,
    Sixth,
    MinorSixth,
    AddNine,
    Ninth,
    MajorNinth,
    MinorNinth,
    Eleventh,
    MinorEleventh,
    Thirteenth,
    SevenFlatFive,
    SevenSharpFive,
    SevenFlatNine,
    SevenSharpNine,
    Power,
}

impl Quality {
    pub const ALL: [Quality; 25] = [
        Self::Major,
        Self::Minor,
        Self::Augmented,
        Self::Diminished,
        Self::Sus2,
        Self::Sus4,
        Self::DominantSeventh,
        Self::MajorSeventh,
        Self::MinorSeventh,
        Self::HalfDiminishedSeventh,
        Self::DiminishedSeventh,
        Self::Sixth,
        Self::MinorSixth,
        Self::AddNine,
        Self::Ninth,
        Self::MajorNinth,
        Self::MinorNinth,
        Self::Eleventh,
        Self::MinorEleventh,
        Self::Thirteenth,
        Self::SevenFlatFive,
        Self::SevenSharpFive,
        Self::SevenFlatNine,
        Self::SevenSharpNine,
        Self::Power,
    ];

    /// Semitone offsets from the root, ascending
    pub fn intervals(&self) -> &'static [i32] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Augmented => &[0, 4, 8],
            Self::Diminished => &[0, 3, 6],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
            Self::DominantSeventh => &[0, 4, 7, 10],
            Self::MajorSeventh => &[0, 4, 7, 11],
            Self::MinorSeventh => &[0, 3, 7, 10],
            Self::HalfDiminishedSeventh => &[0, 3, 6, 10],
            Self::DiminishedSeventh => &[0, 3, 6, 9],
            Self::Sixth => &[0, 4, 7, 9],
            Self::MinorSixth => &[0, 3, 7, 9],
            Self::AddNine => &[0, 4, 7, 14],
            Self::Ninth => &[0, 4, 7, 10, 14],
            Self::MajorNinth => &[0, 4, 7, 11, 14],
            Self::MinorNinth => &[0, 3, 7, 10, 14],
            Self::Eleventh => &[0, 4, 7, 10, 14, 17],
            Self::MinorEleventh => &[0, 3, 7, 10, 14, 17],
            Self::Thirteenth => &[0, 4, 7, 10, 14, 21],
            Self::SevenFlatFive => &[0, 4, 6, 10],
            Self::SevenSharpFive => &[0, 4, 8, 10],
            Self::SevenFlatNine => &[0, 4, 7, 10, 13],
            Self::SevenSharpNine => &[0, 4, 7, 10, 15],
            Self::Power => &[0, 7],
        }
    }

    /// Suffix appended to the root spelling in chord names
    pub fn cipher(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Augmented => "aug",
            Self::Diminished => "dim",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::DominantSeventh => "7",
            Self::MajorSeventh => "maj7",
            Self::MinorSeventh => "m7",
            Self::HalfDiminishedSeventh => "m7b5",
            Self::DiminishedSeventh => "dim7",
            Self::Sixth => "6",
            Self::MinorSixth => "m6",
            Self::AddNine => "add9",
            Self::Ninth => "9",
            Self::MajorNinth => "maj9",
            Self::MinorNinth => "m9",
            Self::Eleventh => "11",
            Self::MinorEleventh => "m11",
            Self::Thirteenth => "13",
            Self::SevenFlatFive => "7(b5)",
            Self::SevenSharpFive => "7(#5)",
            Self::SevenFlatNine => "7(b9)",
            Self::SevenSharpNine => "7(#9)",
            Self::Power => "5",
        }
    }

    /// Stable lookup key, identical to the serialized form
    pub fn key(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Augmented => "augmented",
            Self::Diminished => "diminished",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::DominantSeventh => "dominant-seventh",
            Self::MajorSeventh => "major-seventh",
            Self::MinorSeventh => "minor-seventh",
            Self::HalfDiminishedSeventh => "half-diminished-seventh",
            Self::DiminishedSeventh => "diminished-seventh",
            Self::Sixth => "sixth",
            Self::MinorSixth => "minor-sixth",
            Self::AddNine => "add-nine",
            Self::Ninth => "ninth",
            Self::MajorNinth => "major-ninth",
            Self::MinorNinth => "minor-ninth",
            Self::Eleventh => "eleventh",
            Self::MinorEleventh => "minor-eleventh",
            Self::Thirteenth => "thirteenth",
            Self::SevenFlatFive => "seven-flat-five",
            Self::SevenSharpFive => "seven-sharp-five",
            Self::SevenFlatNine => "seven-flat-nine",
            Self::SevenSharpNine => "seven-sharp-nine",
            Self::Power => "power",
        }
    }

    /// Coarse classification used for display
    pub fn kind(&self) -> ChordKind {
        match self {
            Self::Minor | Self::MinorSeventh | Self::MinorSixth | Self::MinorNinth | Self::MinorEleventh => {
                ChordKind::Minor
            }
            Self::Diminished | Self::HalfDiminishedSeventh | Self::DiminishedSeventh => ChordKind::Diminished,
            Self::DominantSeventh
            | Self::Ninth
            | Self::Eleventh
            | Self::Thirteenth
            | Self::SevenFlatFive
            | Self::SevenSharpFive
            | Self::SevenFlatNine
            | Self::SevenSharpNine => ChordKind::Dominant,
            _ => ChordKind::Major,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Accepts a key (`"minor-seventh"`) or a non-empty cipher (`"m7"`)
impl FromStr for Quality {
    type Err = HarmoniaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|q| q.key() == s || (!q.cipher().is_empty() && q.cipher() == s))
            .ok_or_else(|| HarmoniaError::UnsupportedQuality(s.to_string()))
    }
}

/// Coarse chord classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordKind {
    Major,
    Minor,
    Dominant,
    Diminished,
}

/// A resolved chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: Quality,
    pub inversion: u32,
    /// Roman-numeral degree when the chord came from a harmonic field
    pub degree: Option<String>,
    pub notes: Vec<Note>,
}

impl Chord {
    /// Voice `quality` on `root` in the reference octave
    pub fn new(root: PitchClass, quality: Quality, inversion: u32) -> Result<Self> {
        Ok(Self {
            root,
            quality,
            inversion,
            degree: None,
            notes: chord_notes(root.index(), quality, inversion)?,
        })
    }

    pub fn with_degree(mut self, degree: impl Into<String>) -> Self {
        self.degree = Some(degree.into());
        self
    }

    /// Display name, e.g. `"Dm7"`
    pub fn name(&self, use_flats: bool) -> String {
        format!("{}{}", self.root.name(use_flats), self.quality.cipher())
    }

    pub fn kind(&self) -> ChordKind {
        self.quality.kind()
    }

    pub fn spelled_notes(&self, use_flats: bool) -> Vec<SpelledNote> {
        self.notes.iter().map(|n| n.spelled(use_flats)).collect()
    }

    /// Notes joined as `"C/4 - E/4 - G/4"`
    pub fn notes_label(&self, use_flats: bool) -> String {
        self.spelled_notes(use_flats)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

/// Chord tones as absolute offsets from the reference C, then inverted.
///
/// Each inversion moves the lowest note up an octave. Inversions past the
/// note count keep cycling upward rather than wrapping back to root position,
/// until the voicing leaves the range a [`Note`] can represent.
pub fn chord_notes(root_index: i32, quality: Quality, inversion: u32) -> Result<Vec<Note>> {
    let mut offsets: Vec<i64> = quality
        .intervals()
        .iter()
        .map(|&i| i64::from(root_index) + i64::from(i))
        .collect();

    let len = offsets.len();
    if len > 0 {
        let cycles = i64::from(inversion) / len as i64;
        let rest = (i64::from(inversion) % len as i64) as usize;
        for offset in offsets.iter_mut() {
            *offset += 12 * cycles;
        }
        offsets.rotate_left(rest);
        for offset in offsets[len - rest..].iter_mut() {
            *offset += 12;
        }
    }

    offsets
        .into_iter()
        .map(Note::try_from_offset)
        .collect::<Option<Vec<_>>>()
        .ok_or(HarmoniaError::InversionOutOfRange(inversion))
}

/// Build a chord from a spelled root and a quality key.
///
/// Unknown roots and quality keys are reported as errors; no partial chord is
/// ever produced.
pub fn build_chord(root: &str, quality: &str, inversion: u32, use_flats: bool) -> Result<Chord> {
    let root_index = pitch_index(root, use_flats).ok_or_else(|| HarmoniaError::LookupFailure(root.to_string()))?;
    let quality: Quality = quality.parse()?;
    Chord::new(PitchClass::new(root_index), quality, inversion)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(chord: &Chord) -> Vec<String> {
        chord.spelled_notes(false).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_c_major_root_position() {
        let chord = build_chord("C", "major", 0, false).unwrap();
        assert_eq!(labels(&chord), ["C/4", "E/4", "G/4"]);
        assert_eq!(chord.name(false), "C");
    }

    #[test]
    fn test_first_inversion_moves_root_up() {
        let chord = build_chord("C", "major", 1, false).unwrap();
        assert_eq!(labels(&chord), ["E/4", "G/4", "C/5"]);
    }

    #[test]
    fn test_inversion_beyond_note_count_keeps_climbing() {
        let chord = build_chord("C", "major", 4, false).unwrap();
        assert_eq!(labels(&chord), ["E/5", "G/5", "C/6"]);

        // Same result as the naive rotate-and-raise loop
        let mut naive = vec![0, 4, 7];
        for _ in 0..4 {
            let first = naive.remove(0);
            naive.push(first + 12);
        }
        let expected: Vec<Note> = naive.into_iter().map(Note::from_offset).collect();
        assert_eq!(chord.notes, expected);
    }

    #[test]
    fn test_huge_inversion_stays_in_range() {
        let chord = build_chord("C", "major", 3_000_000, false).unwrap();
        assert_eq!(chord.notes[0], Note::new(PitchClass::C, 4 + 1_000_000));
        assert_eq!(chord.notes[2], Note::new(PitchClass::new(7), 4 + 1_000_000));
    }

    #[test]
    fn test_out_of_range_inversion_is_an_error() {
        for (root, quality, inversion) in [("C", "power", u32::MAX), ("B", "major", 1_000_000_000)] {
            let err = build_chord(root, quality, inversion, false).unwrap_err();
            assert!(matches!(err, HarmoniaError::InversionOutOfRange(i) if i == inversion));
        }
    }

    #[test]
    fn test_upper_structure_lands_in_next_octave() {
        let chord = build_chord("A", "minor-seventh", 0, false).unwrap();
        assert_eq!(labels(&chord), ["A/4", "C/5", "E/5", "G/5"]);
    }

    #[test]
    fn test_flat_spelling() {
        let chord = build_chord("B♭", "dominant-seventh", 0, true).unwrap();
        assert_eq!(chord.notes_label(true), "B♭/4 - D/5 - F/5 - A♭/5");
        assert_eq!(chord.name(true), "B♭7");
    }

    #[test]
    fn test_unsupported_quality_is_an_error() {
        let err = build_chord("C", "hyper-lydian", 0, false).unwrap_err();
        assert!(matches!(err, HarmoniaError::UnsupportedQuality(_)));
    }

    #[test]
    fn test_unknown_root_is_an_error() {
        let err = build_chord("D♭", "major", 0, false).unwrap_err();
        assert!(matches!(err, HarmoniaError::LookupFailure(_)));
    }

    #[test]
    fn test_note_count_matches_intervals() {
        for quality in Quality::ALL {
            for inversion in 0..4 {
                let chord = Chord::new(PitchClass::new(5), quality, inversion).unwrap();
                assert_eq!(chord.notes.len(), quality.intervals().len());
            }
        }
    }

    #[test]
    fn test_quality_lookup_by_key_and_cipher() {
        for quality in Quality::ALL {
            assert_eq!(quality.key().parse::<Quality>().unwrap(), quality);
        }
        assert_eq!("m7".parse::<Quality>().unwrap(), Quality::MinorSeventh);
        assert_eq!("7(b5)".parse::<Quality>().unwrap(), Quality::SevenFlatFive);
        assert!("".parse::<Quality>().is_err());
    }

    #[test]
    fn test_kind() {
        assert_eq!(Quality::HalfDiminishedSeventh.kind(), ChordKind::Diminished);
        assert_eq!(Quality::MinorSeventh.kind(), ChordKind::Minor);
        assert_eq!(Quality::DominantSeventh.kind(), ChordKind::Dominant);
        assert_eq!(Quality::MajorSeventh.kind(), ChordKind::Major);
    }
}
