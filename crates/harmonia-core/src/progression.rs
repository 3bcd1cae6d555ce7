//! Ordered chord progressions

use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::note::Note;

/// A progression entry: root-resolved notes with the display name pre-rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionChord {
    pub name: String,
    pub notes: Vec<Note>,
}

impl ProgressionChord {
    pub fn new(name: impl Into<String>, notes: Vec<Note>) -> Self {
        Self { name: name.into(), notes }
    }

    pub fn from_chord(chord: &Chord, use_flats: bool) -> Self {
        Self::new(chord.name(use_flats), chord.notes.clone())
    }
}

/// Chords in playback order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progression {
    chords: Vec<ProgressionChord>,
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chord: ProgressionChord) {
        self.chords.push(chord);
    }

    /// Remove the chord at `index`, if any
    pub fn remove(&mut self, index: usize) -> Option<ProgressionChord> {
        if index >= self.chords.len() {
            return None;
        }
        Some(self.chords.remove(index))
    }

    pub fn clear(&mut self) {
        self.chords.clear();
    }

    pub fn get(&self, index: usize) -> Option<&ProgressionChord> {
        self.chords.get(index)
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgressionChord> {
        self.chords.iter()
    }

    /// Chord names joined as `"C - Am - F - G"`
    pub fn display(&self) -> String {
        self.chords.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(" - ")
    }
}

impl FromIterator<ProgressionChord> for Progression {
    fn from_iter<I: IntoIterator<Item = ProgressionChord>>(iter: I) -> Self {
        Self {
            chords: iter.into_iter().collect(),
        }
    }
}

/// Pick `length` chords uniformly from a harmonic field.
///
/// Repeats are allowed; an empty field gives an empty progression.
pub fn random_progression(field: &[Chord], length: usize, use_flats: bool, rng: &mut fastrand::Rng) -> Progression {
    if field.is_empty() {
        return Progression::new();
    }
    (0..length)
        .map(|_| ProgressionChord::from_chord(&field[rng.usize(..field.len())], use_flats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmonic_field::generate_field;
    use crate::scale::Mode;

    #[test]
    fn test_push_remove_display() {
        let field = generate_field("C", Mode::Major, false);
        let mut progression: Progression = [0, 3, 4, 0]
            .iter()
            .map(|&i| ProgressionChord::from_chord(&field[i], false))
            .collect();
        assert_eq!(progression.display(), "Cmaj7 - Fmaj7 - G7 - Cmaj7");

        assert_eq!(progression.remove(1).map(|c| c.name), Some("Fmaj7".to_string()));
        assert!(progression.remove(10).is_none());
        assert_eq!(progression.len(), 3);

        progression.clear();
        assert!(progression.is_empty());
        assert_eq!(progression.display(), "");
    }

    #[test]
    fn test_random_progression_draws_from_field() {
        let field = generate_field("G", Mode::Major, false);
        let names: Vec<String> = field.iter().map(|c| c.name(false)).collect();
        let mut rng = fastrand::Rng::with_seed(7);

        let progression = random_progression(&field, 8, false, &mut rng);
        assert_eq!(progression.len(), 8);
        assert!(progression.iter().all(|c| names.contains(&c.name)));
    }

    #[test]
    fn test_random_progression_empty_field() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(random_progression(&[], 4, false, &mut rng).is_empty());
    }
}
