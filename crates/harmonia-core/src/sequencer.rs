//! Timed, looping progression playback
//!
//! The sequencer is a clock-agnostic state machine: every time-dependent call
//! takes `now`, the elapsed time on the owner's timeline. A driver asks for
//! [`Sequencer::next_deadline`], waits until then (or until a command arrives)
//! and calls [`Sequencer::poll`]. There is at most one pending step; `stop()`
//! discards it, so nothing can sound after a stop.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, info};

use crate::engine::SoundEngine;
use crate::error::{HarmoniaError, Result};
use crate::note::Note;
use crate::progression::{Progression, ProgressionChord};

pub const DEFAULT_TEMPO_BPM: u32 = 120;

/// Notes currently sounding; empty when playback stops
pub type NowPlaying = Vec<Note>;

/// One-slot mailbox. The sequencer keeps a receiver clone so it can evict an
/// unread event and leave only the newest one queued.
struct Subscriber {
    tx: Sender<NowPlaying>,
    stale: Receiver<NowPlaying>,
}

impl Subscriber {
    fn publish(&self, notes: NowPlaying) {
        if let Err(TrySendError::Full(notes)) = self.tx.try_send(notes) {
            let _ = self.stale.try_recv();
            let _ = self.tx.try_send(notes);
        }
    }
}

/// Handle for the one outstanding scheduled step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStep {
    pub ticket: u64,
    /// When the previous step sounded; the deadline is one beat later
    pub anchor: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerState {
    pub is_playing: bool,
    /// Index of the chord currently sounding, `None` while idle
    pub current_index: Option<usize>,
    pub tempo_bpm: u32,
    pub pending: Option<PendingStep>,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_index: None,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            pending: None,
        }
    }
}

pub struct Sequencer<E: SoundEngine> {
    engine: E,
    progression: Progression,
    state: SequencerState,
    subscribers: Vec<Subscriber>,
    next_ticket: u64,
}

impl<E: SoundEngine> Sequencer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            progression: Progression::new(),
            state: SequencerState::default(),
            subscribers: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn with_tempo(engine: E, tempo_bpm: u32) -> Result<Self> {
        let mut sequencer = Self::new(engine);
        sequencer.set_tempo(tempo_bpm)?;
        Ok(sequencer)
    }

    /// Receive the notes sounding at every step, and an empty list on stop.
    ///
    /// At most one event is queued per subscriber; a reader that falls behind
    /// sees only the latest one.
    pub fn subscribe(&mut self) -> Receiver<NowPlaying> {
        let (tx, rx) = bounded(1);
        self.subscribers.push(Subscriber { tx, stale: rx.clone() });
        rx
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Currently sounding chord, if it is still within the progression
    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index.filter(|&i| i < self.progression.len())
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn tempo_bpm(&self) -> u32 {
        self.state.tempo_bpm
    }

    /// Change the tempo. While playing, the pending step is re-timed from the
    /// previous step; the chord already sounding is left alone.
    pub fn set_tempo(&mut self, tempo_bpm: u32) -> Result<()> {
        if tempo_bpm == 0 {
            return Err(HarmoniaError::InvalidTempo(tempo_bpm));
        }
        self.state.tempo_bpm = tempo_bpm;
        debug!(tempo_bpm, "Tempo changed");
        Ok(())
    }

    /// One beat (one chord) at the current tempo
    pub fn beat_interval(&self) -> Duration {
        Duration::from_nanos(60_000_000_000 / u64::from(self.state.tempo_bpm))
    }

    /// When the pending step is due, derived from the tempo at call time
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.pending.map(|p| p.anchor + self.beat_interval())
    }

    pub fn add(&mut self, chord: ProgressionChord) {
        self.progression.push(chord);
    }

    /// Removing during playback is allowed; the next step re-checks bounds
    pub fn remove(&mut self, index: usize) -> Option<ProgressionChord> {
        self.progression.remove(index)
    }

    pub fn clear(&mut self) {
        self.progression.clear();
    }

    /// Stop playback and swap in another progression
    pub fn replace_progression(&mut self, progression: Progression) {
        self.stop();
        self.progression = progression;
    }

    /// Stop playback and drop every chord
    pub fn reset(&mut self) {
        self.stop();
        self.progression.clear();
    }

    /// Sound the first chord immediately and schedule the next one.
    ///
    /// Does nothing when the progression is empty. Starting while already
    /// playing restarts from the first chord.
    pub fn start(&mut self, now: Duration) {
        if self.progression.is_empty() {
            debug!("Start ignored, progression is empty");
            return;
        }

        self.state.pending = None;
        self.state.current_index = None;
        self.state.is_playing = true;
        info!(
            chords = self.progression.len(),
            tempo_bpm = self.state.tempo_bpm,
            "Playback started"
        );
        self.step(now);
    }

    /// Cancel the pending step, clear the highlight and go idle
    pub fn stop(&mut self) {
        if !self.state.is_playing && self.state.pending.is_none() {
            return;
        }
        self.finish_stop();
    }

    /// Fire the pending step if it is due. Returns whether a step ran.
    ///
    /// A poll that arrives more than a beat late sounds the overdue chord once
    /// and re-anchors on `now` instead of replaying every missed beat.
    pub fn poll(&mut self, now: Duration) -> bool {
        let Some(due) = self.next_deadline() else {
            return false;
        };
        if now < due {
            return false;
        }

        let at = if now - due >= self.beat_interval() { now } else { due };
        self.state.pending = None;
        self.step(at);
        true
    }

    fn step(&mut self, at: Duration) {
        if !self.state.is_playing {
            self.finish_stop();
            return;
        }

        let len = self.progression.len();
        if len == 0 {
            info!("Progression emptied during playback");
            self.finish_stop();
            return;
        }

        let index = match self.state.current_index {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        let Some(chord) = self.progression.get(index) else {
            self.finish_stop();
            return;
        };
        let notes = chord.notes.clone();
        debug!(index, chord = %chord.name, "Step");

        self.engine.play_chord(&notes);
        self.emit(notes);
        self.state.current_index = Some(index);
        self.schedule(at);
    }

    fn schedule(&mut self, anchor: Duration) {
        self.next_ticket += 1;
        self.state.pending = Some(PendingStep {
            ticket: self.next_ticket,
            anchor,
        });
    }

    fn finish_stop(&mut self) {
        self.state.pending = None;
        self.state.current_index = None;
        self.state.is_playing = false;
        self.emit(Vec::new());
        info!("Playback stopped");
    }

    fn emit(&self, notes: NowPlaying) {
        for subscriber in &self.subscribers {
            subscriber.publish(notes.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{Chord, Quality};
    use crate::note::PitchClass;

    #[derive(Default)]
    struct RecordingEngine {
        chords: Vec<Vec<Note>>,
        notes: Vec<Note>,
    }

    impl SoundEngine for RecordingEngine {
        fn play_chord(&mut self, notes: &[Note]) {
            self.chords.push(notes.to_vec());
        }

        fn play_note(&mut self, note: Note) {
            self.notes.push(note);
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn chord(root: i32) -> ProgressionChord {
        ProgressionChord::from_chord(&Chord::new(PitchClass::new(root), Quality::Major, 0).unwrap(), false)
    }

    /// Sequencer loaded with A, B, C major at 120 BPM
    fn abc() -> Sequencer<RecordingEngine> {
        let mut sequencer = Sequencer::new(RecordingEngine::default());
        for root in [9, 11, 0] {
            sequencer.add(chord(root));
        }
        sequencer
    }

    fn played_names(sequencer: &Sequencer<RecordingEngine>) -> Vec<String> {
        sequencer
            .engine()
            .chords
            .iter()
            .map(|notes| notes[0].pitch_class.name(false).to_string())
            .collect()
    }

    #[test]
    fn test_start_with_empty_progression_is_noop() {
        let mut sequencer = Sequencer::new(RecordingEngine::default());
        let rx = sequencer.subscribe();
        sequencer.start(ms(0));
        assert!(!sequencer.is_playing());
        assert_eq!(sequencer.current_index(), None);
        assert_eq!(sequencer.next_deadline(), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_steps_on_the_beat_and_loops() {
        let mut sequencer = abc();
        sequencer.start(ms(0));
        assert_eq!(played_names(&sequencer), ["A"]);
        assert_eq!(sequencer.current_index(), Some(0));

        assert!(!sequencer.poll(ms(499)));
        assert!(sequencer.poll(ms(500)));
        assert!(!sequencer.poll(ms(500)));
        assert!(sequencer.poll(ms(1000)));
        assert!(sequencer.poll(ms(1500)));
        assert_eq!(played_names(&sequencer), ["A", "B", "C", "A"]);
        assert_eq!(sequencer.current_index(), Some(0));
        assert_eq!(sequencer.next_deadline(), Some(ms(2000)));
    }

    #[test]
    fn test_stop_cancels_pending_step() {
        let mut sequencer = abc();
        let rx = sequencer.subscribe();
        sequencer.start(ms(0));
        sequencer.poll(ms(500));

        sequencer.stop();
        assert!(!sequencer.poll(ms(1000)));
        assert!(!sequencer.poll(ms(60_000)));
        assert_eq!(played_names(&sequencer), ["A", "B"]);

        let state = sequencer.state();
        assert!(!state.is_playing);
        assert_eq!(state.current_index, None);
        assert_eq!(state.pending, None);

        let events: Vec<NowPlaying> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_empty());
    }

    #[test]
    fn test_stop_when_idle_emits_nothing() {
        let mut sequencer = abc();
        let rx = sequencer.subscribe();
        sequencer.stop();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_tempo_change_retimes_next_step() {
        let mut sequencer = abc();
        sequencer.start(ms(0));
        sequencer.set_tempo(60).unwrap();

        assert_eq!(sequencer.next_deadline(), Some(ms(1000)));
        assert!(!sequencer.poll(ms(500)));
        assert!(sequencer.poll(ms(1000)));
        assert_eq!(played_names(&sequencer), ["A", "B"]);
        assert_eq!(sequencer.next_deadline(), Some(ms(2000)));

        // Speeding up again is read on the following step
        sequencer.set_tempo(240).unwrap();
        assert!(sequencer.poll(ms(1250)));
        assert_eq!(played_names(&sequencer), ["A", "B", "C"]);
    }

    #[test]
    fn test_invalid_tempo_is_rejected() {
        let mut sequencer = abc();
        assert!(matches!(sequencer.set_tempo(0), Err(HarmoniaError::InvalidTempo(0))));
        assert_eq!(sequencer.tempo_bpm(), DEFAULT_TEMPO_BPM);
        assert!(Sequencer::with_tempo(RecordingEngine::default(), 0).is_err());
    }

    #[test]
    fn test_emptying_progression_while_playing_stops() {
        let mut sequencer = abc();
        let rx = sequencer.subscribe();
        sequencer.start(ms(0));
        sequencer.clear();
        assert!(sequencer.is_playing());

        assert!(sequencer.poll(ms(500)));
        assert!(!sequencer.is_playing());
        assert_eq!(sequencer.next_deadline(), None);
        assert_eq!(played_names(&sequencer), ["A"]);
        assert_eq!(rx.try_iter().last(), Some(Vec::new()));
    }

    #[test]
    fn test_removal_while_playing_wraps() {
        let mut sequencer = abc();
        sequencer.start(ms(0));
        sequencer.poll(ms(500));
        sequencer.remove(2);
        sequencer.remove(1);
        assert_eq!(sequencer.current_index(), None);
        assert!(sequencer.is_playing());

        sequencer.poll(ms(1000));
        assert_eq!(played_names(&sequencer), ["A", "B", "A"]);
        assert_eq!(sequencer.current_index(), Some(0));
    }

    #[test]
    fn test_added_chord_joins_the_loop() {
        let mut sequencer = abc();
        sequencer.start(ms(0));
        sequencer.add(chord(2));
        for t in [500, 1000, 1500, 2000] {
            sequencer.poll(ms(t));
        }
        assert_eq!(played_names(&sequencer), ["A", "B", "C", "D", "A"]);
    }

    #[test]
    fn test_now_playing_follows_steps() {
        let mut sequencer = abc();
        let rx = sequencer.subscribe();
        sequencer.start(ms(0));
        assert_eq!(rx.try_recv().unwrap(), sequencer.progression().get(0).unwrap().notes);

        sequencer.poll(ms(500));
        assert_eq!(rx.try_recv().unwrap(), sequencer.progression().get(1).unwrap().notes);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unread_events_do_not_pile_up() {
        let mut sequencer = abc();
        let rx = sequencer.subscribe();
        sequencer.start(ms(0));
        for t in (1..=1000).map(|i| i * 500) {
            sequencer.poll(ms(t));
        }
        assert_eq!(rx.len(), 1);

        // 1001 steps over three chords: the latest is index 1000 % 3
        let latest = sequencer.progression().get(1000 % 3).unwrap().notes.clone();
        assert_eq!(rx.try_recv().unwrap(), latest);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_does_not_block_others() {
        let mut sequencer = abc();
        drop(sequencer.subscribe());
        let rx = sequencer.subscribe();
        sequencer.start(ms(0));
        sequencer.poll(ms(500));
        assert_eq!(rx.try_recv().unwrap(), sequencer.progression().get(1).unwrap().notes);
    }

    #[test]
    fn test_late_poll_resyncs() {
        let mut sequencer = abc();
        sequencer.start(ms(0));
        assert!(sequencer.poll(ms(5000)));
        assert_eq!(played_names(&sequencer), ["A", "B"]);
        assert_eq!(sequencer.next_deadline(), Some(ms(5500)));

        // Slightly late polls stay on the grid
        assert!(sequencer.poll(ms(5600)));
        assert_eq!(sequencer.next_deadline(), Some(ms(6000)));
    }

    #[test]
    fn test_restart_begins_at_first_chord() {
        let mut sequencer = abc();
        sequencer.start(ms(0));
        sequencer.poll(ms(500));
        let first_ticket = sequencer.state().pending.map(|p| p.ticket);

        sequencer.start(ms(700));
        assert_eq!(played_names(&sequencer), ["A", "B", "A"]);
        assert_ne!(sequencer.state().pending.map(|p| p.ticket), first_ticket);
        assert_eq!(sequencer.next_deadline(), Some(ms(1200)));
    }

    #[test]
    fn test_replace_and_reset_stop_playback() {
        let mut sequencer = abc();
        sequencer.start(ms(0));
        sequencer.replace_progression([chord(4)].into_iter().collect());
        assert!(!sequencer.is_playing());
        assert_eq!(sequencer.progression().len(), 1);

        sequencer.start(ms(100));
        sequencer.reset();
        assert!(!sequencer.is_playing());
        assert!(sequencer.progression().is_empty());
    }

    #[test]
    fn test_engine_note_preview() {
        let mut sequencer = abc();
        sequencer.engine_mut().play_note(Note::from_offset(0));
        assert_eq!(sequencer.engine().notes, [Note::from_offset(0)]);
        assert!(sequencer.engine().chords.is_empty());
    }
}
