//! Real-time progression player
//!
//! The sequencer lives on one dedicated thread, which is the only timeline
//! that ever touches it. Commands arrive over a channel; between commands the
//! thread sleeps in `recv_timeout` until the next step is due, so a `Stop`
//! that lands first simply leaves nothing to fire.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use harmonia_core::{HarmoniaError, Note, NowPlaying, Progression, ProgressionChord, Sequencer, SoundEngine};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player thread is not running")]
    Disconnected,
    #[error("Failed to spawn player thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error(transparent)]
    Harmonia(#[from] HarmoniaError),
}

#[derive(Debug)]
pub(crate) enum PlayerCommand {
    Start,
    Stop,
    SetTempo(u32),
    Add(ProgressionChord),
    Remove(usize),
    Clear,
    Replace(Progression),
    PlayNote(Note),
    Status(Sender<PlayerStatus>),
    Shutdown,
}

/// Snapshot of the sequencer taken on the player thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub is_playing: bool,
    pub current_index: Option<usize>,
    pub tempo_bpm: u32,
    pub chords: usize,
}

/// Handle to the player thread. Dropping it stops playback and joins the thread.
pub struct Player {
    commands: Sender<PlayerCommand>,
    now_playing: Receiver<NowPlaying>,
    thread: Option<JoinHandle<()>>,
}

impl Player {
    pub fn spawn<E: SoundEngine + 'static>(engine: E, tempo_bpm: u32) -> Result<Self, PlayerError> {
        let mut sequencer = Sequencer::with_tempo(engine, tempo_bpm)?;
        let now_playing = sequencer.subscribe();
        let (commands, rx) = unbounded();

        let thread = thread::Builder::new()
            .name("harmonia-player".into())
            .spawn(move || Self::run(sequencer, rx))?;

        info!(tempo_bpm, "Player started");
        Ok(Self {
            commands,
            now_playing,
            thread: Some(thread),
        })
    }

    /// Notes sounding at each step; an empty list marks a stop
    pub fn now_playing(&self) -> &Receiver<NowPlaying> {
        &self.now_playing
    }

    pub fn start(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Start)
    }

    pub fn stop(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Stop)
    }

    pub fn set_tempo(&self, tempo_bpm: u32) -> Result<(), PlayerError> {
        if tempo_bpm == 0 {
            return Err(HarmoniaError::InvalidTempo(tempo_bpm).into());
        }
        self.send(PlayerCommand::SetTempo(tempo_bpm))
    }

    pub fn add(&self, chord: ProgressionChord) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Add(chord))
    }

    pub fn remove(&self, index: usize) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Remove(index))
    }

    pub fn clear(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Clear)
    }

    /// Stop playback and load a different progression
    pub fn replace(&self, progression: Progression) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Replace(progression))
    }

    /// Sound a single note outside the progression
    pub fn play_note(&self, note: Note) -> Result<(), PlayerError> {
        self.send(PlayerCommand::PlayNote(note))
    }

    pub fn status(&self) -> Result<PlayerStatus, PlayerError> {
        let (tx, rx) = bounded(1);
        self.send(PlayerCommand::Status(tx))?;
        rx.recv().map_err(|_| PlayerError::Disconnected)
    }

    fn send(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        self.commands.send(command).map_err(|_| PlayerError::Disconnected)
    }

    fn run<E: SoundEngine>(mut sequencer: Sequencer<E>, commands: Receiver<PlayerCommand>) {
        let clock = Instant::now();

        loop {
            let command = match sequencer.next_deadline() {
                Some(deadline) => match commands.recv_timeout(deadline.saturating_sub(clock.elapsed())) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => {
                        sequencer.poll(clock.elapsed());
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match commands.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                },
            };

            match command {
                PlayerCommand::Start => sequencer.start(clock.elapsed()),
                PlayerCommand::Stop => sequencer.stop(),
                PlayerCommand::SetTempo(tempo_bpm) => {
                    if let Err(e) = sequencer.set_tempo(tempo_bpm) {
                        warn!(tempo_bpm, "Tempo change rejected: {}", e);
                    }
                }
                PlayerCommand::Add(chord) => sequencer.add(chord),
                PlayerCommand::Remove(index) => {
                    sequencer.remove(index);
                }
                PlayerCommand::Clear => sequencer.clear(),
                PlayerCommand::Replace(progression) => sequencer.replace_progression(progression),
                PlayerCommand::PlayNote(note) => sequencer.engine_mut().play_note(note),
                PlayerCommand::Status(reply) => {
                    let _ = reply.send(PlayerStatus {
                        is_playing: sequencer.is_playing(),
                        current_index: sequencer.current_index(),
                        tempo_bpm: sequencer.tempo_bpm(),
                        chords: sequencer.progression().len(),
                    });
                }
                PlayerCommand::Shutdown => break,
            }

            // A busy command stream must not starve a step that is already due
            sequencer.poll(clock.elapsed());
        }

        sequencer.stop();
        debug!("Player thread exiting");
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
