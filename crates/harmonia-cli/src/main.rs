//! harmonia: harmonic fields, chords and progression playback from the terminal

mod config;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use harmonia_core::{
    build_chord, generate_field, random_progression, scale_notes, Chord, Mode, PitchClass, Progression,
    ProgressionChord, ProgressionStore, Quality,
};
use harmonia_services::{JsonProgressionStore, Player, TracingSoundEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;

#[derive(Parser)]
#[command(name = "harmonia")]
#[command(about = "Harmonic fields, chords and progression playback")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Spell accidentals with flats
    #[arg(long, global = true, conflicts_with = "sharps")]
    flats: bool,
    /// Spell accidentals with sharps
    #[arg(long, global = true)]
    sharps: bool,
    /// Playback tempo, defaults to the configured tempo
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    bpm: Option<u32>,
    /// Chords to play before stopping
    #[arg(long, global = true, default_value_t = 8)]
    steps: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Diatonic seventh chords of a key
    Field {
        root: Option<String>,
        #[arg(short, long)]
        mode: Option<ModeArg>,
    },
    /// Scale notes with degrees
    Scale {
        root: Option<String>,
        #[arg(short, long)]
        mode: Option<ModeArg>,
    },
    /// Voice a single chord
    Chord {
        root: String,
        #[arg(default_value = "major")]
        quality: String,
        #[arg(default_value_t = 0)]
        inversion: u32,
    },
    /// List chord qualities
    Qualities,
    /// Random progression drawn from a key's field
    Random {
        root: Option<String>,
        #[arg(short, long)]
        mode: Option<ModeArg>,
        #[arg(short, long, default_value_t = 4)]
        length: usize,
    },
    /// Loop field degrees (1-7)
    Play {
        root: String,
        #[arg(short, long)]
        mode: Option<ModeArg>,
        #[arg(required = true, value_parser = clap::value_parser!(u8).range(1..=7))]
        degrees: Vec<u8>,
    },
    /// Save field degrees under a name
    Save {
        name: String,
        root: String,
        #[arg(short, long)]
        mode: Option<ModeArg>,
        #[arg(required = true, value_parser = clap::value_parser!(u8).range(1..=7))]
        degrees: Vec<u8>,
    },
    Load {
        name: String,
    },
    List,
    Delete {
        name: String,
    },
    PlaySaved {
        name: String,
    },
    /// Write the current config to the default location
    InitConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    #[value(alias = "maj", alias = "ionian")]
    Major,
    #[value(alias = "min", alias = "aeolian")]
    Minor,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Major => Mode::Major,
            ModeArg::Minor => Mode::Minor,
        }
    }
}

/// Command line flags resolved against the config file
struct Options {
    use_flats: bool,
    tempo_bpm: u32,
    steps: usize,
    default_root: String,
    default_mode: Mode,
}

impl Options {
    fn resolve(cli: &Cli, config: &AppConfig) -> Self {
        let use_flats = if cli.flats {
            true
        } else if cli.sharps {
            false
        } else {
            config.notation.use_flats
        };
        Self {
            use_flats,
            tempo_bpm: cli.bpm.unwrap_or(config.playback.tempo_bpm),
            steps: cli.steps,
            default_root: config.field.root.clone(),
            default_mode: config.field.mode,
        }
    }

    fn mode(&self, mode: Option<ModeArg>) -> Mode {
        mode.map(Mode::from).unwrap_or(self.default_mode)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("harmonia=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = config::load_config();
    tracing::debug!(path = %config::config_path().display(), "Config loaded");
    let options = Options::resolve(&cli, &config);
    if options.tempo_bpm == 0 {
        bail!("tempo must be a positive BPM value");
    }

    match cli.command {
        Command::Field { root, mode } => {
            let root = root_name(&options, root.as_deref())?;
            for chord in generate_field(root, options.mode(mode), options.use_flats) {
                print_chord(&chord, options.use_flats);
            }
            Ok(())
        }
        Command::Scale { root, mode } => {
            let root = root_name(&options, root.as_deref())?;
            for entry in scale_notes(root, options.mode(mode), options.use_flats) {
                println!("{:<5} {}", entry.degree, entry.spelled);
            }
            Ok(())
        }
        Command::Chord { root, quality, inversion } => {
            let root = root_name(&options, Some(&root))?;
            let chord = build_chord(root, &quality, inversion, options.use_flats)?;
            print_chord(&chord, options.use_flats);
            Ok(())
        }
        Command::Qualities => {
            for quality in Quality::ALL {
                println!("{:<24} {:<6} {:?}", quality.key(), quality.cipher(), quality.intervals());
            }
            Ok(())
        }
        Command::Random { root, mode, length } => {
            let root = root_name(&options, root.as_deref())?;
            let field = generate_field(root, options.mode(mode), options.use_flats);
            let progression = random_progression(&field, length, options.use_flats, &mut fastrand::Rng::new());
            println!("{}", progression.display());
            Ok(())
        }
        Command::Play { root, mode, degrees } => {
            let progression = field_progression(&options, &root, mode, &degrees)?;
            play(&options, progression)
        }
        Command::Save {
            name,
            root,
            mode,
            degrees,
        } => {
            let progression = field_progression(&options, &root, mode, &degrees)?;
            store(&config).save(&name, &progression)?;
            println!("saved '{name}': {}", progression.display());
            Ok(())
        }
        Command::Load { name } => {
            println!("{}", load(&config, &name)?.display());
            Ok(())
        }
        Command::List => {
            for name in store(&config).list()? {
                println!("{name}");
            }
            Ok(())
        }
        Command::Delete { name } => {
            if !store(&config).delete(&name)? {
                bail!("no saved progression named '{name}'");
            }
            Ok(())
        }
        Command::PlaySaved { name } => play(&options, load(&config, &name)?),
        Command::InitConfig => {
            let path = config::save_config(&config)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Normalize free-form root input into the active spelling table
fn root_name(options: &Options, input: Option<&str>) -> Result<&'static str> {
    let input = input.unwrap_or(&options.default_root);
    let pitch_class = PitchClass::parse(input).with_context(|| format!("unknown root '{input}'"))?;
    Ok(pitch_class.name(options.use_flats))
}

fn print_chord(chord: &Chord, use_flats: bool) {
    println!(
        "{:<5} {:<8} {:<11} {}",
        chord.degree.as_deref().unwrap_or("-"),
        chord.name(use_flats),
        format!("{:?}", chord.kind()).to_lowercase(),
        chord.notes_label(use_flats)
    );
}

/// Degrees (1-7) resolved against the key's harmonic field
fn field_progression(options: &Options, root: &str, mode: Option<ModeArg>, degrees: &[u8]) -> Result<Progression> {
    let root = root_name(options, Some(root))?;
    let field = generate_field(root, options.mode(mode), options.use_flats);
    degrees
        .iter()
        .map(|&d| -> Result<ProgressionChord> {
            let chord = field
                .get(usize::from(d).wrapping_sub(1))
                .with_context(|| format!("invalid degree '{d}'"))?;
            Ok(ProgressionChord::from_chord(chord, options.use_flats))
        })
        .collect()
}

fn store(config: &AppConfig) -> JsonProgressionStore {
    JsonProgressionStore::new(config.store_path())
}

fn load(config: &AppConfig, name: &str) -> Result<Progression> {
    store(config)
        .load(name)?
        .with_context(|| format!("no saved progression named '{name}'"))
}

/// Loop the progression for `options.steps` chords, printing the highlight
fn play(options: &Options, progression: Progression) -> Result<()> {
    if progression.is_empty() {
        bail!("nothing to play");
    }
    let names: Vec<String> = progression.iter().map(|c| c.name.clone()).collect();
    let player = Player::spawn(TracingSoundEngine::new(options.use_flats), options.tempo_bpm)?;
    player.replace(progression)?;
    player.start()?;

    let timeout = Duration::from_secs_f64(60.0 / f64::from(options.tempo_bpm)) * 2;
    for step in 0..options.steps {
        let notes = player.now_playing().recv_timeout(timeout)?;
        let label: Vec<String> = notes.iter().map(|n| n.spelled(options.use_flats).to_string()).collect();
        println!("{:<8} {}", names[step % names.len()], label.join(" - "));
    }

    player.stop()?;
    Ok(())
}
