/// Storysmith CLI: compose short genre stories in the terminal.
///
/// Usage: storysmith [--config <file>] [--phrase-bank <file>] <generate|surprise|shell>

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use storysmith::config::{ConfigError, StorysmithConfig};
use storysmith::core::reveal::{DisplaySurface, Typewriter, WriterSurface};
use storysmith::core::session::{ExportError, SessionError, StorySession};
use storysmith::schema::request::LengthTier;

type Console = Typewriter<WriterSurface<std::io::Stdout>>;

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Export(#[from] ExportError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(
    name = "storysmith",
    about = "Storysmith — short genre stories assembled from phrase banks",
    version,
    propagate_version = true
)]
struct Cli {
    /// RON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Phrase bank RON file (overrides the config)
    #[arg(long, global = true)]
    phrase_bank: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose one story from a topic, genre and length
    Generate {
        /// What the story is about (blank for a placeholder)
        #[arg(short, long, default_value = "")]
        topic: String,

        /// Genre name; unknown genres use the default profile
        #[arg(short, long)]
        genre: Option<String>,

        /// Length tier: short, medium, long
        #[arg(short, long)]
        length: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Compose a story from a random topic, genre and length
    Surprise {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Interactive session: compose, regenerate, edit and save stories
    Shell {
        /// RNG seed for reproducible sessions
        #[arg(long)]
        seed: Option<u64>,

        /// Reveal speed, 0–80
        #[arg(long)]
        speed: Option<u32>,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// RNG seed for a reproducible story
    #[arg(long)]
    seed: Option<u64>,

    /// Reveal the story character by character
    #[arg(long)]
    animate: bool,

    /// Reveal speed, 0–80
    #[arg(long)]
    speed: Option<u32>,

    /// Also save the story into this directory
    #[arg(long)]
    out: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storysmith=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = match &cli.config {
        Some(path) => StorysmithConfig::load_from_ron(path)?,
        None => StorysmithConfig::default(),
    };
    if let Some(bank) = cli.phrase_bank {
        config.phrase_bank = Some(bank);
    }

    match cli.command {
        Commands::Generate {
            topic,
            genre,
            length,
            output,
        } => {
            let mut session = new_session(&config, output.speed)?;
            session.form.topic = topic;
            if let Some(genre) = genre {
                session.form.genre = genre;
            }
            if let Some(length) = length {
                session.form.length = LengthTier::parse(&length);
            }
            let mut rng = make_rng(output.seed.or(config.seed));
            session.generate(output.animate, &mut rng);
            finish_one_shot(&mut session, &output).await
        }
        Commands::Surprise { output } => {
            let mut session = new_session(&config, output.speed)?;
            let mut rng = make_rng(output.seed.or(config.seed));
            session.surprise(&mut rng);
            if !output.animate {
                let text = session.displayed().to_string();
                session.presenter_mut().show_now(&text);
            }
            finish_one_shot(&mut session, &output).await
        }
        Commands::Shell { seed, speed } => {
            let mut session = new_session(&config, speed)?;
            let mut rng = make_rng(seed.or(config.seed));
            shell(&mut session, &mut rng, &config.export_dir).await
        }
    }
}

fn new_session(
    config: &StorysmithConfig,
    speed: Option<u32>,
) -> Result<StorySession<Console>, AppError> {
    let composer = config.build_composer()?;
    let mut typewriter = Typewriter::new(WriterSurface::stdout());
    typewriter.set_speed(speed.unwrap_or(config.reveal_speed));

    let mut session = StorySession::new(composer, typewriter);
    if let Some(genre) = &config.default_genre {
        session.form.genre = genre.clone();
    }
    session.form.length = config.default_length;
    Ok(session)
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

async fn finish_one_shot(
    session: &mut StorySession<Console>,
    output: &OutputArgs,
) -> Result<(), AppError> {
    session.presenter_mut().wait().await;
    println!();
    eprintln!("{}", session.meta());
    if let Some(dir) = &output.out {
        let path = session.export(dir)?;
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Interactive shell
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Generate,
    Regenerate,
    Surprise,
    Topic(String),
    Genre(String),
    Length(LengthTier),
    Speed(u32),
    Edit,
    Save(Option<PathBuf>),
    Clear,
    Genres,
    Help,
    Quit,
    Unknown(String),
}

impl ShellCommand {
    fn parse(line: &str) -> ShellCommand {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        match word.to_lowercase().as_str() {
            "generate" | "g" => ShellCommand::Generate,
            "regenerate" | "r" => ShellCommand::Regenerate,
            "surprise" | "s" => ShellCommand::Surprise,
            "topic" => ShellCommand::Topic(rest.to_string()),
            "genre" => ShellCommand::Genre(rest.to_string()),
            "length" => ShellCommand::Length(LengthTier::parse(rest)),
            "speed" => match rest.parse() {
                Ok(speed) => ShellCommand::Speed(speed),
                Err(_) => ShellCommand::Unknown(line.to_string()),
            },
            "edit" => ShellCommand::Edit,
            "save" => ShellCommand::Save((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "clear" => ShellCommand::Clear,
            "genres" => ShellCommand::Genres,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            _ => ShellCommand::Unknown(line.to_string()),
        }
    }
}

const HELP: &str = "\
Commands:
  generate | g        compose a story from the current inputs
  regenerate | r      compose again with the same inputs and target
  surprise | s        random topic, genre and length
  topic <text>        set the topic
  genre <name>        set the genre
  length <tier>       short, medium or long
  speed <0-80>        reveal speed
  edit                replace the story text (end input with a lone '.')
  save [dir]          write the story to <topic>.txt
  clear               clear the topic and the story
  genres              list genres
  help                show this help
  quit                leave";

async fn shell(
    session: &mut StorySession<Console>,
    rng: &mut StdRng,
    export_dir: &Path,
) -> Result<(), AppError> {
    println!("{}\n", HELP);
    session.sample(rng);
    settle(session).await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match ShellCommand::parse(&line) {
            ShellCommand::Generate => {
                session.generate(true, rng);
                settle(session).await;
            }
            ShellCommand::Regenerate => {
                session.regenerate(rng);
                settle(session).await;
            }
            ShellCommand::Surprise => {
                session.surprise(rng);
                settle(session).await;
                println!(
                    "[topic: {} | genre: {} | length: {}]",
                    session.form.topic, session.form.genre, session.form.length
                );
            }
            ShellCommand::Topic(topic) => session.form.topic = topic,
            ShellCommand::Genre(genre) => {
                if session.composer().bank().lookup(&genre).is_none() {
                    println!("Unknown genre '{}', stories will use the default profile.", genre);
                }
                session.form.genre = genre;
            }
            ShellCommand::Length(length) => session.form.length = length,
            ShellCommand::Speed(speed) => session.presenter_mut().set_speed(speed),
            ShellCommand::Edit => edit(session, &mut lines).await?,
            ShellCommand::Save(dir) => {
                let dir = dir.as_deref().unwrap_or(export_dir);
                match session.export(dir) {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => println!("{}", e),
                }
            }
            ShellCommand::Clear => session.clear(),
            ShellCommand::Genres => {
                for name in session.composer().bank().genre_names() {
                    println!("  {}", name);
                }
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => break,
            ShellCommand::Unknown(cmd) => println!("Unknown command '{}', try 'help'.", cmd),
        }
    }

    session.presenter_mut().cancel();
    Ok(())
}

/// Block until the reveal has written the whole story, then print the meta line.
async fn settle<S: DisplaySurface>(session: &mut StorySession<Typewriter<S>>) {
    session.presenter_mut().wait().await;
    println!("\n\n{}", session.meta());
}

/// Unlock the story, read replacement lines up to a lone `.`, then lock it again.
async fn edit(
    session: &mut StorySession<Console>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), AppError> {
    if session.displayed().is_empty() {
        println!("Nothing to edit yet.");
        return Ok(());
    }
    let current = session.displayed().to_string();
    session.presenter_mut().show_now(&current);
    println!("\n[editing: type the new text, end with a line containing only '.']");

    session.toggle_edit();
    let mut replacement: Vec<String> = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "." {
            break;
        }
        replacement.push(line);
    }
    if !replacement.is_empty() {
        session.replace_text(&replacement.join("\n"))?;
    }
    session.toggle_edit();
    println!("\n{}", session.meta());
    Ok(())
}
