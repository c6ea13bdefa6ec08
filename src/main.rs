use chrono::{DateTime, Local, Utc};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use drawdrill::{
    config::{Config, ConfigStore, FileConfigStore},
    history::HistoryDb,
    logging::init_logging,
    trainer::Trainer,
    training::{catalog, AlgorithmId, Rating, TrainingList},
    DrillError,
};
use itertools::Itertools;
use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
};
use time_humanize::HumanTime;
use tracing::warn;

/// deliberate practice for drawing from memory
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Draw a prompted subject from memory, compare against references, then rate your recall. The next subject is picked adaptively from your history: struggling subjects come back sooner, fresh ones get a bonus, and overdrawn categories are dampened."
)]
pub struct Cli {
    /// directory holding config.json and history.db (defaults to the platform directories)
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,

    /// log what the trainer is doing to stderr
    #[clap(short = 'v', long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct SelectionArgs {
    /// built-in list to practice (see `drawdrill lists`)
    #[clap(short = 'l', long)]
    list: Option<String>,

    /// custom list file: free text with optional `Category:` headers, or JSON
    #[clap(short = 'f', long, conflicts_with = "list")]
    list_file: Option<PathBuf>,

    /// selection algorithm
    #[clap(short = 'a', long, value_enum)]
    algorithm: Option<AlgorithmId>,

    /// ignore history and ratings, pick uniformly at random
    #[clap(long)]
    random: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// print the next subject to draw
    Next {
        #[clap(flatten)]
        selection: SelectionArgs,

        /// print the challenge as JSON
        #[clap(long)]
        json: bool,
    },

    /// run one interactive round: draw, compare, rate
    Practice {
        #[clap(flatten)]
        selection: SelectionArgs,
    },

    /// record the result of a session drawn elsewhere
    Record {
        #[clap(short = 's', long)]
        subject: String,

        #[clap(short = 'c', long)]
        category: String,

        /// easy, got-it, struggled or failed
        #[clap(short = 'r', long)]
        rating: Rating,

        /// seconds spent drawing
        #[clap(long, default_value_t = 0)]
        secs: u64,
    },

    /// show recent practice sessions
    History {
        /// number of sessions to show
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// aggregate per subject instead of listing sessions
        #[clap(long, conflicts_with = "ratings")]
        summary: bool,

        /// show the current rating of every subject
        #[clap(long)]
        ratings: bool,

        /// delete all recorded sessions and ratings
        #[clap(long, conflicts_with_all = ["summary", "ratings"])]
        clear: bool,
    },

    /// list the selection algorithms
    Algorithms,

    /// list the built-in training lists
    Lists,

    /// show or change the saved settings
    Config {
        #[clap(short = 'a', long, value_enum)]
        algorithm: Option<AlgorithmId>,

        #[clap(short = 'l', long, conflicts_with = "list_file")]
        list: Option<String>,

        #[clap(short = 'f', long)]
        list_file: Option<PathBuf>,

        /// turn adaptive selection on
        #[clap(long, conflicts_with = "disable")]
        enable: bool,

        /// turn adaptive selection off (uniform random picks)
        #[clap(long)]
        disable: bool,

        /// print where the settings are stored and exit
        #[clap(long, conflicts_with_all = ["algorithm", "list", "list_file", "enable", "disable"])]
        path: bool,
    },
}

impl SelectionArgs {
    /// Apply one-off overrides on top of the saved config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(list) = &self.list {
            config.active_list = list.clone();
            config.custom_list = None;
        }
        if let Some(path) = &self.list_file {
            config.custom_list = Some(path.clone());
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if self.random {
            config.algorithm_enabled = false;
        }
        config
    }
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.data_dir {
            Some(dir) => FileConfigStore::with_path(dir.join("config.json")),
            None => FileConfigStore::new(),
        }
    }

    fn open_db(&self) -> drawdrill::Result<HistoryDb> {
        match &self.data_dir {
            Some(dir) => HistoryDb::open(dir.join("history.db")),
            None => HistoryDb::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { "info" } else { "warn" });

    if let Err(err) = run(&cli) {
        let kind = match err {
            DrillError::Io(_) | DrillError::Db(_) => ErrorKind::Io,
            _ => ErrorKind::InvalidValue,
        };
        Cli::command().error(kind, err).exit();
    }
    Ok(())
}

fn run(cli: &Cli) -> drawdrill::Result<()> {
    let store = cli.config_store();
    let config = store.load();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Next { selection, json } => {
            let trainer = Trainer::from_config(&selection.apply(config), cli.open_db()?)?;
            let challenge = trainer.next_challenge(&mut rand::thread_rng())?;
            if *json {
                writeln!(out, "{}", serde_json::to_string(&challenge)?)?;
            } else {
                writeln!(out, "{challenge}")?;
            }
        }
        Command::Practice { selection } => {
            let mut trainer = Trainer::from_config(&selection.apply(config), cli.open_db()?)?;
            let stdin = io::stdin();
            practice_round(&mut trainer, &mut stdin.lock(), &mut out)?;
        }
        Command::Record {
            subject,
            category,
            rating,
            secs,
        } => {
            if let Ok(list) = config.training_list() {
                if !list.contains(subject, category) {
                    warn!(%subject, %category, list = %list.id, "subject is not part of the active list");
                }
            }
            let entry = drawdrill::history::HistoryEntry {
                subject: subject.clone(),
                category: category.clone(),
                elapsed_secs: *secs,
                rating: *rating,
                practiced_at: Utc::now(),
            };
            let mut db = cli.open_db()?;
            let previous = db.rating_for(subject)?;
            db.record_entry(&entry)?;
            match previous {
                Some(was) if was != *rating => {
                    writeln!(out, "recorded {category}: {subject} as {rating} (was {was})")?
                }
                _ => writeln!(out, "recorded {category}: {subject} as {rating}")?,
            }
        }
        Command::History {
            limit,
            summary,
            ratings,
            clear,
        } => {
            let db = cli.open_db()?;
            let now = Utc::now();
            if *clear {
                db.clear()?;
                writeln!(out, "history cleared")?;
            } else if *ratings {
                let current = db.item_ratings()?;
                for (subject, rating) in current.iter().sorted_by_key(|(subject, _)| *subject) {
                    writeln!(out, "{subject:<24} {rating}")?;
                }
            } else if *summary {
                for s in db.subject_summaries()? {
                    let rating = s.last_rating.map(|r| r.to_string()).unwrap_or_default();
                    writeln!(
                        out,
                        "{:<24} {:<20} {:>3}x  avg {:>5.0}s  {:<10} {}",
                        s.subject,
                        s.category,
                        s.attempts,
                        s.avg_elapsed_secs,
                        rating,
                        format_age(s.last_practiced, now)
                    )?;
                }
            } else {
                for e in db.recent_entries(*limit)? {
                    writeln!(
                        out,
                        "{}  {}: {}  {}  {}s  ({})",
                        e.practiced_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        e.category,
                        e.subject,
                        e.rating,
                        e.elapsed_secs,
                        format_age(e.practiced_at, now)
                    )?;
                }
            }
        }
        Command::Algorithms => {
            for profile in catalog() {
                let marker = if profile.id == config.algorithm { "*" } else { " " };
                writeln!(
                    out,
                    "{marker} {:<18} {:<18} {}",
                    profile.id.to_string(),
                    profile.name,
                    profile.description
                )?;
            }
        }
        Command::Lists => {
            for id in TrainingList::builtin_ids() {
                let list = TrainingList::builtin(&id)?;
                let marker = if config.custom_list.is_none() && id == config.active_list {
                    "*"
                } else {
                    " "
                };
                writeln!(
                    out,
                    "{marker} {:<14} {:<14} {} categories, {} subjects",
                    list.id,
                    list.name,
                    list.categories.len(),
                    list.subject_count()
                )?;
            }
        }
        Command::Config {
            algorithm,
            list,
            list_file,
            enable,
            disable,
            path,
        } => {
            if *path {
                writeln!(out, "{}", store.path().display())?;
                return Ok(());
            }
            let mut updated = config.clone();
            if let Some(algorithm) = algorithm {
                updated.algorithm = *algorithm;
            }
            if let Some(list) = list {
                // fail before saving a list id that does not exist
                TrainingList::builtin(list)?;
                updated.active_list = list.clone();
                updated.custom_list = None;
            }
            if let Some(path) = list_file {
                drawdrill::training::load_list_file(path)?.validate()?;
                updated.custom_list = Some(path.clone());
            }
            if *enable {
                updated.algorithm_enabled = true;
            }
            if *disable {
                updated.algorithm_enabled = false;
            }
            if updated != config {
                store.save(&updated)?;
            }
            writeln!(out, "{}", serde_json::to_string_pretty(&updated)?)?;
        }
    }
    Ok(())
}

/// One interactive round over any line-based input
fn practice_round<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    input: &mut R,
    out: &mut W,
) -> drawdrill::Result<()> {
    let session = trainer.start(&mut rand::thread_rng())?;
    writeln!(out, "Draw from memory: {}", session.challenge)?;
    writeln!(out, "Press Enter when you are done drawing...")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out, "No input, session discarded.")?;
        return Ok(());
    }
    let finished_at = Utc::now();

    writeln!(
        out,
        "Compare with your references. How did it go? [e]asy / [g]ot it / [s]truggled / [f]ailed"
    )?;
    let rating = loop {
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out, "No rating given, session discarded.")?;
            return Ok(());
        }
        match line.parse::<Rating>() {
            Ok(rating) => break rating,
            Err(_) => writeln!(out, "Please answer e, g, s or f.")?,
        }
    };

    let entry = session.finish_at(rating, finished_at);
    trainer.complete(&entry)?;
    writeln!(
        out,
        "Recorded {}: {} as {} after {}s.",
        entry.category, entry.subject, entry.rating, entry.elapsed_secs
    )?;
    Ok(())
}

fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    // Future timestamps from clock skew read as "now"
    let secs = (now - at).num_seconds().max(0);
    HumanTime::from_seconds(-secs).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use drawdrill::training::{AlgorithmProfile, Category};
    use std::io::Cursor;

    fn trainer() -> Trainer {
        let list = TrainingList::new(
            "t",
            "T",
            vec![Category::new("Shapes", vec!["circle".into()])],
        );
        Trainer::new(
            list,
            AlgorithmProfile::default(),
            true,
            HistoryDb::open_in_memory().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn practice_round_records_rating() {
        let mut trainer = trainer();
        let mut input = Cursor::new("\nmaybe\ns\n");
        let mut out = Vec::new();
        practice_round(&mut trainer, &mut input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Draw from memory: Shapes: circle"));
        assert!(text.contains("Please answer e, g, s or f."));
        assert!(text.contains("as struggled"));

        let entries = trainer.history().entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rating, Rating::Struggled);
    }

    #[test]
    fn practice_round_discards_on_eof() {
        let mut trainer = trainer();
        let mut input = Cursor::new("\n");
        let mut out = Vec::new();
        practice_round(&mut trainer, &mut input, &mut out).unwrap();
        assert!(trainer.history().entries().unwrap().is_empty());
    }

    #[test]
    fn selection_overrides() {
        let args = SelectionArgs {
            list: Some("animals".into()),
            algorithm: Some(AlgorithmId::Random),
            random: true,
            ..SelectionArgs::default()
        };
        let base = Config {
            custom_list: Some(PathBuf::from("mine.txt")),
            ..Config::default()
        };
        let cfg = args.apply(base);
        assert_eq!(cfg.active_list, "animals");
        assert_eq!(cfg.custom_list, None);
        assert_eq!(cfg.algorithm, AlgorithmId::Random);
        assert!(!cfg.algorithm_enabled);
    }

    #[test]
    fn ages_read_naturally() {
        let now = Utc::now();
        assert_eq!(format_age(now, now), "now");
        assert_eq!(format_age(now + Duration::minutes(5), now), "now");
        let hours = format_age(now - Duration::hours(3), now);
        assert!(hours.ends_with("ago") && hours.contains("hour"), "{hours}");
        let days = format_age(now - Duration::days(4), now);
        assert!(days.ends_with("ago") && days.contains("day"), "{days}");
    }

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
        let cli = Cli::parse_from([
            "drawdrill", "record", "-s", "owl", "-c", "Birds", "-r", "got-it", "--secs", "120",
        ]);
        match cli.command {
            Command::Record { rating, secs, .. } => {
                assert_eq!(rating, Rating::GotIt);
                assert_eq!(secs, 120);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
