//! Interactive commands read from stdin

use anyhow::{anyhow, bail, Context};
use encore_playback::RepeatMode;
use std::str::FromStr;
use std::time::Duration;

pub const HELP: &str = "\
commands:
  library               list library tracks
  play <n>              play library track n (same track toggles)
  all [n]               queue the whole library, start at n
  now <n>               play library track n as the only queue entry
  pause | toggle        pause / play-pause
  next | prev           skip forward / back
  seek <secs>           move the playhead
  vol <0-100> | mute    volume
  shuffle               toggle shuffle
  repeat [off|one|all]  cycle or set repeat mode
  autoplay <on|off>     advance at end of track
  queue                 show the queue
  add <n> | addall      append library track n / the whole library
  remove <id>           drop a track id from the queue
  move <from> <to>      reorder the queue
  clear                 empty the queue
  status                print the player state as JSON
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Library,
    Play(usize),
    PlayAll(usize),
    PlayNow(usize),
    Pause,
    Toggle,
    Next,
    Previous,
    Seek(Duration),
    Volume(u8),
    Mute,
    Shuffle,
    Repeat(Option<RepeatMode>),
    Autoplay(bool),
    Queue,
    Add(usize),
    AddAll,
    Remove(String),
    Move(usize, usize),
    Clear,
    Status,
    Help,
    Quit,
}

fn arg<'a>(args: &[&'a str], name: &str) -> anyhow::Result<&'a str> {
    args.first()
        .copied()
        .ok_or_else(|| anyhow!("missing argument <{}>", name))
}

fn number<T: FromStr>(args: &[&str], name: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    arg(args, name)?
        .parse()
        .with_context(|| format!("invalid <{}>", name))
}

fn position(args: &[&str]) -> anyhow::Result<Duration> {
    let secs: f64 = number(args, "secs")?;
    if secs.is_nan() {
        bail!("invalid <secs>: not a number");
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|_| anyhow!("invalid <secs>: expected 0 or more, got {}", secs))
}

fn repeat_mode(value: &str) -> anyhow::Result<RepeatMode> {
    match value {
        "off" => Ok(RepeatMode::Off),
        "one" => Ok(RepeatMode::One),
        "all" => Ok(RepeatMode::All),
        other => bail!("unknown repeat mode '{}'", other),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };
        let args: Vec<&str> = words.collect();

        let command = match name {
            "library" | "ls" => Command::Library,
            "play" | "p" => Command::Play(number(&args, "n")?),
            "all" => Command::PlayAll(if args.is_empty() { 0 } else { number(&args, "n")? }),
            "now" => Command::PlayNow(number(&args, "n")?),
            "pause" => Command::Pause,
            "toggle" | "t" => Command::Toggle,
            "next" | "n" => Command::Next,
            "prev" | "previous" => Command::Previous,
            "seek" => Command::Seek(position(&args)?),
            "vol" | "volume" => Command::Volume(number(&args, "0-100")?),
            "mute" => Command::Mute,
            "shuffle" => Command::Shuffle,
            "repeat" => Command::Repeat(args.first().map(|m| repeat_mode(m)).transpose()?),
            "autoplay" => Command::Autoplay(match arg(&args, "on|off")? {
                "on" => true,
                "off" => false,
                other => bail!("expected on or off, got '{}'", other),
            }),
            "queue" | "q" => Command::Queue,
            "add" => Command::Add(number(&args, "n")?),
            "addall" => Command::AddAll,
            "remove" | "rm" => Command::Remove(arg(&args, "id")?.to_string()),
            "move" | "mv" => {
                let from = number(&args, "from")?;
                let to = number(args.get(1..).unwrap_or_default(), "to")?;
                Command::Move(from, to)
            }
            "clear" => Command::Clear,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}' (try 'help')", other),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!("next".parse::<Command>().unwrap(), Command::Next);
        assert_eq!("  toggle  ".parse::<Command>().unwrap(), Command::Toggle);
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!("play 2".parse::<Command>().unwrap(), Command::Play(2));
        assert_eq!("all".parse::<Command>().unwrap(), Command::PlayAll(0));
        assert_eq!(
            "seek 12.5".parse::<Command>().unwrap(),
            Command::Seek(Duration::from_millis(12_500))
        );
        assert_eq!("vol 40".parse::<Command>().unwrap(), Command::Volume(40));
        assert_eq!("move 0 3".parse::<Command>().unwrap(), Command::Move(0, 3));
        assert_eq!(
            "remove trk-1".parse::<Command>().unwrap(),
            Command::Remove("trk-1".to_string())
        );
        assert_eq!(
            "autoplay off".parse::<Command>().unwrap(),
            Command::Autoplay(false)
        );
    }

    #[test]
    fn repeat_cycles_or_sets() {
        assert_eq!("repeat".parse::<Command>().unwrap(), Command::Repeat(None));
        assert_eq!(
            "repeat all".parse::<Command>().unwrap(),
            Command::Repeat(Some(RepeatMode::All))
        );
        assert!("repeat twice".parse::<Command>().is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("play".parse::<Command>().is_err());
        assert!("vol loud".parse::<Command>().is_err());
        assert!("vol 300".parse::<Command>().is_err());
        assert!("move 1".parse::<Command>().is_err());
    }

    #[test]
    fn seek_rejects_unrepresentable_positions() {
        for input in ["seek inf", "seek 1e20", "seek NaN", "seek -5"] {
            assert!(input.parse::<Command>().is_err(), "{} should be rejected", input);
        }
        assert_eq!(
            "seek 0".parse::<Command>().unwrap(),
            Command::Seek(Duration::ZERO)
        );
    }
}
