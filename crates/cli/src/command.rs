//! Command-line parsing.

use anyhow::{bail, Context};
use tripsync_core::types::TripId;

pub const USAGE: &str = "\
Usage: tripsync <command>

Commands:
  list                     List trips with their saved state
  show <trip-id>           Show trip detail
  save <trip-id> [notes]   Save a trip
  unsave <trip-id>         Remove a saved trip
  delete <trip-id> [--yes] Delete a trip (asks for confirmation)
  notes <trip-id> <text>   Replace the notes on a saved trip
  hotels <trip-id>         Hotel recommendations for a trip
  add-hotel <trip-id> <n>  Add the n-th recommended hotel to a trip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show(TripId),
    Save { trip_id: TripId, notes: String },
    Unsave(TripId),
    Delete { trip_id: TripId, yes: bool },
    Notes { trip_id: TripId, text: String },
    Hotels(TripId),
    /// `rank` is 1-based, as listed by `hotels`.
    AddHotel { trip_id: TripId, rank: usize },
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            bail!("missing command");
        };
        let rest: Vec<String> = args.collect();

        let command = match name.as_str() {
            "list" => {
                no_more(&rest, 0)?;
                Command::List
            }
            "show" => {
                no_more(&rest, 1)?;
                Command::Show(trip_id(&rest)?)
            }
            "save" => Command::Save {
                trip_id: trip_id(&rest)?,
                notes: rest[1..].join(" "),
            },
            "unsave" => {
                no_more(&rest, 1)?;
                Command::Unsave(trip_id(&rest)?)
            }
            "delete" => {
                let yes = rest.iter().any(|a| a == "--yes" || a == "-y");
                let positional: Vec<String> = rest
                    .into_iter()
                    .filter(|a| a != "--yes" && a != "-y")
                    .collect();
                no_more(&positional, 1)?;
                Command::Delete {
                    trip_id: trip_id(&positional)?,
                    yes,
                }
            }
            "notes" => {
                let trip_id = trip_id(&rest)?;
                if rest.len() < 2 {
                    bail!("notes requires the new text");
                }
                Command::Notes {
                    trip_id,
                    text: rest[1..].join(" "),
                }
            }
            "hotels" => {
                no_more(&rest, 1)?;
                Command::Hotels(trip_id(&rest)?)
            }
            "add-hotel" => {
                no_more(&rest, 2)?;
                let trip_id = trip_id(&rest)?;
                let raw = rest.get(1).context("missing hotel number")?;
                let rank: usize = raw
                    .parse()
                    .with_context(|| format!("invalid hotel number '{raw}'"))?;
                if rank == 0 {
                    bail!("hotel numbers start at 1");
                }
                Command::AddHotel { trip_id, rank }
            }
            other => bail!("unknown command '{other}'"),
        };
        Ok(command)
    }
}

fn trip_id(args: &[String]) -> anyhow::Result<TripId> {
    let raw = args.first().context("missing trip id")?;
    raw.parse()
        .with_context(|| format!("invalid trip id '{raw}'"))
}

fn no_more(args: &[String], expected: usize) -> anyhow::Result<()> {
    if args.len() > expected {
        bail!("unexpected argument '{}'", args[expected]);
    }
    Ok(())
}
