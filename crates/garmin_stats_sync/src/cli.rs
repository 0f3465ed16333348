//! Command-line parsing for the `garmin-stats-sync` binary.

use crate::error::{SyncError, SyncResult};
use chrono::NaiveDate;
use garmin_connect_client::utils::{next_day, parse_day};

pub const USAGE: &str = "\
usage:
  garmin-stats-sync sync <start YYYY-MM-DD> [<end YYYY-MM-DD>]   end is exclusive, defaults to start + 1 day
  garmin-stats-sync inspect <YYYY-MM-DD>                          print what the service reports for a day
  garmin-stats-sync list                                          print every stored row";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sync { start: NaiveDate, end: NaiveDate },
    Inspect { day: NaiveDate },
    List,
}

impl Command {
    /// Parse the arguments that follow the program name.
    pub fn parse<I, S>(args: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["sync", start] => {
                let start = day_arg(start)?;
                Ok(Command::Sync {
                    start,
                    end: next_day(start),
                })
            }
            ["sync", start, end] => {
                let (start, end) = (day_arg(start)?, day_arg(end)?);
                if start >= end {
                    return Err(SyncError::Usage(format!(
                        "end date {end} must be after start date {start}"
                    )));
                }
                Ok(Command::Sync { start, end })
            }
            ["inspect", day] => Ok(Command::Inspect { day: day_arg(day)? }),
            ["list"] => Ok(Command::List),
            _ => Err(SyncError::Usage(USAGE.to_string())),
        }
    }
}

fn day_arg(s: &str) -> SyncResult<NaiveDate> {
    parse_day(s).ok_or_else(|| SyncError::Usage(format!("invalid date {s:?}, expected YYYY-MM-DD")))
}
