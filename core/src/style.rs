use std::collections::BTreeMap;

use colored::{Color, ColoredString, Colorize};

use crate::testing::{ErrorKind, Report};

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

/// Coarse classification of a report, used for colouring and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
pub enum Status {
    #[strum(serialize = "OK")]
    Ok,
    /// Completed, but at or past the deadline.
    #[strum(serialize = "NA")]
    NoSample,
    #[strum(serialize = "TLE")]
    Timeout,
    #[strum(serialize = "INT")]
    Interrupted,
    #[strum(serialize = "ERR")]
    Error,
}

impl From<&Report> for Status {
    fn from(r: &Report) -> Self {
        match r.error() {
            Some(ErrorKind::Timeout) => Status::Timeout,
            Some(ErrorKind::Interrupted) => Status::Interrupted,
            Some(ErrorKind::Execution) => Status::Error,
            None if r.time().is_some() => Status::Ok,
            None => Status::NoSample,
        }
    }
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for Status {
    fn color(&self) -> Color {
        use Status::*;
        if !self::is_truecolor_supported() {
            return match self {
                Ok => Color::Green,
                NoSample => Color::Yellow,
                Timeout => Color::Red,
                Interrupted => Color::Blue,
                Error => Color::Magenta,
            };
        }

        match self {
            Ok => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            NoSample => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            Timeout => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
            Interrupted => Color::TrueColor {
                r: 60,
                g: 110,
                b: 220,
            },
            Error => Color::TrueColor {
                r: 171,
                g: 40,
                b: 200,
            },
        }
    }
}

pub fn status_icon(status: Status) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", status)
        .on_color(status.color())
        .bold()
        .color(fg)
}

pub fn count_statuses(reports: &[Report]) -> BTreeMap<Status, usize> {
    reports.iter().fold(BTreeMap::new(), |mut count, r| {
        *count.entry(Status::from(r)).or_default() += 1;
        count
    })
}

pub fn print_summary(reports: &[Report]) {
    let bar = "-".repeat(5);
    let count = count_statuses(reports);
    let total = reports.len();
    let ok = count.get(&Status::Ok).copied().unwrap_or(0);

    let detail = count
        .iter()
        .map(|(&status, &cnt)| {
            format!(
                "{}{}{}",
                status_icon(status),
                "x".dimmed(),
                cnt.to_string().bold().bright_white(),
            )
        })
        .collect::<Vec<String>>()
        .join(", ");

    let msg = format!("{}/{} cases timed", ok, total);
    let msg = if ok == total {
        msg.green()
    } else {
        msg.bright_red()
    };
    eprintln!("{} {} ({}) {}", bar, msg, detail, bar);
}
