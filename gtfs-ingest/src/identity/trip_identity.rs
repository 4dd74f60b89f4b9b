use std::sync::LazyLock;

use regex::Regex;

use crate::ingest_error::IngestError;
use crate::mode::TransitMode;

/// rail trips run towards the central terminus ("Up") or away from it
/// ("Down").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailDirection {
    Up,
    Down,
}

impl RailDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RailDirection::Up => "Up",
            RailDirection::Down => "Down",
        }
    }
}

/// operator metadata recovered from a raw trip identifier. every field is
/// best-effort: the passthrough recognizer produces an empty identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripIdentity {
    pub run_id: Option<String>,
    pub depot: Option<String>,
    pub direction: Option<RailDirection>,
    pub is_rail_replacement: bool,
}

pub struct TripRecognizer {
    pub name: &'static str,
    pub can_process: fn(&str) -> bool,
    pub parse: fn(&str, TransitMode) -> Result<TripIdentity, IngestError>,
}

/// the legacy dot-separated bus-run format `SEQ.CLASS.ROUTE.VARIANT.SUFFIX`,
/// e.g. `1.T0.6-452-mjp-1.1.H`. the leading sequence number carries a
/// 2-digit operator depot code on depot-coded exports.
static DEPOT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\w+)\.([^.]+)\.(\d+)\.([A-Z])$").unwrap());

/// the fixed-width run-number format `MM-ROUTE-F-N-TC-RUN`, e.g.
/// `02-SUY--11-T2-Z000` or `02-STY-R-12-T6-BP436`. the third segment is an
/// optional flag; `R` marks a rail replacement trip.
static FIXED_WIDTH_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})-([A-Za-z0-9]+)-([A-Z]?)-(\d+)-(T\d+)-([A-Za-z0-9]+)$").unwrap()
});

/// run tokens of rail replacement buses in the fixed-width format, e.g.
/// `BW000`.
const RAIL_BUS_RUN_PREFIX: char = 'B';
const RAIL_BUS_RUN_LENGTH: usize = 5;

fn parse_depot_run(raw: &str, _mode: TransitMode) -> Result<TripIdentity, IngestError> {
    let captures = DEPOT_RUN
        .captures(raw)
        .ok_or_else(|| IngestError::MalformedIdentifierError {
            identifier: raw.to_string(),
            recognizer: "depot run",
        })?;
    let sequence = &captures[1];
    let calendar_class = &captures[2];
    let full_route_id = &captures[3];
    let variant = &captures[4];
    let suffix = &captures[5];

    // the route token of `6-452-mjp-1` is `452`
    let route_token = full_route_id.split('-').nth(1).unwrap_or(full_route_id);
    let depot = if sequence.len() >= 2 {
        Some(sequence[..2].to_string())
    } else {
        None
    };
    let run_id = format!(
        "{}-{route_token}-{variant}-{calendar_class}-{suffix}",
        depot.as_deref().unwrap_or(sequence)
    );

    Ok(TripIdentity {
        run_id: Some(run_id),
        depot,
        direction: None,
        is_rail_replacement: false,
    })
}

fn parse_fixed_width_run(raw: &str, mode: TransitMode) -> Result<TripIdentity, IngestError> {
    let captures =
        FIXED_WIDTH_RUN
            .captures(raw)
            .ok_or_else(|| IngestError::MalformedIdentifierError {
                identifier: raw.to_string(),
                recognizer: "fixed width run",
            })?;
    let flag = &captures[3];
    let run_id = captures[6].to_string();

    let looks_like_rail_bus_run = run_id.len() == RAIL_BUS_RUN_LENGTH
        && run_id.starts_with(RAIL_BUS_RUN_PREFIX);
    let is_rail_replacement = flag == "R" || looks_like_rail_bus_run;

    // rail runs are numbered by direction: an even final digit is a
    // citybound (Up) working
    let direction = if mode.is_rail() {
        run_id
            .chars()
            .rev()
            .find(|c| c.is_ascii_digit())
            .map(|digit| {
                if digit.to_digit(10).unwrap_or(1) % 2 == 0 {
                    RailDirection::Up
                } else {
                    RailDirection::Down
                }
            })
    } else {
        None
    };

    Ok(TripIdentity {
        run_id: Some(run_id),
        depot: Some(captures[1].to_string()),
        direction,
        is_rail_replacement,
    })
}

fn parse_passthrough(_raw: &str, _mode: TransitMode) -> Result<TripIdentity, IngestError> {
    Ok(TripIdentity::default())
}

/// the trip chain, most specific first. the passthrough fallback always
/// applies, so dispatch is total.
pub static TRIP_RECOGNIZERS: &[TripRecognizer] = &[
    TripRecognizer {
        name: "depot run",
        can_process: |raw| DEPOT_RUN.is_match(raw),
        parse: parse_depot_run,
    },
    TripRecognizer {
        name: "fixed width run",
        can_process: |raw| FIXED_WIDTH_RUN.is_match(raw),
        parse: parse_fixed_width_run,
    },
    TripRecognizer {
        name: "passthrough",
        can_process: |_| true,
        parse: parse_passthrough,
    },
];

/// extracts operator metadata from a raw trip identifier via the first
/// applicable recognizer.
pub fn resolve_trip_identity(
    raw: &str,
    mode: TransitMode,
) -> Result<TripIdentity, IngestError> {
    let raw = raw.trim();
    for recognizer in TRIP_RECOGNIZERS {
        if (recognizer.can_process)(raw) {
            return (recognizer.parse)(raw, mode);
        }
    }
    unreachable!("the passthrough trip recognizer accepts every identifier")
}
