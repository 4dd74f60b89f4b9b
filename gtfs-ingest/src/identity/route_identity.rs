use std::sync::LazyLock;

use regex::Regex;

use crate::ingest_error::IngestError;
use crate::mode::TransitMode;

/// context available to every route recognizer: the mode of the feed being
/// ingested and the route-number field of the raw record, used by the rail
/// rewrite and the generic fallback.
#[derive(Debug, Clone, Copy)]
pub struct RouteIdContext<'a> {
    pub mode: TransitMode,
    pub route_number: Option<&'a str>,
}

/// which recognizer produced an identity. the loader uses this to decide
/// whether the route-number field should be rewritten into the route name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteIdKind {
    RailLine,
    Namespaced,
    DepotCoded,
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteIdentity {
    pub route_gtfs_id: String,
    pub kind: RouteIdKind,
}

pub struct RouteRecognizer {
    pub name: &'static str,
    pub can_process: fn(&str, &RouteIdContext) -> bool,
    pub parse: fn(&str, &RouteIdContext) -> Result<RouteIdentity, IngestError>,
}

/// rail lines published in the namespaced id format, e.g. `vic:02:ALM` or
/// the `vic:rail:ALM` variant.
static RAIL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vic:(0?1|0?2|10|rail):([A-Za-z]+)$").unwrap());

/// any other namespaced id, e.g. `vic:06:462`.
static NAMESPACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vic:0*(\d+):([A-Za-z0-9 ]+)$").unwrap());

/// the legacy depot/operator-coded format `DEPOT-ROUTE-REGION-VARIANT`,
/// e.g. `6-10x-mjp-1` or `2-ALM-vpt-1`.
static DEPOT_CODED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-([^-]+)-([A-Za-z]+)-(\d+)$").unwrap());

/// an identity this chain has already produced, accepted unchanged so that
/// normalization is idempotent.
static NORMALIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-([A-Za-z0-9]+)$").unwrap());

/// feed mode numbers that may legitimately prefix a legacy route id.
/// anything else in that position is an operator depot code and is replaced
/// with the ingesting mode's own number.
const FEED_MODE_NUMBERS: [&str; 8] = ["1", "2", "3", "4", "5", "6", "10", "11"];

/// strips characters the legacy exports leak into route tokens and
/// zero-pads purely numeric tokens to 3 digits, so `13` and `013` resolve
/// to the same identity.
fn clean_route_token(token: &str) -> String {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>3}", cleaned)
    } else {
        cleaned
    }
}

fn parse_rail_line(raw: &str, context: &RouteIdContext) -> Result<RouteIdentity, IngestError> {
    let captures = RAIL_LINE
        .captures(raw)
        .ok_or_else(|| IngestError::MalformedIdentifierError {
            identifier: raw.to_string(),
            recognizer: "rail line",
        })?;
    let mode_number = match &captures[1] {
        "rail" => context.mode.gtfs_number().to_string(),
        "10" => "1".to_string(),
        number => number.trim_start_matches('0').to_string(),
    };
    Ok(RouteIdentity {
        route_gtfs_id: format!("{mode_number}-{}", &captures[2]),
        kind: RouteIdKind::RailLine,
    })
}

fn parse_namespaced(raw: &str, _context: &RouteIdContext) -> Result<RouteIdentity, IngestError> {
    let captures = NAMESPACED
        .captures(raw)
        .ok_or_else(|| IngestError::MalformedIdentifierError {
            identifier: raw.to_string(),
            recognizer: "namespaced",
        })?;
    Ok(RouteIdentity {
        route_gtfs_id: format!("{}-{}", &captures[1], clean_route_token(&captures[2])),
        kind: RouteIdKind::Namespaced,
    })
}

fn parse_depot_coded(raw: &str, context: &RouteIdContext) -> Result<RouteIdentity, IngestError> {
    let captures = DEPOT_CODED
        .captures(raw)
        .ok_or_else(|| IngestError::MalformedIdentifierError {
            identifier: raw.to_string(),
            recognizer: "depot coded",
        })?;
    let prefix = &captures[1];
    let mode_number = if FEED_MODE_NUMBERS.contains(&prefix) {
        prefix.to_string()
    } else {
        // an operator depot code, not a feed mode number
        context.mode.gtfs_number().to_string()
    };
    Ok(RouteIdentity {
        route_gtfs_id: format!("{mode_number}-{}", clean_route_token(&captures[2])),
        kind: RouteIdKind::DepotCoded,
    })
}

fn parse_generic(raw: &str, context: &RouteIdContext) -> Result<RouteIdentity, IngestError> {
    if let Some(captures) = NORMALIZED.captures(raw) {
        return Ok(RouteIdentity {
            route_gtfs_id: format!("{}-{}", &captures[1], clean_route_token(&captures[2])),
            kind: RouteIdKind::Generic,
        });
    }
    let token = match context.route_number {
        Some(number) => clean_route_token(number),
        None => clean_route_token(raw),
    };
    if token.is_empty() {
        return Err(IngestError::MalformedIdentifierError {
            identifier: raw.to_string(),
            recognizer: "generic",
        });
    }
    Ok(RouteIdentity {
        route_gtfs_id: format!("{}-{token}", context.mode.gtfs_number()),
        kind: RouteIdKind::Generic,
    })
}

/// the route chain, most specific first. the generic fallback always
/// applies, so dispatch is total.
pub static ROUTE_RECOGNIZERS: &[RouteRecognizer] = &[
    RouteRecognizer {
        name: "rail line",
        can_process: |raw, context| context.mode.is_rail() && RAIL_LINE.is_match(raw),
        parse: parse_rail_line,
    },
    RouteRecognizer {
        name: "namespaced",
        can_process: |raw, _| NAMESPACED.is_match(raw),
        parse: parse_namespaced,
    },
    RouteRecognizer {
        name: "depot coded",
        can_process: |raw, _| DEPOT_CODED.is_match(raw),
        parse: parse_depot_coded,
    },
    RouteRecognizer {
        name: "generic",
        can_process: |_, _| true,
        parse: parse_generic,
    },
];

/// normalizes a raw route identifier via the first applicable recognizer.
pub fn resolve_route_identity(
    raw: &str,
    context: &RouteIdContext,
) -> Result<RouteIdentity, IngestError> {
    let raw = raw.trim();
    for recognizer in ROUTE_RECOGNIZERS {
        if (recognizer.can_process)(raw, context) {
            return (recognizer.parse)(raw, context);
        }
    }
    unreachable!("the generic route recognizer accepts every identifier")
}
