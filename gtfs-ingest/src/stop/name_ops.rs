use std::collections::HashMap;
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

/// road-type words that mark a name component as a street, used to decide
/// whether an intersection name merges by its full name.
const STREET_TYPES: [&str; 20] = [
    "Road",
    "Street",
    "Avenue",
    "Parade",
    "Highway",
    "Freeway",
    "Crescent",
    "Court",
    "Drive",
    "Grove",
    "Boulevard",
    "Terrace",
    "Lane",
    "Place",
    "Close",
    "Way",
    "Esplanade",
    "Circuit",
    "Square",
    "Track",
];

/// compass suffixes ignored when classifying a street name, e.g.
/// `Main Road West`.
const COMPASS_SUFFIXES: [&str; 4] = ["North", "South", "East", "West"];

static WORD_EXPANSIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("Rd", "Road"),
        ("St", "Street"),
        ("Ave", "Avenue"),
        ("Av", "Avenue"),
        ("Pde", "Parade"),
        ("Hwy", "Highway"),
        ("Fwy", "Freeway"),
        ("Cres", "Crescent"),
        ("Ct", "Court"),
        ("Dr", "Drive"),
        ("Gr", "Grove"),
        ("Gve", "Grove"),
        ("Blvd", "Boulevard"),
        ("Bvd", "Boulevard"),
        ("Tce", "Terrace"),
        ("Ln", "Lane"),
        ("Pl", "Place"),
        ("Cl", "Close"),
        ("Esp", "Esplanade"),
        ("Gdns", "Gardens"),
        ("Mt", "Mount"),
        ("Stn", "Railway Station"),
    ])
});

/// a trailing `(Suburb)` group, including the interstate
/// `(Suburb (State))` and `(Suburb (Area - State))` forms.
static TRAILING_SUBURB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\(([^()]+(?:\([^()]*\))?)\)$").unwrap());

/// stop number conventions, tried in order. the prefix form requires a
/// non-digit after the dash so address ranges like `123-456 Road` are not
/// mistaken for numbered stops.
static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+[A-Za-z]?)-([^\d].*)$").unwrap());
static NUMBER_STOP_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*-\s*Stop\s+([A-Za-z0-9]+)$").unwrap());
static NUMBER_HASH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*#([A-Za-z0-9]+)$").unwrap());

pub fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().join(" ")
}

/// repairs the fixed-width truncation the feed applies to long names:
/// a suburb group opened but never closed (e.g. `Smith Street (Carlton Nor`)
/// is dropped entirely, then whitespace runs are collapsed.
pub fn sanitize_name(raw: &str) -> String {
    let mut open_positions = Vec::new();
    for (position, c) in raw.char_indices() {
        match c {
            '(' => open_positions.push(position),
            ')' => {
                open_positions.pop();
            }
            _ => {}
        }
    }
    let trimmed = match open_positions.first() {
        Some(&first_unclosed) => &raw[..first_unclosed],
        None => raw,
    };
    collapse_whitespace(trimmed)
}

/// splits a trailing suburb group off a sanitized name. the suburb keeps
/// any interstate qualifier, with the abbreviated saint/mount prefixes
/// expanded.
pub fn strip_suburb(name: &str) -> (String, Option<String>) {
    match TRAILING_SUBURB.captures(name) {
        Some(captures) => (
            captures[1].to_string(),
            Some(expand_suburb(&captures[2])),
        ),
        None => (name.to_string(), None),
    }
}

pub fn expand_suburb(suburb: &str) -> String {
    if let Some(rest) = suburb.strip_prefix("St ") {
        format!("St. {rest}")
    } else if let Some(rest) = suburb.strip_prefix("Mt ") {
        format!("Mount {rest}")
    } else {
        suburb.to_string()
    }
}

/// extracts an optional stop number via the naming conventions, returning
/// the remaining name.
pub fn extract_stop_number(name: &str) -> (String, Option<String>) {
    if let Some(captures) = NUMBER_PREFIX.captures(name) {
        return (captures[2].to_string(), Some(captures[1].to_string()));
    }
    if let Some(captures) = NUMBER_STOP_SUFFIX.captures(name) {
        return (captures[1].to_string(), Some(captures[2].to_string()));
    }
    if let Some(captures) = NUMBER_HASH_SUFFIX.captures(name) {
        return (captures[1].to_string(), Some(captures[2].to_string()));
    }
    (name.to_string(), None)
}

/// expands one `/`-separated name component word by word. `St` leading a
/// component reads as Saint; a bare `Station` gains its `Railway` qualifier.
fn expand_name_part(part: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for (index, word) in part.split(' ').enumerate() {
        if word == "St" && index == 0 {
            words.push("St.");
        } else if word == "Station" {
            if words.last() != Some(&"Railway") {
                words.push("Railway");
            }
            words.push("Station");
        } else {
            words.push(WORD_EXPANSIONS.get(word).copied().unwrap_or(word));
        }
    }
    words.join(" ")
}

/// the canonical full name: every component expanded, separators preserved.
pub fn expand_stop_name(name: &str) -> String {
    name.split('/').map(expand_name_part).join("/")
}

/// splits a full name on its last separator into primary and secondary
/// components.
pub fn split_stop_name(full_name: &str) -> (&str, Option<&str>) {
    match full_name.rfind('/') {
        Some(position) => (&full_name[..position], Some(&full_name[position + 1..])),
        None => (full_name, None),
    }
}

/// whether a name component reads as a street, ignoring a compass suffix.
pub fn is_street(part: &str) -> bool {
    let mut words: Vec<&str> = part.split(' ').collect();
    if let Some(last) = words.last() {
        if COMPASS_SUFFIXES.contains(last) {
            words.pop();
        }
    }
    match words.last() {
        Some(last) => STREET_TYPES.contains(last),
        None => false,
    }
}

/// the primary dedup key for a stop: street intersections merge by full
/// name, landmark stops merge by their primary component alone.
pub fn merge_name(full_name: &str) -> &str {
    let (primary, secondary) = split_stop_name(full_name);
    if secondary.is_some() && is_street(primary) {
        full_name
    } else {
        primary
    }
}
