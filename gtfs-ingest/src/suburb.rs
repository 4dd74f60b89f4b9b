use geo::{Contains, Point, Polygon};

/// sentinel suburb for stops outside every known boundary polygon, e.g.
/// coach stops over the state border.
pub const INTERSTATE_SUBURB: &str = "Interstate";

/// the suburb-boundary collaborator: a static set of named polygons with a
/// point-in-polygon lookup. built once per ingestion run from whatever
/// boundary source the caller has.
pub struct SuburbBoundaries {
    suburbs: Vec<(String, Polygon<f64>)>,
}

impl SuburbBoundaries {
    pub fn new(suburbs: Vec<(String, Polygon<f64>)>) -> SuburbBoundaries {
        SuburbBoundaries { suburbs }
    }

    pub fn empty() -> SuburbBoundaries {
        SuburbBoundaries {
            suburbs: Vec::new(),
        }
    }

    /// the name of the first polygon containing the point, falling back to
    /// the interstate sentinel.
    pub fn suburb_of(&self, location: &Point<f64>) -> &str {
        self.suburbs
            .iter()
            .find(|(_, polygon)| polygon.contains(location))
            .map(|(name, _)| name.as_str())
            .unwrap_or(INTERSTATE_SUBURB)
    }
}
