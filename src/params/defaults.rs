//! The documented parameter table.
//!
//! Every name a parameter file may contain is listed here with its unit,
//! group and default rule. Lengths and levels are metres, angles degrees,
//! batters are 1-in-N (horizontal per vertical) and scales are drawing
//! denominators. Rows are resolved top to bottom, so a derived default may
//! only read parameters listed above it.

use std::collections::BTreeMap;

/// How a parameter gets its value when the file does not give one
#[derive(Debug, Clone, Copy)]
pub enum DefaultRule {
    /// No default: the drawing cannot be made without it
    Mandatory,
    /// A fixed value
    Fixed(f64),
    /// Computed from parameters resolved earlier; the string documents it
    Derived(fn(&Resolved<'_>) -> f64, &'static str),
    /// Copied from the left-abutment partner, mirrored about the centreline
    MirrorOf(&'static str),
    /// Number of cross-section points supplied
    PointCount,
}

/// Range check applied after resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Any,
    Positive,
    NonNegative,
}

/// Parameter groups, in the order a parameter file usually lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Frame,
    Bridge,
    Deck,
    Pier,
    Abutment,
    RightAbutment,
    Approach,
}

/// One row of the parameter table
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub group: Group,
    pub unit: &'static str,
    pub description: &'static str,
    pub default: DefaultRule,
    pub check: Check,
}

/// Values resolved so far, as seen by a derived default
pub struct Resolved<'a>(pub(crate) &'a BTreeMap<String, f64>);

impl Resolved<'_> {
    /// Value of an earlier row. A missing name yields NaN, which the
    /// finiteness check downstream reports.
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(f64::NAN)
    }
}

/// Typical clearance between deck rectangles at a support, in metres
pub const SPAN_JOINT_GAP: f64 = 0.025;

/// Most spans one drawing can lay out
pub const MAX_SPANS: usize = 200;

/// Tolerance used when comparing lengths that should agree, in metres
pub const LENGTH_TOLERANCE: f64 = 0.001;

const fn spec(
    name: &'static str,
    group: Group,
    unit: &'static str,
    description: &'static str,
    default: DefaultRule,
    check: Check,
) -> ParamSpec {
    ParamSpec {
        name,
        group,
        unit,
        description,
        default,
        check,
    }
}

use Check::{Any, NonNegative, Positive};
use DefaultRule::{Derived, Fixed, Mandatory, MirrorOf, PointCount};
use Group::*;

pub const PARAMETERS: &[ParamSpec] = &[
    // Scales and frame
    spec("SCALE1", Frame, "", "plan and elevation scale denominator", Mandatory, Positive),
    spec("SCALE2", Frame, "", "cross-section scale denominator", Mandatory, Positive),
    spec("DATUM", Frame, "m", "reference reduced level", Mandatory, Any),
    spec("TOPRL", Frame, "m", "top reduced level of the drawable area", Mandatory, Any),
    spec("LEFT", Frame, "m", "left chainage bound", Mandatory, Any),
    spec("RIGHT", Frame, "m", "right chainage bound", Mandatory, Any),
    spec("XINCR", Frame, "m", "chainage grid increment", Fixed(10.0), Positive),
    spec("YINCR", Frame, "m", "level grid increment", Fixed(1.0), Positive),
    spec("NOCH", Frame, "", "number of cross-section points", PointCount, NonNegative),
    // Bridge
    spec("SKEW", Bridge, "deg", "skew angle", Fixed(0.0), Any),
    spec("NSPAN", Bridge, "", "number of spans", Mandatory, Positive),
    spec("SPAN1", Bridge, "m", "span length", Mandatory, Positive),
    spec("LBRIDGE", Bridge, "m", "total bridge length", Mandatory, Positive),
    spec("ABTL", Bridge, "m", "chainage of the left abutment face", Mandatory, Any),
    spec("RTL", Bridge, "m", "road top level", Mandatory, Any),
    spec("SOFL", Bridge, "m", "soffit level", Mandatory, Any),
    spec(
        "SPAN_JOINT_GAP",
        Bridge,
        "m",
        "gap between deck rectangles at each support",
        Fixed(SPAN_JOINT_GAP),
        NonNegative,
    ),
    // Deck section
    spec("CCBR", Deck, "m", "clear carriageway width", Mandatory, Positive),
    spec("KERBW", Deck, "m", "kerb width", Fixed(0.23), NonNegative),
    spec("KERBD", Deck, "m", "kerb depth", Fixed(0.15), NonNegative),
    spec(
        "SLBTHC",
        Deck,
        "m",
        "slab thickness at centre",
        Derived(|r| r.get("RTL") - r.get("SOFL"), "RTL - SOFL"),
        Positive,
    ),
    spec(
        "SLBTHE",
        Deck,
        "m",
        "slab thickness at edge",
        Derived(|r| r.get("SLBTHC"), "SLBTHC"),
        Positive,
    ),
    spec(
        "SLBTHT",
        Deck,
        "m",
        "slab thickness at tip",
        Derived(|r| r.get("SLBTHE"), "SLBTHE"),
        Positive,
    ),
    // Pier
    spec("CAPT", Pier, "m", "pier cap top level", Derived(|r| r.get("SOFL"), "SOFL"), Any),
    spec(
        "CAPB",
        Pier,
        "m",
        "pier cap bottom level",
        Derived(|r| r.get("CAPT") - 0.6, "CAPT - 0.6"),
        Any,
    ),
    spec("CAPW", Pier, "m", "pier cap width", Fixed(1.2), Positive),
    spec("PIERTW", Pier, "m", "pier top width", Fixed(1.2), Positive),
    spec("BATTR", Pier, "", "pier batter, 1 in N", Fixed(10.0), Positive),
    spec(
        "PIERST",
        Pier,
        "m",
        "pier straight length",
        Derived(|r| r.get("CCBR") + 2.0 * r.get("KERBW"), "CCBR + 2 KERBW"),
        Positive,
    ),
    spec("FUTRL", Pier, "m", "pier footing level", Derived(|r| r.get("DATUM"), "DATUM"), Any),
    spec("FUTD", Pier, "m", "pier footing depth", Fixed(1.0), Positive),
    spec("FUTW", Pier, "m", "pier footing width", Fixed(4.5), Positive),
    spec(
        "FUTL",
        Pier,
        "m",
        "pier footing length",
        Derived(|r| r.get("PIERST") + 1.0, "PIERST + 1.0"),
        Positive,
    ),
    // Left abutment
    spec("DWTH", Abutment, "m", "dirt-wall thickness", Fixed(0.3), Positive),
    spec("ALCW", Abutment, "m", "abutment cap width", Fixed(0.75), Positive),
    spec("ALCD", Abutment, "m", "abutment cap depth", Fixed(1.2), Positive),
    spec("ALFB", Abutment, "", "front face batter, 1 in N", Fixed(10.0), Positive),
    spec(
        "ALFBL",
        Abutment,
        "m",
        "front face batter bottom level",
        Derived(|r| r.get("DATUM") + 1.5, "DATUM + 1.5"),
        Any,
    ),
    spec("ALTB", Abutment, "", "toe batter, 1 in N", Fixed(10.0), Positive),
    spec(
        "ALTBL",
        Abutment,
        "m",
        "toe batter bottom level",
        Derived(|r| r.get("DATUM") + 1.0, "DATUM + 1.0"),
        Any,
    ),
    spec("ALFO", Abutment, "m", "footing front offset", Fixed(1.5), NonNegative),
    spec("ALFD", Abutment, "m", "footing depth", Fixed(1.0), Positive),
    spec("ALBB", Abutment, "", "back batter, 1 in N", Fixed(3.0), Positive),
    spec(
        "ALBBL",
        Abutment,
        "m",
        "back batter bottom level",
        Derived(|r| r.get("DATUM") + 1.5, "DATUM + 1.5"),
        Any,
    ),
    spec(
        "ABTLEN",
        Abutment,
        "m",
        "abutment length along its face",
        Derived(
            |r| {
                let c = r.get("SKEW").to_radians().cos();
                (r.get("CCBR") + 2.0 * r.get("KERBW")) / c
            },
            "(CCBR + 2 KERBW) / cos SKEW",
        ),
        Positive,
    ),
    spec(
        "ABTSYM",
        Abutment,
        "",
        "1 when the abutments are declared symmetric",
        Fixed(0.0),
        NonNegative,
    ),
    // Right abutment
    spec("ARCW", RightAbutment, "m", "abutment cap width", MirrorOf("ALCW"), Positive),
    spec("ARCD", RightAbutment, "m", "abutment cap depth", MirrorOf("ALCD"), Positive),
    spec("ARFB", RightAbutment, "", "front face batter, 1 in N", MirrorOf("ALFB"), Positive),
    spec("ARFBL", RightAbutment, "m", "front face batter bottom level", MirrorOf("ALFBL"), Any),
    spec("ARTB", RightAbutment, "", "toe batter, 1 in N", MirrorOf("ALTB"), Positive),
    spec("ARTBL", RightAbutment, "m", "toe batter bottom level", MirrorOf("ALTBL"), Any),
    spec("ARFO", RightAbutment, "m", "footing front offset", MirrorOf("ALFO"), NonNegative),
    spec("ARFD", RightAbutment, "m", "footing depth", MirrorOf("ALFD"), Positive),
    spec("ARBB", RightAbutment, "", "back batter, 1 in N", MirrorOf("ALBB"), Positive),
    spec("ARBBL", RightAbutment, "m", "back batter bottom level", MirrorOf("ALBBL"), Any),
    // Approach
    spec("LASLAB", Approach, "m", "approach slab length", Fixed(3.5), Positive),
    spec(
        "APWTH",
        Approach,
        "m",
        "approach slab width",
        Derived(|r| r.get("CCBR") + 2.0 * r.get("KERBW"), "CCBR + 2 KERBW"),
        Positive,
    ),
    spec("APTHK", Approach, "m", "approach slab thickness", Fixed(0.38), Positive),
    spec("WCTH", Approach, "m", "wearing course thickness", Fixed(0.08), NonNegative),
];

/// Look up a row of the table
pub fn lookup(name: &str) -> Option<&'static ParamSpec> {
    PARAMETERS.iter().find(|p| p.name == name)
}

/// Index of a per-span override such as `SPAN3`. `SPAN1` is a table row.
pub fn span_override(name: &str) -> Option<usize> {
    let index: usize = name.strip_prefix("SPAN")?.parse().ok()?;
    (index >= 2).then_some(index)
}

/// Whether the loader and store accept `name` without a warning
pub fn is_known(name: &str) -> bool {
    lookup(name).is_some() || span_override(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, p) in PARAMETERS.iter().enumerate() {
            assert!(
                PARAMETERS[i + 1..].iter().all(|q| q.name != p.name),
                "{} listed twice",
                p.name
            );
        }
    }

    #[test]
    fn mirrors_point_at_left_abutment_rows() {
        for p in PARAMETERS {
            if let DefaultRule::MirrorOf(partner) = p.default {
                let partner = lookup(partner).expect("partner row");
                assert_eq!(partner.group, Group::Abutment);
            }
        }
    }

    #[test]
    fn derived_defaults_read_earlier_rows() {
        let mut seen = BTreeMap::new();
        for name in ["SCALE1", "DATUM", "RTL", "SOFL", "CCBR", "SKEW"] {
            seen.insert(name.to_string(), 1.0);
        }
        seen.insert("SOFL".into(), 0.5);
        let r = Resolved(&seen);
        let rule = lookup("SLBTHC").map(|p| p.default);
        match rule {
            Some(DefaultRule::Derived(f, doc)) => {
                assert_eq!(doc, "RTL - SOFL");
                assert_eq!(f(&r), 0.5);
            }
            other => panic!("unexpected rule {other:?}"),
        }
    }

    #[test]
    fn span_overrides() {
        assert_eq!(span_override("SPAN2"), Some(2));
        assert_eq!(span_override("SPAN12"), Some(12));
        assert_eq!(span_override("SPAN1"), None);
        assert_eq!(span_override("SPAN_JOINT_GAP"), None);
        assert!(is_known("SPAN4"));
        assert!(!is_known("SPANX"));
    }
}
