//! Reading parameter files.
//!
//! One loader handles both historical column orders. The header row decides
//! which column holds the name and which the value; anything else in the
//! header is rejected instead of guessed at.

use std::collections::BTreeMap;
use std::path::Path;

use miette::SourceSpan;
use pest::Parser;
use pest::iterators::Pair;

use super::defaults;
use super::{CsPoint, ParameterWarning};
use crate::errors::{GadError, ParseError, SourceContext};
use crate::log::debug;
use crate::{ParamsParser, Rule};

/// A parameter value and where it was written
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawValue {
    pub value: f64,
    pub span: Option<SourceSpan>,
}

/// Everything a parameter file contained, before validation
#[derive(Debug, Clone, Default)]
pub struct RawParameters {
    pub source: SourceContext,
    /// Values keyed by upper-case name
    pub values: BTreeMap<String, RawValue>,
    pub cross_section: Vec<CsPoint>,
    pub warnings: Vec<ParameterWarning>,
}

impl RawParameters {
    /// An empty set not backed by any file
    pub fn new() -> Self {
        Self {
            source: SourceContext::in_memory(),
            ..Self::default()
        }
    }

    /// Set a value from outside the file, replacing any file value.
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(
            name.trim().to_ascii_uppercase(),
            RawValue { value, span: None },
        );
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).map(|v| v.value)
    }
}

/// Which column holds what, as announced by the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrder {
    /// `Parameter | Value | Description`
    NameFirst,
    /// `Value | Variable | Description`
    ValueFirst,
}

impl ColumnOrder {
    fn detect(cells: &[Cell<'_>]) -> Option<Self> {
        let first = cells.first()?.lower();
        let second = cells.get(1)?.lower();
        let is_name = |s: &str| matches!(s, "parameter" | "variable" | "name");
        if is_name(&first) && second == "value" {
            Some(ColumnOrder::NameFirst)
        } else if first == "value" && is_name(&second) {
            Some(ColumnOrder::ValueFirst)
        } else {
            None
        }
    }

    fn split<'c, 'a>(self, cells: &'c [Cell<'a>]) -> (Option<&'c Cell<'a>>, Option<&'c Cell<'a>>) {
        match self {
            ColumnOrder::NameFirst => (cells.first(), cells.get(1)),
            ColumnOrder::ValueFirst => (cells.get(1), cells.first()),
        }
    }
}

/// One field of a row, trimmed, with its byte span
#[derive(Debug, Clone)]
struct Cell<'a> {
    text: std::borrow::Cow<'a, str>,
    span: SourceSpan,
}

impl Cell<'_> {
    fn lower(&self) -> String {
        self.text.to_ascii_lowercase()
    }
}

/// One non-blank row
struct Row<'a> {
    cells: Vec<Cell<'a>>,
    span: SourceSpan,
}

// ============================================================================
// Entry points
// ============================================================================

/// Read and parse a parameter file from disk.
pub fn load_parameters(path: &Path) -> Result<RawParameters, GadError> {
    let text = std::fs::read_to_string(path).map_err(|source| GadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_parameters(&path.display().to_string(), &text)?)
}

/// Read a separate two-column `chainage, rl` file.
pub fn load_cross_section(path: &Path) -> Result<Vec<CsPoint>, GadError> {
    let text = std::fs::read_to_string(path).map_err(|source| GadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_cross_section(&path.display().to_string(), &text)?)
}

/// Parse the text of a parameter file.
pub fn parse_parameters(name: &str, text: &str) -> Result<RawParameters, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let source = SourceContext::new(name, text);
    let rows = split_rows(&source, text)?;

    let mut rows = rows.into_iter();
    let header = rows.next().ok_or_else(|| ParseError::Empty {
        src: source.named_source(),
    })?;
    let order = ColumnOrder::detect(&header.cells).ok_or_else(|| ParseError::UnknownHeader {
        src: source.named_source(),
        span: header.span,
    })?;
    debug!(?order, "detected parameter column order");

    let mut raw = RawParameters {
        source: source.clone(),
        ..RawParameters::default()
    };
    let mut interleaved: BTreeMap<usize, Interleaved> = BTreeMap::new();
    let mut in_table = false;

    for row in rows {
        if is_cross_section_header(&row.cells) {
            in_table = true;
            continue;
        }
        if in_table {
            raw.cross_section.push(point_from_row(&source, &row)?);
            continue;
        }

        let (name_cell, value_cell) = order.split(&row.cells);
        let name = name_cell.map(|c| c.text.to_ascii_uppercase()).unwrap_or_default();
        if name.is_empty() {
            return Err(ParseError::Syntax {
                message: "row has no parameter name".into(),
                src: source.named_source(),
                span: row.span,
            });
        }
        let value_span = value_cell.map(|c| c.span).unwrap_or(row.span);
        let value_text = value_cell.map(|c| c.text.as_ref()).unwrap_or("");
        let value = parse_number(&source, &name, value_text, value_span)?;

        if let Some((index, kind)) = interleaved_index(&name) {
            let slot = interleaved.entry(index).or_default();
            match kind {
                Axis::Chainage => slot.chainage = Some(value),
                Axis::Level => slot.level = Some(value),
            }
            slot.span = value_span;
            continue;
        }

        if let Some(first) = raw.values.get(&name) {
            return Err(ParseError::Duplicate {
                name,
                src: source.named_source(),
                first: first.span.unwrap_or(row.span),
                second: row.span,
            });
        }
        if !defaults::is_known(&name) {
            raw.warnings.push(ParameterWarning::Unknown { name: name.clone() });
        }
        raw.values.insert(
            name,
            RawValue {
                value,
                span: Some(value_span),
            },
        );
    }

    for (index, slot) in interleaved {
        let point = match (slot.chainage, slot.level) {
            (Some(chainage), Some(rl)) => CsPoint { chainage, rl },
            (Some(_), None) => {
                return Err(unpaired(&source, index, "a chainage", "level", slot.span));
            }
            (None, _) => {
                return Err(unpaired(&source, index, "a level", "chainage", slot.span));
            }
        };
        raw.cross_section.push(point);
    }

    debug!(
        values = raw.values.len(),
        points = raw.cross_section.len(),
        "parsed parameter file"
    );
    Ok(raw)
}

/// Parse a two-column cross-section table. A header row is optional.
pub fn parse_cross_section(name: &str, text: &str) -> Result<Vec<CsPoint>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let source = SourceContext::new(name, text);
    let mut points = Vec::new();
    for (i, row) in split_rows(&source, text)?.into_iter().enumerate() {
        if i == 0 && is_cross_section_header(&row.cells) {
            continue;
        }
        points.push(point_from_row(&source, &row)?);
    }
    Ok(points)
}

// ============================================================================
// Row handling
// ============================================================================

fn split_rows<'a>(source: &SourceContext, text: &'a str) -> Result<Vec<Row<'a>>, ParseError> {
    let file = ParamsParser::parse(Rule::file, text).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p),
            pest::error::InputLocation::Span(s) => s,
        };
        ParseError::Syntax {
            message: e.variant.message().into_owned(),
            src: source.named_source(),
            span: (start, end.saturating_sub(start)).into(),
        }
    })?;

    let mut rows = Vec::new();
    for pair in file.flatten().filter(|p| p.as_rule() == Rule::row) {
        let span = to_span(&pair);
        let cells: Vec<Cell<'a>> = pair.into_inner().map(cell).collect();
        let blank = cells.iter().all(|c| c.text.is_empty());
        let comment = cells.first().is_some_and(|c| c.text.starts_with('#'));
        if !blank && !comment {
            rows.push(Row { cells, span });
        }
    }
    Ok(rows)
}

fn cell<'a>(field: Pair<'a, Rule>) -> Cell<'a> {
    let span = to_span(&field);
    let text = match field.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted => {
            let body = inner.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            if body.contains("\"\"") {
                std::borrow::Cow::Owned(body.replace("\"\"", "\"").trim().to_string())
            } else {
                std::borrow::Cow::Borrowed(body.trim())
            }
        }
        Some(bare) => std::borrow::Cow::Borrowed(bare.as_str().trim()),
        None => std::borrow::Cow::Borrowed(""),
    };
    Cell { text, span }
}

fn to_span(pair: &Pair<'_, Rule>) -> SourceSpan {
    let s = pair.as_span();
    (s.start(), s.end() - s.start()).into()
}

fn parse_number(
    source: &SourceContext,
    name: &str,
    text: &str,
    span: SourceSpan,
) -> Result<f64, ParseError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            name: name.to_string(),
            value: text.to_string(),
            src: source.named_source(),
            span,
        })
}

fn is_cross_section_header(cells: &[Cell<'_>]) -> bool {
    match (cells.first(), cells.get(1)) {
        (Some(a), Some(b)) => {
            a.lower() == "chainage" && matches!(b.lower().as_str(), "rl" | "level" | "reduced level")
        }
        _ => false,
    }
}

fn point_from_row(source: &SourceContext, row: &Row<'_>) -> Result<CsPoint, ParseError> {
    let chainage_cell = row.cells.first();
    let rl_cell = row.cells.get(1);
    let chainage = parse_number(
        source,
        "chainage",
        chainage_cell.map(|c| c.text.as_ref()).unwrap_or(""),
        chainage_cell.map(|c| c.span).unwrap_or(row.span),
    )?;
    let rl = parse_number(
        source,
        "rl",
        rl_cell.map(|c| c.text.as_ref()).unwrap_or(""),
        rl_cell.map(|c| c.span).unwrap_or(row.span),
    )?;
    Ok(CsPoint { chainage, rl })
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Chainage,
    Level,
}

#[derive(Debug, Clone, Copy)]
struct Interleaved {
    chainage: Option<f64>,
    level: Option<f64>,
    span: SourceSpan,
}

impl Default for Interleaved {
    fn default() -> Self {
        Self {
            chainage: None,
            level: None,
            span: (0, 0).into(),
        }
    }
}

/// `CHAINAGE_3` → (3, Chainage), `LEVEL_3` → (3, Level)
fn interleaved_index(name: &str) -> Option<(usize, Axis)> {
    let (rest, axis) = if let Some(rest) = name.strip_prefix("CHAINAGE") {
        (rest, Axis::Chainage)
    } else if let Some(rest) = name.strip_prefix("LEVEL") {
        (rest, Axis::Level)
    } else {
        return None;
    };
    let index = rest.trim_start_matches('_').parse().ok()?;
    Some((index, axis))
}

fn unpaired(
    source: &SourceContext,
    index: usize,
    present: &'static str,
    missing: &'static str,
    span: SourceSpan,
) -> ParseError {
    ParseError::UnpairedPoint {
        index,
        present,
        missing,
        src: source.named_source(),
        span,
    }
}
