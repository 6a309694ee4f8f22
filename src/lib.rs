use std::{io, path::Path, path::PathBuf};

use glam::DVec3;
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info};

/// The sum the four labels of a candidate tetrahedron must reach.
pub const TARGET_LABEL_SUM: u32 = 100;

/// Largest label a point may carry. The smallest is zero.
pub const MAX_LABEL: u8 = 100;

/// A Tetrahedron, represented as 4x 3D points.
#[derive(Debug, Clone, Copy)]
pub struct Tetrahedron {
    vertices: [DVec3; 4],
}

impl Tetrahedron {
    pub fn new(vertices: [DVec3; 4]) -> Tetrahedron {
        Self { vertices }
    }

    pub fn from_points(points: [&LabeledPoint; 4]) -> Tetrahedron {
        Self::new(points.map(|p| p.position))
    }

    /// Returns the signed volume of this [`Tetrahedron`]. Positive when the edges
    /// from the first vertex form a right-handed frame.
    pub fn signed_volume(&self) -> f64 {
        let a = self.vertices[1] - self.vertices[0];
        let b = self.vertices[2] - self.vertices[0];
        let c = self.vertices[3] - self.vertices[0];

        (a.cross(b)).dot(c) / 6.0
    }

    /// Returns the volume of this [`Tetrahedron`].
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Coplanar or repeated vertices.
    pub fn is_degenerate(&self) -> bool {
        self.volume() == 0.0
    }

    pub fn vertices(&self) -> &[DVec3; 4] {
        &self.vertices
    }
}

// =============================================================================

/// A tetrahedron, represented as 4x indicies into a point array.
///
/// Indicies are kept in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TetrahedronIndex {
    vertices: [usize; 4],
}

impl TetrahedronIndex {
    pub fn new(mut vertices: [usize; 4]) -> Self {
        vertices.sort();
        Self { vertices }
    }

    pub fn indices(&self) -> [usize; 4] {
        self.vertices
    }

    /// Look up the vertices by each point's stored index. Returns `None` if any
    /// index is missing from `points`.
    pub fn realize(&self, points: &[LabeledPoint]) -> Option<Tetrahedron> {
        let mut vertices = [DVec3::ZERO; 4];
        for (slot, &wanted) in vertices.iter_mut().zip(&self.vertices) {
            *slot = points.iter().find(|p| p.index == wanted)?.position;
        }
        Some(Tetrahedron::new(vertices))
    }
}

// =============================================================================

/// A 3D point with an integer label, tagged with its position in the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledPoint {
    index: usize,
    position: DVec3,
    label: u8,
}

impl LabeledPoint {
    /// # Panics
    ///
    /// Panics if `label` is above [`MAX_LABEL`].
    pub fn new(index: usize, position: DVec3, label: u8) -> Self {
        assert!(label <= MAX_LABEL, "label {label} above {MAX_LABEL}");
        Self {
            index,
            position,
            label,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn label(&self) -> u8 {
        self.label
    }

    /// Parse one `x,y,z,n` record, optionally wrapped in parentheses.
    pub fn parse(index: usize, line: &str) -> Result<Self, RecordError> {
        let record = line.trim().trim_matches(|c| c == '(' || c == ')');

        let fields: Vec<&str> = record.split(',').map(str::trim).collect();
        let [x, y, z, n] = fields[..] else {
            return Err(RecordError::FieldCount(fields.len()));
        };

        if let Some(field) = [x, y, z, n].iter().position(|f| f.is_empty()) {
            return Err(RecordError::EmptyField { field });
        }

        let coord = |field: usize, value: &str| match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(RecordError::InvalidCoordinate {
                field,
                value: value.to_owned(),
            }),
        };
        let position = DVec3::new(coord(0, x)?, coord(1, y)?, coord(2, z)?);

        let label: i64 = n.parse().map_err(|_| RecordError::InvalidLabel {
            value: n.to_owned(),
        })?;
        let label = match u8::try_from(label) {
            Ok(l) if l <= MAX_LABEL => l,
            _ => return Err(RecordError::LabelOutOfRange(label)),
        };

        Ok(Self::new(index, position, label))
    }
}

// =============================================================================

/// Why a single record was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("expected 4 comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("field {field} is empty")]
    EmptyField { field: usize },
    #[error("field {field} ({value:?}) is not a finite number")]
    InvalidCoordinate { field: usize, value: String },
    #[error("label {value:?} is not an integer")]
    InvalidLabel { value: String },
    #[error("label {0} is outside 0..=100")]
    LabelOutOfRange(i64),
}

impl RecordError {
    /// Everything except a well-formed but out-of-range label.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, RecordError::LabelOutOfRange(_))
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("the file {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid record on line {line} ({record:?})")]
    Record {
        line: usize,
        record: String,
        #[source]
        source: RecordError,
    },
}

impl LoadError {
    pub fn record_error(&self) -> Option<&RecordError> {
        match self {
            LoadError::Record { source, .. } => Some(source),
            _ => None,
        }
    }
}

// =============================================================================

/// Parse every line of `text` into a point. The first bad line fails the whole load.
pub fn parse_points(text: &str) -> Result<Vec<LabeledPoint>, LoadError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            LabeledPoint::parse(i, line).map_err(|source| LoadError::Record {
                line: i + 1,
                record: line.to_owned(),
                source,
            })
        })
        .collect()
}

pub fn load_points(path: impl AsRef<Path>) -> Result<Vec<LabeledPoint>, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.to_owned()),
        _ => LoadError::Io {
            path: path.to_owned(),
            source,
        },
    })?;

    let points = parse_points(&text)?;
    debug!(path = %path.display(), count = points.len(), "loaded points");
    Ok(points)
}

// =============================================================================

/// The winning tetrahedron of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumTetrahedron {
    pub tetra: TetrahedronIndex,
    pub volume: f64,
}

impl MinimumTetrahedron {
    pub fn indices(&self) -> [usize; 4] {
        self.tetra.indices()
    }
}

/// Find the smallest-volume tetrahedron whose four labels sum to
/// [`TARGET_LABEL_SUM`].
///
/// Every 4-combination is visited lazily in lexicographic order of position.
/// Only a strictly smaller volume replaces the current best, so the first
/// minimizer found wins ties. Returns `None` when no combination qualifies.
pub fn find_min_tetrahedron(points: &[LabeledPoint]) -> Option<MinimumTetrahedron> {
    let mut best: Option<MinimumTetrahedron> = None;
    let mut candidates = 0usize;

    for (a, b, c, d) in points.iter().tuple_combinations() {
        let sum: u32 = [a, b, c, d].iter().map(|p| u32::from(p.label)).sum();
        if sum != TARGET_LABEL_SUM {
            continue;
        }
        candidates += 1;

        let volume = Tetrahedron::from_points([a, b, c, d]).volume();
        if volume < best.map_or(f64::INFINITY, |m| m.volume) {
            best = Some(MinimumTetrahedron {
                tetra: TetrahedronIndex::new([a.index, b.index, c.index, d.index]),
                volume,
            });
        }
    }

    debug!(points = points.len(), candidates, "search finished");
    best
}

/// Sorted indices of the smallest valid tetrahedron, or an empty vector.
pub fn smallest_valid_tetrahedron_indices(points: &[LabeledPoint]) -> Vec<usize> {
    find_min_tetrahedron(points)
        .map(|m| m.indices().to_vec())
        .unwrap_or_default()
}

/// Load a point file and search it.
pub fn solve(path: impl AsRef<Path>) -> Result<Option<MinimumTetrahedron>, LoadError> {
    let path = path.as_ref();
    let points = load_points(path)?;
    let found = find_min_tetrahedron(&points);

    match &found {
        Some(m) => info!(
            path = %path.display(),
            indices = ?m.indices(),
            volume = m.volume,
            "found tetrahedron"
        ),
        None => info!(path = %path.display(), "no valid tetrahedron"),
    }

    Ok(found)
}

// =============================================================================
