//! SNP posterior cluster models
//!
//! apt genotyping writes one posterior model per marker and copy number. Two
//! text dialects exist:
//!
//! | Dialect  | First line            | Fields | Statistics | Copy number suffix | Columns        |
//! |----------|-----------------------|--------|------------|--------------------|----------------|
//! | BRLMM-P  | `id\tBB\tAB\tAA\tCV`  | `\t`   | `,`        | `:1` / `:2`        | BB, AB, AA, CV |
//! | Birdseed | data (no tab)         | `;`    | whitespace | `-1` / `-2`        | AA, (AB), BB   |
//!
//! Birdseed omits the AB column for copy-number-1 markers. Haploid models
//! always expose an undefined (NaN) AB cluster.
//!
//! ## Example
//!
//! ```rust,no_run
//! use affyconv::models::ClusterModelStore;
//!
//! let models = ClusterModelStore::from_path("AxiomGT1.snp-posteriors.txt")?;
//! if let Some(snp) = models.lookup("AX-11086525") {
//!     println!("{} AA mean {}", snp.marker_id, snp.aa.mean_x);
//! }
//! # Ok::<(), affyconv::models::ModelError>(())
//! ```

mod error;


pub use error::ModelError;

use std::collections::HashMap;
use std::io::{BufRead, Cursor, Read};
use std::path::Path;

use csv::StringRecord;
use log::info;
use serde::Serialize;

use crate::genotypes::Call;
use crate::text::{first_content_line, open_text};

/// Header line of BRLMM-P model tables
pub const BRLMMP_HEADER: &str = "id\tBB\tAB\tAA\tCV";

/// Statistics of one genotype cluster
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterStats {
    /// Mean on the first axis (contrast or signal A)
    pub mean_x: f32,
    /// Variance on the first axis
    pub var_x: f32,
    /// Pseudo-observations behind the mean
    pub mean_weight: f32,
    /// Pseudo-observations behind the variance
    pub var_weight: f32,
    /// Mean on the second axis (size or signal B)
    pub mean_y: f32,
    /// Variance on the second axis
    pub var_y: f32,
    /// Covariance of both axes
    pub cov_xy: f32,
}

impl ClusterStats {
    /// Cluster with every statistic undefined
    pub fn undefined() -> Self {
        Self {
            mean_x: f32::NAN,
            var_x: f32::NAN,
            mean_weight: f32::NAN,
            var_weight: f32::NAN,
            mean_y: f32::NAN,
            var_y: f32::NAN,
            cov_xy: f32::NAN,
        }
    }

    /// All seven statistics in table order
    pub fn values(&self) -> [f32; 7] {
        [
            self.mean_x,
            self.var_x,
            self.mean_weight,
            self.var_weight,
            self.mean_y,
            self.var_y,
            self.cov_xy,
        ]
    }

    fn from_brlmmp(v: &[f32]) -> Self {
        Self {
            mean_x: v[0],
            var_x: v[1],
            mean_weight: v[2],
            var_weight: v[3],
            mean_y: v[4],
            var_y: v[5],
            cov_xy: v[6],
        }
    }

    // Birdseed carries one weight for both the mean and the variance.
    fn from_birdseed(v: &[f32]) -> Self {
        Self {
            mean_x: v[0],
            mean_y: v[1],
            var_x: v[2],
            cov_xy: v[3],
            var_y: v[4],
            mean_weight: v[5],
            var_weight: v[5],
        }
    }
}

/// Copy number bucket of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Ploidy {
    /// Copy number 1 (e.g. chrY, male chrX)
    Haploid,
    /// Copy number 2
    Diploid,
}

impl Ploidy {
    /// Copy number of the bucket
    pub fn copy_number(&self) -> u8 {
        match self {
            Ploidy::Haploid => 1,
            Ploidy::Diploid => 2,
        }
    }
}

/// Coordinate system the cluster means are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClusterSpace {
    /// Signal A / signal B intensities (Birdseed)
    SignalPair,
    /// Contrast / size, log2 based (BRLMM-P, AxiomGT1)
    ContrastSize,
}

/// Model table dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelDialect {
    /// BRLMM-P / AxiomGT1 posteriors
    BrlmmP,
    /// Birdseed posteriors
    Birdseed,
}

impl ModelDialect {
    /// Space the dialect's cluster means live in
    pub fn space(&self) -> ClusterSpace {
        match self {
            ModelDialect::BrlmmP => ClusterSpace::ContrastSize,
            ModelDialect::Birdseed => ClusterSpace::SignalPair,
        }
    }

    fn field_separator(&self) -> u8 {
        match self {
            ModelDialect::BrlmmP => b'\t',
            ModelDialect::Birdseed => b';',
        }
    }

    fn copy_number_separator(&self) -> char {
        match self {
            ModelDialect::BrlmmP => ':',
            ModelDialect::Birdseed => '-',
        }
    }

    fn statistics_per_cluster(&self) -> usize {
        match self {
            ModelDialect::BrlmmP => 7,
            ModelDialect::Birdseed => 6,
        }
    }
}

/// Posterior model of one marker at one copy number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnpModel {
    /// Marker id with any copy number suffix removed
    pub marker_id: String,
    /// Copy number bucket
    pub ploidy: Ploidy,
    /// Homozygous A cluster
    pub aa: ClusterStats,
    /// Heterozygous cluster (undefined for haploid models)
    pub ab: ClusterStats,
    /// Homozygous B cluster
    pub bb: ClusterStats,
}

impl SnpModel {
    /// Cluster for a call; `None` for no-calls
    pub fn cluster(&self, call: Call) -> Option<&ClusterStats> {
        match call {
            Call::AA => Some(&self.aa),
            Call::AB => Some(&self.ab),
            Call::BB => Some(&self.bb),
            Call::NoCall => None,
        }
    }

    /// Mutable cluster for a call; `None` for no-calls
    pub fn cluster_mut(&mut self, call: Call) -> Option<&mut ClusterStats> {
        match call {
            Call::AA => Some(&mut self.aa),
            Call::AB => Some(&mut self.ab),
            Call::BB => Some(&mut self.bb),
            Call::NoCall => None,
        }
    }
}

/// All models of a table, split by copy number and indexed by marker id
///
/// Read-only once loaded. Duplicate ids are kept in the entry lists but only
/// the first one is indexed.
#[derive(Debug, Clone)]
pub struct ClusterModelStore {
    dialect: ModelDialect,
    haploid: Vec<SnpModel>,
    diploid: Vec<SnpModel>,
    haploid_index: HashMap<String, usize>,
    diploid_index: HashMap<String, usize>,
}

impl ClusterModelStore {
    /// Load a plain or gzip-compressed model table
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        info!("Reading SNP models file {}", path.display());
        Self::from_reader(open_text(path)?)
    }

    /// Parse a model table, detecting the dialect from its first line
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, ModelError> {
        let first = first_content_line(&mut reader)?.ok_or(ModelError::Empty)?;
        let (dialect, leading) = if first == BRLMMP_HEADER {
            (ModelDialect::BrlmmP, String::new())
        } else if !first.contains('\t') {
            // The first Birdseed line is already a model.
            (ModelDialect::Birdseed, first + "\n")
        } else {
            return Err(ModelError::MalformedHeader(first));
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(dialect.field_separator())
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(Cursor::new(leading.into_bytes()).chain(reader));

        let mut store = Self {
            dialect,
            haploid: Vec::new(),
            diploid: Vec::new(),
            haploid_index: HashMap::new(),
            diploid_index: HashMap::new(),
        };
        let mut record = StringRecord::new();
        while csv_reader.read_record(&mut record)? {
            let model = parse_model(&record, dialect)?;
            store.push(model);
        }
        if store.is_empty() {
            return Err(ModelError::Empty);
        }

        info!(
            "Loaded {} diploid and {} haploid {:?} models",
            store.diploid.len(),
            store.haploid.len(),
            dialect
        );
        Ok(store)
    }

    fn push(&mut self, model: SnpModel) {
        let (entries, index) = match model.ploidy {
            Ploidy::Haploid => (&mut self.haploid, &mut self.haploid_index),
            Ploidy::Diploid => (&mut self.diploid, &mut self.diploid_index),
        };
        index.entry(model.marker_id.clone()).or_insert(entries.len());
        entries.push(model);
    }

    /// Table dialect
    pub fn dialect(&self) -> ModelDialect {
        self.dialect
    }

    /// Space the cluster means are expressed in
    pub fn space(&self) -> ClusterSpace {
        self.dialect.space()
    }

    /// Copy-number-1 model of a marker
    pub fn haploid(&self, marker_id: &str) -> Option<&SnpModel> {
        self.haploid_index
            .get(marker_id)
            .and_then(|&i| self.haploid.get(i))
    }

    /// Copy-number-2 model of a marker
    pub fn diploid(&self, marker_id: &str) -> Option<&SnpModel> {
        self.diploid_index
            .get(marker_id)
            .and_then(|&i| self.diploid.get(i))
    }

    /// Model used for normalization: diploid when present, else haploid
    pub fn lookup(&self, marker_id: &str) -> Option<&SnpModel> {
        self.diploid(marker_id).or_else(|| self.haploid(marker_id))
    }

    /// Entries of one copy number bucket, duplicates included, in file order
    pub fn entries(&self, ploidy: Ploidy) -> &[SnpModel] {
        match ploidy {
            Ploidy::Haploid => &self.haploid,
            Ploidy::Diploid => &self.diploid,
        }
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.haploid.len() + self.diploid.len()
    }

    /// True when the table held no model
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split an explicit copy number suffix off a marker id
fn split_copy_number(raw: &str, separator: char) -> (&str, Ploidy) {
    let mut chars = raw.chars().rev();
    let (Some(digit), Some(sep)) = (chars.next(), chars.next()) else {
        return (raw, Ploidy::Diploid);
    };
    if sep != separator {
        return (raw, Ploidy::Diploid);
    }
    match digit {
        '1' => (&raw[..raw.len() - 2], Ploidy::Haploid),
        '2' => (&raw[..raw.len() - 2], Ploidy::Diploid),
        _ => (raw, Ploidy::Diploid),
    }
}

fn parse_model(record: &StringRecord, dialect: ModelDialect) -> Result<SnpModel, ModelError> {
    let raw_id = record.get(0).unwrap_or_default();
    let (marker_id, ploidy) = split_copy_number(raw_id, dialect.copy_number_separator());

    let expected = match (dialect, ploidy) {
        (ModelDialect::Birdseed, Ploidy::Haploid) => 3,
        _ => 4,
    };
    if record.len() < expected {
        return Err(ModelError::MissingFields {
            marker: raw_id.to_string(),
            found: record.len(),
            expected,
        });
    }

    let cluster = |column: usize| parse_cluster(record, column, raw_id, dialect);
    let (aa, ab, bb) = match dialect {
        ModelDialect::BrlmmP => {
            let bb = cluster(1)?;
            // Haploid rows still carry an AB column; it is not meaningful.
            let ab = cluster(2)?;
            let aa = cluster(3)?;
            (aa, ab, bb)
        }
        ModelDialect::Birdseed => match ploidy {
            Ploidy::Haploid => (cluster(1)?, ClusterStats::undefined(), cluster(2)?),
            Ploidy::Diploid => (cluster(1)?, cluster(2)?, cluster(3)?),
        },
    };
    let ab = match ploidy {
        Ploidy::Haploid => ClusterStats::undefined(),
        Ploidy::Diploid => ab,
    };

    Ok(SnpModel {
        marker_id: marker_id.to_string(),
        ploidy,
        aa,
        ab,
        bb,
    })
}

fn parse_cluster(
    record: &StringRecord,
    column: usize,
    marker: &str,
    dialect: ModelDialect,
) -> Result<ClusterStats, ModelError> {
    let field = record.get(column).unwrap_or_default();
    let parts: Vec<&str> = match dialect {
        ModelDialect::BrlmmP => field.split(',').collect(),
        ModelDialect::Birdseed => field.split_whitespace().collect(),
    };
    let expected = dialect.statistics_per_cluster();
    if parts.len() < expected {
        return Err(ModelError::MissingStatistics {
            marker: marker.to_string(),
            column,
            found: parts.len(),
            expected,
        });
    }

    let values = parts[..expected]
        .iter()
        .map(|s| {
            s.trim().parse::<f32>().map_err(|_| ModelError::InvalidNumber {
                marker: marker.to_string(),
                value: s.to_string(),
            })
        })
        .collect::<Result<Vec<f32>, _>>()?;

    Ok(match dialect {
        ModelDialect::BrlmmP => ClusterStats::from_brlmmp(&values),
        ModelDialect::Birdseed => ClusterStats::from_birdseed(&values),
    })
}
