//! foil.rs — Lift/drag coefficient tables per named foil profile
//!
//! A table covers angle of attack -180°..=180° at 1° resolution (361 rows).
//! Tables are immutable after load and shared through `Arc` by every force
//! computation that references the same foil name.
//!
//! CSV format (one file per foil, `<name>.csv`):
//!   alpha,cl,cd
//!   -180,0.0,0.02
//!   ...
//! Extra columns are ignored. `cl` is signed: a positive lift coefficient
//! pushes the foil toward the counter-clockwise side of the incoming flow.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, SimError};

pub const MIN_ANGLE: i32 = -180;
pub const MAX_ANGLE: i32 = 180;
const N_ROWS: usize = (MAX_ANGLE - MIN_ANGLE + 1) as usize;

/// Lift and drag coefficient pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub cl: f64,
    pub cd: f64,
}

#[derive(Debug, Clone)]
pub struct FoilTable {
    name: String,
    /// Index = alpha + 180
    rows: Vec<Coefficients>,
}

impl FoilTable {
    /// Build from (alpha, cl, cd) rows in any order.
    /// Every integer degree in [-180, 180] must appear exactly once.
    pub fn from_rows(name: &str, rows: impl IntoIterator<Item = (f64, f64, f64)>) -> Result<Self> {
        let mut slots: Vec<Option<Coefficients>> = vec![None; N_ROWS];

        for (alpha, cl, cd) in rows {
            if alpha.fract() != 0.0 || !alpha.is_finite() {
                return Err(SimError::foil(name, format!("angle {alpha} is not an integer degree")));
            }
            if alpha < MIN_ANGLE as f64 || alpha > MAX_ANGLE as f64 {
                return Err(SimError::foil(name, format!("angle {alpha} outside [-180, 180]")));
            }
            if !cl.is_finite() || !cd.is_finite() {
                return Err(SimError::foil(name, format!("non-finite coefficients at {alpha}°")));
            }
            let idx = (alpha as i32 - MIN_ANGLE) as usize;
            if slots[idx].is_some() {
                return Err(SimError::foil(name, format!("duplicate row for {alpha}°")));
            }
            slots[idx] = Some(Coefficients { cl, cd });
        }

        let missing: Vec<i32> = slots.iter().enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i as i32 + MIN_ANGLE)
            .collect();
        if !missing.is_empty() {
            let preview: Vec<String> = missing.iter().take(5).map(|a| a.to_string()).collect();
            return Err(SimError::foil(name, format!(
                "{} missing rows (first: {})", missing.len(), preview.join(", ")
            )));
        }

        Ok(Self {
            name: name.to_string(),
            rows: slots.into_iter().flatten().collect(),
        })
    }

    /// Parse CSV text with an `alpha,cl,cd` header
    pub fn from_csv_str(name: &str, csv: &str) -> Result<Self> {
        let mut lines = csv.lines().filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or_else(|| SimError::foil(name, "empty file"))?;
        let columns: Vec<String> = header.split(',').map(|c| c.trim().to_ascii_lowercase()).collect();
        let col = |wanted: &str| {
            columns.iter().position(|c| c == wanted)
                .ok_or_else(|| SimError::foil(name, format!("header lacks `{wanted}` column")))
        };
        let (i_alpha, i_cl, i_cd) = (col("alpha")?, col("cl")?, col("cd")?);

        let mut rows = Vec::with_capacity(N_ROWS);
        for (lineno, line) in lines.enumerate() {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            let field = |i: usize| -> Result<f64> {
                let raw = parts.get(i).ok_or_else(|| {
                    SimError::foil(name, format!("row {} has too few columns", lineno + 2))
                })?;
                raw.parse::<f64>().map_err(|_| {
                    SimError::foil(name, format!("row {}: cannot parse `{raw}`", lineno + 2))
                })
            };
            rows.push((field(i_alpha)?, field(i_cl)?, field(i_cd)?));
        }

        Self::from_rows(name, rows)
    }

    pub fn load_from_csv<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading foil `{name}` from {:?}", path);
        let raw = std::fs::read_to_string(path)
            .map_err(|source| SimError::Io { path: path.to_path_buf(), source })?;
        Self::from_csv_str(name, &raw)
    }

    /// Analytic thin flat-plate profile: cl = sin 2α, cd = 0.02 + (1 − cos 2α).
    /// Peak lift at ±45°, peak drag (≈2) broadside.
    pub fn flat_plate(name: &str) -> Self {
        let rows = (MIN_ANGLE..=MAX_ANGLE).map(|a| {
            let two_alpha = (2.0 * a as f64).to_radians();
            Coefficients { cl: two_alpha.sin(), cd: 0.02 + (1.0 - two_alpha.cos()) }
        }).collect();
        Self { name: name.to_string(), rows }
    }

    pub fn name(&self) -> &str { &self.name }

    /// Coefficients at an angle of attack (degrees).
    ///
    /// Angles inside [-180, 180] are used as-is so both boundary rows are
    /// reachable; anything else is wrapped into [-180, 180) first. Fractional
    /// angles interpolate linearly between neighbouring rows.
    pub fn coefficients(&self, angle_of_attack: f64) -> Coefficients {
        let a = if (MIN_ANGLE as f64..=MAX_ANGLE as f64).contains(&angle_of_attack) {
            angle_of_attack
        } else {
            sail_types::wrap_180(angle_of_attack)
        };
        if !a.is_finite() {
            return Coefficients { cl: 0.0, cd: 0.0 };
        }

        let pos = a - MIN_ANGLE as f64;
        let lo = (pos.floor() as usize).min(N_ROWS - 1);
        let frac = pos - lo as f64;
        if frac == 0.0 || lo == N_ROWS - 1 {
            return self.rows[lo];
        }
        let (c0, c1) = (self.rows[lo], self.rows[lo + 1]);
        Coefficients {
            cl: c0.cl + (c1.cl - c0.cl) * frac,
            cd: c0.cd + (c1.cd - c0.cd) * frac,
        }
    }
}

// ── Foil library ──────────────────────────────────────────────────────────────

/// Name → shared foil table
#[derive(Debug, Clone, Default)]
pub struct FoilLibrary {
    tables: HashMap<String, Arc<FoilTable>>,
}

impl FoilLibrary {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, table: FoilTable) {
        debug!("Foil library: registered `{}`", table.name());
        self.tables.insert(table.name().to_string(), Arc::new(table));
    }

    pub fn with(mut self, table: FoilTable) -> Self {
        self.insert(table);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<FoilTable>> {
        self.tables.get(name).cloned()
    }

    /// Look up a foil referenced by a config field
    pub fn require(&self, field: &str, name: &str) -> Result<Arc<FoilTable>> {
        self.get(name).ok_or_else(|| SimError::config(field, format!("unknown foil `{name}`")))
    }

    /// Load `<dir>/<name>.csv` for each requested name (duplicates loaded once)
    pub fn load_dir<P: AsRef<Path>>(dir: P, names: &[&str]) -> Result<Self> {
        let mut lib = Self::new();
        for name in names {
            if lib.tables.contains_key(*name) { continue; }
            let path = dir.as_ref().join(format!("{name}.csv"));
            lib.insert(FoilTable::load_from_csv(name, path)?);
        }
        Ok(lib)
    }

    pub fn len(&self) -> usize { self.tables.len() }
    pub fn is_empty(&self) -> bool { self.tables.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_rows() -> Vec<(f64, f64, f64)> {
        (MIN_ANGLE..=MAX_ANGLE).map(|a| (a as f64, a as f64 / 100.0, 0.5 + a as f64 / 1000.0)).collect()
    }

    fn synthetic_csv() -> String {
        let mut s = String::from("alpha,cl,cd,cm\n");
        for (a, cl, cd) in synthetic_rows() {
            s.push_str(&format!("{a},{cl},{cd},0.0\n"));
        }
        s
    }

    #[test]
    fn test_every_integer_degree_returns_recorded_row() {
        let table = FoilTable::from_rows("synthetic", synthetic_rows()).unwrap();
        for (a, cl, cd) in synthetic_rows() {
            let c = table.coefficients(a);
            assert_eq!(c.cl, cl, "cl at {a}");
            assert_eq!(c.cd, cd, "cd at {a}");
        }
        // Both boundaries are distinct rows in this table
        assert_eq!(table.coefficients(180.0).cl, 1.8);
        assert_eq!(table.coefficients(-180.0).cl, -1.8);
    }

    #[test]
    fn test_out_of_domain_input_wraps() {
        let table = FoilTable::from_rows("synthetic", synthetic_rows()).unwrap();
        assert_eq!(table.coefficients(370.0), table.coefficients(10.0));
        assert_eq!(table.coefficients(-190.0), table.coefficients(170.0));
        assert_eq!(table.coefficients(540.0), table.coefficients(-180.0));
    }

    #[test]
    fn test_fractional_angle_interpolates() {
        let table = FoilTable::from_rows("synthetic", synthetic_rows()).unwrap();
        let c = table.coefficients(10.5);
        assert!((c.cl - 0.105).abs() < 1e-12);
        assert!((c.cd - 0.5105).abs() < 1e-12);
    }

    #[test]
    fn test_csv_roundtrip_ignores_extra_columns() {
        let table = FoilTable::from_csv_str("csv", &synthetic_csv()).unwrap();
        assert_eq!(table.coefficients(-45.0).cl, -0.45);
        assert_eq!(table.name(), "csv");
    }

    #[test]
    fn test_missing_row_is_malformed() {
        let rows: Vec<_> = synthetic_rows().into_iter().filter(|r| r.0 != 42.0).collect();
        let err = FoilTable::from_rows("gap", rows).unwrap_err();
        assert!(matches!(err, SimError::MalformedFoilData { .. }), "{err}");
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_duplicate_and_out_of_range_rows_are_malformed() {
        let mut rows = synthetic_rows();
        rows.push((0.0, 0.0, 0.0));
        assert!(matches!(FoilTable::from_rows("dup", rows), Err(SimError::MalformedFoilData { .. })));

        let mut rows = synthetic_rows();
        rows.push((181.0, 0.0, 0.0));
        assert!(matches!(FoilTable::from_rows("range", rows), Err(SimError::MalformedFoilData { .. })));

        let mut rows = synthetic_rows();
        rows[10].0 = -169.5;
        assert!(matches!(FoilTable::from_rows("frac", rows), Err(SimError::MalformedFoilData { .. })));
    }

    #[test]
    fn test_bad_header_is_malformed() {
        let err = FoilTable::from_csv_str("hdr", "angle,lift,drag\n0,0,0\n").unwrap_err();
        assert!(err.to_string().contains("alpha"));
        assert!(FoilTable::from_csv_str("empty", "").is_err());
    }

    #[test]
    fn test_flat_plate_shape() {
        let plate = FoilTable::flat_plate("flat_plate");
        assert!(plate.coefficients(0.0).cl.abs() < 1e-12);
        assert!((plate.coefficients(45.0).cl - 1.0).abs() < 1e-12);
        assert!((plate.coefficients(-45.0).cl + 1.0).abs() < 1e-12);
        assert!(plate.coefficients(90.0).cd > plate.coefficients(10.0).cd);
    }

    #[test]
    fn test_library_shares_tables() {
        let lib = FoilLibrary::new().with(FoilTable::flat_plate("flat_plate"));
        let a = lib.get("flat_plate").unwrap();
        let b = lib.require("sail_foil", "flat_plate").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(matches!(
            lib.require("keel_foil", "naca0012"),
            Err(SimError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_load_dir_reads_csv_files() {
        let dir = std::env::temp_dir().join(format!("sail-foils-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("synthetic.csv"), synthetic_csv()).unwrap();

        let lib = FoilLibrary::load_dir(&dir, &["synthetic", "synthetic"]).unwrap();
        assert_eq!(lib.len(), 1);
        assert!(matches!(
            FoilLibrary::load_dir(&dir, &["absent"]),
            Err(SimError::Io { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
