//! Loader - builds the CSR store from an external source
//!
//! The wire format hides behind [`GraphSource`]: the loader only sees shortcut
//! and edge records. [`CsvSource`] reads the two delivery tables produced by
//! the offline builder; [`MemorySource`] feeds records directly (tests,
//! embedding).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::graph::{EdgeMeta, Inside, Shortcut, ShortcutGraph, MAX_VIA_EDGE};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("source produced no usable {0}")]
    Empty(&'static str),
}

/// One row of the shortcuts table.
#[derive(Debug, Clone, Copy)]
pub struct ShortcutRecord {
    pub from_edge: u32,
    pub to_edge: u32,
    pub cost: f64,
    pub via_edge: u32,
    pub cell: u64,
    pub inside: Inside,
}

/// One row of the edges table.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: u32,
    pub from_cell: u64,
    pub to_cell: u64,
    pub lca_res: i8,
    pub length: f64,
    pub cost: f64,
    /// (lon, lat) pairs in degrees.
    pub geometry: Vec<(f64, f64)>,
}

/// Abstract ingestion source: two logical tables plus optional key/value
/// dataset info.
pub trait GraphSource {
    fn read_shortcuts(&mut self) -> Result<Vec<ShortcutRecord>, LoadError>;
    fn read_edges(&mut self) -> Result<Vec<EdgeRecord>, LoadError>;
    fn dataset_info(&mut self) -> Result<HashMap<String, String>, LoadError> {
        Ok(HashMap::new())
    }
}

/// Build a fresh graph from a source. Either returns a fully-built store or
/// nothing; partial state never escapes.
pub fn build_graph(source: &mut dyn GraphSource) -> Result<ShortcutGraph, LoadError> {
    let mut records = source.read_shortcuts()?;
    if records.is_empty() {
        return Err(LoadError::Empty("shortcuts"));
    }

    let mut max_edge_id = 0u32;
    for rec in &records {
        max_edge_id = max_edge_id.max(rec.from_edge).max(rec.to_edge);
    }

    // Stable sort keeps same-source shortcuts in input order.
    records.sort_by_key(|r| r.from_edge);

    let n = max_edge_id as usize;
    let mut counts = vec![0u32; n + 1];
    for rec in &records {
        counts[rec.from_edge as usize] += 1;
    }

    let mut fwd_offsets = vec![0u32; n + 2];
    let mut offset = 0u32;
    for i in 0..=n {
        fwd_offsets[i] = offset;
        offset += counts[i];
    }
    fwd_offsets[n + 1] = offset;

    let shortcuts: Vec<Shortcut> = records
        .iter()
        .map(|r| {
            Shortcut::new(
                r.from_edge,
                r.to_edge,
                r.cost as f32,
                r.via_edge,
                r.cell,
                r.inside,
            )
        })
        .collect();

    counts.fill(0);
    for sc in &shortcuts {
        counts[sc.to as usize] += 1;
    }

    let mut bwd_offsets = vec![0u32; n + 2];
    offset = 0;
    for i in 0..=n {
        bwd_offsets[i] = offset;
        offset += counts[i];
    }
    bwd_offsets[n + 1] = offset;

    let mut cursor: Vec<u32> = bwd_offsets[..=n].to_vec();
    let mut bwd_indices = vec![0u32; shortcuts.len()];
    for (i, sc) in shortcuts.iter().enumerate() {
        let t = sc.to as usize;
        bwd_indices[cursor[t] as usize] = i as u32;
        cursor[t] += 1;
    }

    let edges = source.read_edges()?;
    if edges.is_empty() {
        return Err(LoadError::Empty("edges"));
    }
    let mut edge_meta: FxHashMap<u32, EdgeMeta> = FxHashMap::default();
    for e in edges {
        edge_meta.insert(
            e.id,
            EdgeMeta {
                from_cell: e.from_cell,
                to_cell: e.to_cell,
                lca_res: e.lca_res,
                length: e.length,
                cost: e.cost,
                geometry: e.geometry,
            },
        );
    }

    info!(
        shortcuts = shortcuts.len(),
        edges = edge_meta.len(),
        max_edge_id,
        "graph loaded"
    );

    Ok(ShortcutGraph::from_parts(
        shortcuts,
        fwd_offsets,
        bwd_offsets,
        bwd_indices,
        max_edge_id,
        edge_meta,
    ))
}

// ============================================================
// CSV SOURCE
// ============================================================

/// CSV-backed source: one shortcuts table and one edges table, both with a
/// header row. The edges table accepts either the `from_cell`/`to_cell` or
/// the `incoming_cell`/`outgoing_cell` column naming.
pub struct CsvSource {
    shortcuts_path: PathBuf,
    edges_path: PathBuf,
    info: HashMap<String, String>,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(shortcuts: P, edges: Q) -> CsvSource {
        CsvSource {
            shortcuts_path: shortcuts.as_ref().to_path_buf(),
            edges_path: edges.as_ref().to_path_buf(),
            info: HashMap::new(),
        }
    }

    pub fn with_info(mut self, info: HashMap<String, String>) -> CsvSource {
        self.info = info;
        self
    }
}

/// Split one CSV line on commas, honoring double-quoted fields (geometry
/// strings contain commas).
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Column indices by header name; the first matching alias wins.
fn find_column(header: &[String], aliases: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| aliases.iter().any(|a| h.trim().eq_ignore_ascii_case(a)))
}

fn require_column(header: &[String], aliases: &[&str]) -> Result<usize, LoadError> {
    find_column(header, aliases)
        .ok_or_else(|| LoadError::Schema(format!("missing column {}", aliases[0])))
}

/// Parse `LINESTRING (lon lat, lon lat, ...)` into (lon, lat) pairs.
/// Anything unparseable yields an empty geometry.
fn parse_linestring(wkt: &str) -> Vec<(f64, f64)> {
    let Some(open) = wkt.find('(') else {
        return Vec::new();
    };
    let Some(close) = wkt.rfind(')') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    wkt[open + 1..close]
        .split(',')
        .filter_map(|pair| {
            let mut it = pair.split_whitespace();
            let lon = it.next()?.parse::<f64>().ok()?;
            let lat = it.next()?.parse::<f64>().ok()?;
            Some((lon, lat))
        })
        .collect()
}

impl GraphSource for CsvSource {
    fn read_shortcuts(&mut self) -> Result<Vec<ShortcutRecord>, LoadError> {
        let file = File::open(&self.shortcuts_path)?;
        let mut lines = BufReader::new(file).lines();

        let header = match lines.next() {
            Some(line) => split_csv_line(&line?),
            None => return Err(LoadError::Empty("shortcuts")),
        };
        let col_from = require_column(&header, &["from_edge"])?;
        let col_to = require_column(&header, &["to_edge"])?;
        let col_cost = require_column(&header, &["cost"])?;
        let col_via = require_column(&header, &["via_edge"])?;
        let col_cell = require_column(&header, &["cell"])?;
        let col_inside = require_column(&header, &["inside"])?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (lineno, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_csv_line(&line);
            match parse_shortcut_row(
                &fields, col_from, col_to, col_cost, col_via, col_cell, col_inside,
            ) {
                Some(rec) => records.push(rec),
                None => {
                    skipped += 1;
                    warn!(line = lineno + 2, "skipping malformed shortcut row");
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "shortcut rows skipped");
        }
        Ok(records)
    }

    fn read_edges(&mut self) -> Result<Vec<EdgeRecord>, LoadError> {
        let file = File::open(&self.edges_path)?;
        let mut lines = BufReader::new(file).lines();

        let header = match lines.next() {
            Some(line) => split_csv_line(&line?),
            None => return Err(LoadError::Empty("edges")),
        };
        let col_id = require_column(&header, &["id"])?;
        let col_from_cell = require_column(&header, &["from_cell", "incoming_cell"])?;
        let col_to_cell = require_column(&header, &["to_cell", "outgoing_cell"])?;
        let col_lca_res = require_column(&header, &["lca_res"])?;
        let col_length = require_column(&header, &["length"])?;
        let col_cost = require_column(&header, &["cost"])?;
        let col_geometry = find_column(&header, &["geometry"]);

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (lineno, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_csv_line(&line);
            match parse_edge_row(
                &fields,
                col_id,
                col_from_cell,
                col_to_cell,
                col_lca_res,
                col_length,
                col_cost,
                col_geometry,
            ) {
                Some(rec) => records.push(rec),
                None => {
                    skipped += 1;
                    warn!(line = lineno + 2, "skipping malformed edge row");
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "edge rows skipped");
        }
        Ok(records)
    }

    fn dataset_info(&mut self) -> Result<HashMap<String, String>, LoadError> {
        Ok(self.info.clone())
    }
}

fn parse_shortcut_row(
    fields: &[String],
    col_from: usize,
    col_to: usize,
    col_cost: usize,
    col_via: usize,
    col_cell: usize,
    col_inside: usize,
) -> Option<ShortcutRecord> {
    let from_edge: i64 = fields.get(col_from)?.trim().parse().ok()?;
    let to_edge: i64 = fields.get(col_to)?.trim().parse().ok()?;
    let cost: f64 = fields.get(col_cost)?.trim().parse().ok()?;
    let via_edge: i64 = fields.get(col_via)?.trim().parse().ok()?;
    let cell: i64 = fields.get(col_cell)?.trim().parse().ok()?;
    let inside: i8 = fields.get(col_inside)?.trim().parse().ok()?;

    if from_edge < 0 || to_edge < 0 || via_edge < 0 {
        return None;
    }
    if via_edge > MAX_VIA_EDGE as i64 || !cost.is_finite() || cost < 0.0 {
        return None;
    }
    Some(ShortcutRecord {
        from_edge: from_edge as u32,
        to_edge: to_edge as u32,
        cost,
        via_edge: via_edge as u32,
        cell: cell as u64,
        inside: Inside::from_i8(inside)?,
    })
}

#[allow(clippy::too_many_arguments)]
fn parse_edge_row(
    fields: &[String],
    col_id: usize,
    col_from_cell: usize,
    col_to_cell: usize,
    col_lca_res: usize,
    col_length: usize,
    col_cost: usize,
    col_geometry: Option<usize>,
) -> Option<EdgeRecord> {
    let id: i64 = fields.get(col_id)?.trim().parse().ok()?;
    let from_cell: i64 = fields.get(col_from_cell)?.trim().parse().ok()?;
    let to_cell: i64 = fields.get(col_to_cell)?.trim().parse().ok()?;
    let lca_res: i64 = fields.get(col_lca_res)?.trim().parse().ok()?;
    let length: f64 = fields.get(col_length)?.trim().parse().ok()?;
    let cost: f64 = fields.get(col_cost)?.trim().parse().ok()?;

    if id < 0 || id > u32::MAX as i64 {
        return None;
    }
    if !(-1..=15).contains(&lca_res) {
        return None;
    }
    if !length.is_finite() || length < 0.0 || !cost.is_finite() || cost < 0.0 {
        return None;
    }

    let geometry = col_geometry
        .and_then(|c| fields.get(c))
        .map(|wkt| parse_linestring(wkt))
        .unwrap_or_default();

    Some(EdgeRecord {
        id: id as u32,
        from_cell: from_cell as u64,
        to_cell: to_cell as u64,
        lca_res: lca_res as i8,
        length,
        cost,
        geometry,
    })
}

// ============================================================
// MEMORY SOURCE
// ============================================================

/// In-memory source for tests and embedding.
#[derive(Default)]
pub struct MemorySource {
    pub shortcuts: Vec<ShortcutRecord>,
    pub edges: Vec<EdgeRecord>,
    pub info: HashMap<String, String>,
}

impl MemorySource {
    pub fn new(shortcuts: Vec<ShortcutRecord>, edges: Vec<EdgeRecord>) -> MemorySource {
        MemorySource {
            shortcuts,
            edges,
            info: HashMap::new(),
        }
    }
}

impl GraphSource for MemorySource {
    fn read_shortcuts(&mut self) -> Result<Vec<ShortcutRecord>, LoadError> {
        Ok(self.shortcuts.clone())
    }

    fn read_edges(&mut self) -> Result<Vec<EdgeRecord>, LoadError> {
        Ok(self.edges.clone())
    }

    fn dataset_info(&mut self) -> Result<HashMap<String, String>, LoadError> {
        Ok(self.info.clone())
    }
}
