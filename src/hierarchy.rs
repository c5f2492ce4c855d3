//! H3 hierarchy utilities - thin fail-soft wrapper over h3o
//!
//! Every function returns the 0 sentinel (or an empty vec) on invalid input
//! instead of erroring, so callers can treat "no cell" uniformly.

use h3o::{CellIndex, LatLng, Resolution};

/// Resolution of a cell, -1 for the 0 sentinel or an invalid index.
pub fn resolution(cell: u64) -> i8 {
    match CellIndex::try_from(cell) {
        Ok(c) => u8::from(c.resolution()) as i8,
        Err(_) => -1,
    }
}

/// Coarsen `cell` to `target_res`. Identity when the cell is already at or
/// below the target resolution; 0 on invalid input.
pub fn cell_to_parent(cell: u64, target_res: i8) -> u64 {
    if target_res < 0 {
        return 0;
    }
    let Ok(c) = CellIndex::try_from(cell) else {
        return 0;
    };
    let current: u8 = c.resolution().into();
    if target_res as u8 >= current {
        return cell;
    }
    let Ok(res) = Resolution::try_from(target_res as u8) else {
        return 0;
    };
    c.parent(res).map(u64::from).unwrap_or(0)
}

/// Lowest common ancestor of two cells, walking both up from the coarser of
/// the two resolutions. 0 if either input is 0 or no shared ancestor exists
/// at resolution >= 0.
pub fn lca(cell1: u64, cell2: u64) -> u64 {
    if cell1 == 0 || cell2 == 0 {
        return 0;
    }
    let res1 = resolution(cell1);
    let res2 = resolution(cell2);
    if res1 < 0 || res2 < 0 {
        return 0;
    }
    let mut res = res1.min(res2);
    let mut c1 = cell_to_parent(cell1, res);
    let mut c2 = cell_to_parent(cell2, res);

    while c1 != c2 && res > 0 {
        res -= 1;
        c1 = cell_to_parent(c1, res);
        c2 = cell_to_parent(c2, res);
    }

    if c1 == c2 {
        c1
    } else {
        0
    }
}

/// True iff coarsening `node_cell` to `high_res` yields `high_cell`.
/// Vacuously true when there is no high cell to check against.
pub fn parent_check(node_cell: u64, high_cell: u64, high_res: i8) -> bool {
    if high_cell == 0 || high_res < 0 {
        return true;
    }
    if node_cell == 0 {
        return false;
    }
    if high_res > resolution(node_cell) {
        return false;
    }
    cell_to_parent(node_cell, high_res) == high_cell
}

/// Index a coordinate (degrees) at `res`. 0 when `res` is outside [0, 15]
/// or the coordinate is out of range.
pub fn latlng_to_cell(lat: f64, lng: f64, res: i8) -> u64 {
    if !(0..=15).contains(&res) {
        return 0;
    }
    let Ok(resolution) = Resolution::try_from(res as u8) else {
        return 0;
    };
    match LatLng::new(lat, lng) {
        Ok(ll) => u64::from(ll.to_cell(resolution)),
        Err(_) => 0,
    }
}

/// Cells at grid distance exactly `k` from `center`. `k == 0` is the center
/// itself; 0 sentinel or negative `k` yields an empty ring.
pub fn grid_ring(center: u64, k: i32) -> Vec<u64> {
    if k < 0 {
        return Vec::new();
    }
    let Ok(c) = CellIndex::try_from(center) else {
        return Vec::new();
    };
    if k == 0 {
        return vec![center];
    }
    let k = k as u32;
    c.grid_disk_distances::<Vec<_>>(k)
        .into_iter()
        .filter(|&(_, dist)| dist == k)
        .map(|(cell, _)| u64::from(cell))
        .collect()
}

/// Closed boundary polygon of a cell as (lat, lon) degrees; the first vertex
/// is repeated at the end. Empty for the 0 sentinel.
pub fn cell_boundary(cell: u64) -> Vec<(f64, f64)> {
    let Ok(c) = CellIndex::try_from(cell) else {
        return Vec::new();
    };
    let mut verts: Vec<(f64, f64)> = c
        .boundary()
        .iter()
        .map(|ll| (ll.lat(), ll.lng()))
        .collect();
    if let Some(&first) = verts.first() {
        verts.push(first);
    }
    verts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_at(lat: f64, lng: f64, res: i8) -> u64 {
        let c = latlng_to_cell(lat, lng, res);
        assert_ne!(c, 0);
        c
    }

    #[test]
    fn test_resolution_sentinel() {
        assert_eq!(resolution(0), -1);
        assert_eq!(resolution(u64::MAX), -1);
        let c = cell_at(50.8503, 4.3517, 9);
        assert_eq!(resolution(c), 9);
    }

    #[test]
    fn test_parent_identity_and_coarsening() {
        let c = cell_at(50.8503, 4.3517, 9);
        // Identity at own resolution or finer target
        assert_eq!(cell_to_parent(c, 9), c);
        assert_eq!(cell_to_parent(c, 12), c);
        // Coarsening lowers the resolution
        let parent = cell_to_parent(c, 5);
        assert_eq!(resolution(parent), 5);
        // Invalid inputs
        assert_eq!(cell_to_parent(0, 5), 0);
        assert_eq!(cell_to_parent(c, -1), 0);
    }

    #[test]
    fn test_lca_laws() {
        let c1 = cell_at(50.8503, 4.3517, 10);
        let c2 = cell_at(50.8603, 4.4017, 10);
        let ancestor = lca(c1, c2);
        assert_ne!(ancestor, 0);
        let res = resolution(ancestor);
        assert!(parent_check(c1, ancestor, res));
        assert!(parent_check(c2, ancestor, res));
        // lca of a cell with itself is the cell
        assert_eq!(lca(c1, c1), c1);
        assert_eq!(lca(c1, 0), 0);
        assert_eq!(lca(0, c2), 0);
    }

    #[test]
    fn test_parent_check_vacuous() {
        let c = cell_at(50.85, 4.35, 9);
        assert!(parent_check(c, 0, 5));
        assert!(parent_check(c, c, -1));
        assert!(!parent_check(0, c, 9));
        // A finer high cell can never be an ancestor
        let fine = cell_at(50.85, 4.35, 12);
        assert!(!parent_check(c, fine, 12));
    }

    #[test]
    fn test_latlng_to_cell_range() {
        assert_eq!(latlng_to_cell(50.85, 4.35, -1), 0);
        assert_eq!(latlng_to_cell(50.85, 4.35, 16), 0);
        assert_ne!(latlng_to_cell(50.85, 4.35, 0), 0);
        assert_ne!(latlng_to_cell(50.85, 4.35, 15), 0);
    }

    #[test]
    fn test_grid_ring() {
        let c = cell_at(50.85, 4.35, 9);
        assert_eq!(grid_ring(0, 1), Vec::<u64>::new());
        assert_eq!(grid_ring(c, 0), vec![c]);
        let ring1 = grid_ring(c, 1);
        assert_eq!(ring1.len(), 6);
        assert!(!ring1.contains(&c));
        // disk(2) = 1 + 6 + 12
        assert_eq!(grid_ring(c, 2).len(), 12);
    }

    #[test]
    fn test_cell_boundary_closed() {
        assert!(cell_boundary(0).is_empty());
        let c = cell_at(50.85, 4.35, 9);
        let boundary = cell_boundary(c);
        assert!(boundary.len() >= 7);
        assert_eq!(boundary.first(), boundary.last());
        for (lat, lon) in boundary {
            assert!((-90.0..=90.0).contains(&lat));
            assert!((-180.0..=180.0).contains(&lon));
        }
    }
}
