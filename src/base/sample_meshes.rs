use gemlab::mesh::{Cell, Mesh, Point};
use gemlab::shapes::GeoKind;

/// Holds sample meshes of rods
pub struct SampleMeshes {}

impl SampleMeshes {
    /// Returns a straight rod starting at the origin
    ///
    /// ```text
    /// 0----1----2----3 ... → direction
    /// ```
    ///
    /// Points are numbered sequentially along the rod; the point order of each
    /// cell follows gemlab (end points first, then interior points).
    ///
    /// # Input
    ///
    /// * `length` -- total length
    /// * `n_element` -- number of cells
    /// * `kind` -- Lin2, Lin3, or Lin4
    /// * `direction` -- (unit) direction of the axis
    pub fn straight_rod(length: f64, n_element: usize, kind: GeoKind, direction: &[f64; 3]) -> Mesh {
        let nnode = kind.nnode();
        let n_segment = n_element * (nnode - 1);
        let h = length / (n_segment as f64);
        let points = (0..(n_segment + 1))
            .map(|p| Point {
                id: p,
                marker: if p == 0 || p == n_segment { -1 } else { 0 },
                coords: vec![
                    (p as f64) * h * direction[0],
                    (p as f64) * h * direction[1],
                    (p as f64) * h * direction[2],
                ],
            })
            .collect();
        let cells = (0..n_element)
            .map(|e| {
                let a = e * (nnode - 1);
                let points = match nnode {
                    2 => vec![a, a + 1],
                    3 => vec![a, a + 2, a + 1],
                    _ => vec![a, a + 3, a + 1, a + 2],
                };
                Cell {
                    id: e,
                    attribute: 1,
                    kind,
                    points,
                }
            })
            .collect();
        Mesh { ndim: 3, points, cells }
    }

    /// Returns a quarter of a circular arc in the xy-plane (centered at the origin)
    ///
    /// ```text
    ///  y
    ///  ↑ n
    ///  |   `.
    ///  |     \
    ///  o------0 → x
    /// ```
    ///
    /// The arc starts at (radius, 0, 0) and ends at (0, radius, 0).
    pub fn quarter_arc(radius: f64, n_element: usize, kind: GeoKind) -> Mesh {
        let nnode = kind.nnode();
        let n_segment = n_element * (nnode - 1);
        let dt = std::f64::consts::FRAC_PI_2 / (n_segment as f64);
        let points = (0..(n_segment + 1))
            .map(|p| {
                let t = (p as f64) * dt;
                Point {
                    id: p,
                    marker: 0,
                    coords: vec![radius * f64::cos(t), radius * f64::sin(t), 0.0],
                }
            })
            .collect();
        let cells = (0..n_element)
            .map(|e| {
                let a = e * (nnode - 1);
                let points = match nnode {
                    2 => vec![a, a + 1],
                    3 => vec![a, a + 2, a + 1],
                    _ => vec![a, a + 3, a + 1, a + 2],
                };
                Cell {
                    id: e,
                    attribute: 1,
                    kind,
                    points,
                }
            })
            .collect();
        Mesh { ndim: 3, points, cells }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
