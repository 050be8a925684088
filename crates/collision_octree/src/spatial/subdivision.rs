//! Overlapping child layouts
//!
//! A plain octree forces any triangle that crosses a split plane up into the
//! parent. Here the children overlap: besides the primary cells there are
//! cells centred on every split, so a triangle that crosses one boundary
//! still finds a child about the size of an octant.

use crate::foundation::math::Vec3;
use crate::spatial::AABB;

/// How a cell is split into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdivisionLayout {
    /// Nine full-height cells on the x/z plane, for flat regions
    Planar,
    /// Twenty-seven octant-sized cells
    Volumetric,
}

impl SubdivisionLayout {
    /// Pick the layout for `bounds`: planar when the cell is less than half as tall as it is wide
    pub fn for_bounds(bounds: &AABB) -> Self {
        if bounds.height() < bounds.width() * 0.5 {
            Self::Planar
        } else {
            Self::Volumetric
        }
    }

    /// Number of children this layout produces
    pub const fn child_count(self) -> usize {
        match self {
            Self::Planar => 9,
            Self::Volumetric => 27,
        }
    }
}

/// Planar cells as (x, z) quarter-offset steps, in insertion priority order
const PLANAR_STEPS: [(f32, f32); 8] = [
    // quadrants
    (-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0),
    // centred on a quadrant boundary
    (-1.0, 0.0), (1.0, 0.0), (0.0, -1.0), (0.0, 1.0),
];

/// Bounds of every child of `bounds`, in the order insertion probes them
pub fn child_cells(bounds: &AABB) -> Vec<AABB> {
    match SubdivisionLayout::for_bounds(bounds) {
        SubdivisionLayout::Planar => planar_cells(bounds),
        SubdivisionLayout::Volumetric => volumetric_cells(bounds),
    }
}

fn planar_cells(bounds: &AABB) -> Vec<AABB> {
    let center = bounds.center();
    let half = bounds.extents();
    let quarter = Vec3::new(half.x * 0.5, half.y, half.z * 0.5);

    let mut cells: Vec<AABB> = PLANAR_STEPS
        .iter()
        .map(|&(x, z)| {
            let offset = Vec3::new(x * quarter.x, 0.0, z * quarter.z);
            AABB::from_center_extents(center + offset, quarter)
        })
        .collect();

    // small center cell
    cells.push(AABB::from_center_extents(
        center,
        Vec3::new(quarter.x * 0.5, half.y, quarter.z * 0.5),
    ));
    cells
}

fn volumetric_cells(bounds: &AABB) -> Vec<AABB> {
    let center = bounds.center();
    let quarter = bounds.extents() * 0.5;
    let cell = |x: f32, y: f32, z: f32| {
        AABB::from_center_extents(
            center + Vec3::new(x * quarter.x, y * quarter.y, z * quarter.z),
            quarter,
        )
    };
    let signs = [-1.0, 1.0];

    let mut cells = Vec::with_capacity(SubdivisionLayout::Volumetric.child_count());

    // octants
    for z in signs {
        for y in signs {
            for x in signs {
                cells.push(cell(x, y, z));
            }
        }
    }

    // straddling the x split, then the z split
    for a in signs {
        for b in signs {
            cells.push(cell(0.0, a, b));
        }
    }
    for a in signs {
        for b in signs {
            cells.push(cell(a, b, 0.0));
        }
    }

    // branches: offset along a single axis
    for s in signs {
        cells.push(cell(s, 0.0, 0.0));
        cells.push(cell(0.0, s, 0.0));
        cells.push(cell(0.0, 0.0, s));
    }

    // corner-hugging: straddling the y split
    for a in signs {
        for b in signs {
            cells.push(cell(a, 0.0, b));
        }
    }

    cells.push(cell(0.0, 0.0, 0.0));
    cells
}
