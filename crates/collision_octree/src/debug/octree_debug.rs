//! Heatmap rendering of a collision octree
//!
//! Every populated cell draws its triangles in a color picked by how large
//! the cell is relative to the root: big cells run hot, small cells cool.
//! A level whose triangles mostly sit in hot cells has a lot of geometry
//! straddling splits, which is what makes queries slow.

use crate::debug::{DebugView, OctreeDebugSink};
use crate::foundation::math::{transform_point, Mat4, Vec3, Vec4};
use crate::spatial::{CollisionOctree, NodeId, OctreeError, TreeTransform, TriangleSet, ROOT, AABB};

/// Color of the largest cells
const HOT: Vec4 = Vec4::new(1.0, 0.1, 0.0, 0.6);
/// Color of the smallest cells
const COLD: Vec4 = Vec4::new(0.0, 0.3, 1.0, 0.6);
/// Cell outline color
const CELL_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 0.25);

/// Heatmap color for a cell whose extent is `t` times the root's
///
/// `t` is clamped to `[0, 1]`; 1 is the root.
pub fn extent_heatmap(t: f32) -> Vec4 {
    let t = t.clamp(0.0, 1.0);
    COLD * (1.0 - t) + HOT * t
}

/// Draw the tree into `sink`
///
/// `camera` is in world space and `transform` maps the tree into the world,
/// as for a query. Triangles are drawn for [`DebugView::HEATMAP`] and cell
/// outlines for [`DebugView::CELLS`]. Empty cells draw nothing. Cells
/// enclosing the deepest cell that contains the camera are skipped, since
/// they would cover the whole view. Returns the number of triangles drawn.
pub fn render_octree(
    tree: &CollisionOctree,
    triangles: &TriangleSet,
    camera: Vec3,
    transform: Option<&Mat4>,
    sink: &mut dyn OctreeDebugSink,
) -> Result<usize, OctreeError> {
    let view = sink.view();
    let heatmap = view.contains(DebugView::HEATMAP);
    let cells = view.contains(DebugView::CELLS);
    if !heatmap && !cells {
        return Ok(0);
    }

    let transform = match transform {
        Some(matrix) => TreeTransform::new(*matrix)?,
        None => TreeTransform::identity(),
    };
    let to_local = transform
        .matrix
        .try_inverse()
        .ok_or(OctreeError::SingularTransform)?;
    let local_camera = transform_point(&to_local, &camera);

    let skipped = camera_ancestors(tree, local_camera);
    let root_radius = tree.root().bounds().bounding_radius();
    let mut drawn = 0;

    for (id, node) in tree.nodes() {
        if node.triangles().is_empty() || skipped.contains(&id) {
            continue;
        }
        let t = if root_radius > 0.0 {
            node.bounds().bounding_radius() / root_radius
        } else {
            1.0
        };
        let color = extent_heatmap(t);

        if heatmap {
            for entry in node.triangles() {
                let Some(local) = triangles.get(entry.id) else {
                    continue;
                };
                let world = local.transformed(&transform.matrix);
                sink.draw_triangle(&world.triangle, world.normal, color);
                drawn += 1;
            }
        }

        if cells {
            sink.draw_cell(&world_corners(node.bounds(), &transform.matrix), CELL_COLOR);
        }
    }
    Ok(drawn)
}

/// Nodes strictly above the deepest cell holding `point`, root first
fn camera_ancestors(tree: &CollisionOctree, point: Vec3) -> Vec<NodeId> {
    if !tree.root().bounds().contains_point(point) {
        return Vec::new();
    }

    let mut path = vec![ROOT];
    let mut current = ROOT;
    while let Some(next) = child_containing(tree, current, point) {
        path.push(next);
        current = next;
    }
    path.pop();
    path
}

fn world_corners(bounds: &AABB, matrix: &Mat4) -> [Vec3; 8] {
    bounds
        .corners()
        .map(|corner| transform_point(matrix, &corner))
}

fn child_containing(tree: &CollisionOctree, node: NodeId, point: Vec3) -> Option<NodeId> {
    tree.node(node)?
        .children()
        .iter()
        .copied()
        .find(|&child| tree.node(child).is_some_and(|c| c.bounds().contains_point(point)))
}
