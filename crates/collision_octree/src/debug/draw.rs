//! Debug drawing primitives and the sink they are sent to

use bitflags::bitflags;

use crate::collision::Triangle;
use crate::foundation::math::{Vec3, Vec4};

bitflags! {
    /// What a debug sink wants to be shown
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DebugView: u8 {
        /// Every triangle a query tests
        const TESTED_TRIANGLES = 1 << 0;
        /// Triangles a query hit, drawn in their own color
        const HITS = 1 << 1;
        /// Wireframes of populated cells while rendering the tree
        const CELLS = 1 << 2;
        /// Cell triangles colored by cell size while rendering the tree
        const HEATMAP = 1 << 3;
    }
}

/// Receiver for diagnostic geometry
///
/// Queries only call into a sink when one is passed to them.
pub trait OctreeDebugSink {
    /// Which kinds of geometry to send
    fn view(&self) -> DebugView;

    /// A world-space triangle with its face normal
    fn draw_triangle(&mut self, triangle: &Triangle, normal: Vec3, color: Vec4);

    /// A world-space cell outline, corners in [`AABB::corners`](crate::spatial::AABB::corners) order
    fn draw_cell(&mut self, corners: &[Vec3; 8], color: Vec4);
}

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Solid triangle
    Triangle {
        /// World-space vertices
        vertices: [Vec3; 3],
        /// Face normal
        normal: Vec3,
        /// RGBA color
        color: Vec4,
    },

    /// Wireframe box, possibly rotated or sheared by the tree transform
    Cell {
        /// World-space corners
        corners: [Vec3; 8],
        /// RGBA color
        color: Vec4,
    },
}

impl DebugShape {
    /// Color the shape is drawn with
    pub fn color(&self) -> Vec4 {
        match self {
            DebugShape::Triangle { color, .. } | DebugShape::Cell { color, .. } => *color,
        }
    }
}

/// Sink that records every shape for a renderer to pick up later
#[derive(Debug, Clone, Default)]
pub struct DebugDrawList {
    shapes: Vec<DebugShape>,
    view: DebugView,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawList {
    /// Create an enabled list showing `view`
    pub fn new(view: DebugView) -> Self {
        Self {
            shapes: Vec::new(),
            view,
            enabled: true,
        }
    }

    /// Recorded shapes in draw order
    pub fn shapes(&self) -> &[DebugShape] {
        &self.shapes
    }

    /// Number of recorded triangles
    pub fn triangle_count(&self) -> usize {
        self.shapes.iter().filter(|s| matches!(s, DebugShape::Triangle { .. })).count()
    }

    /// Number of recorded cells
    pub fn cell_count(&self) -> usize {
        self.shapes.iter().filter(|s| matches!(s, DebugShape::Cell { .. })).count()
    }

    /// Number of shapes drawn with exactly `color`
    pub fn shapes_with_color(&self, color: Vec4) -> usize {
        self.shapes.iter().filter(|s| s.color() == color).count()
    }

    /// Drop every recorded shape, typically once per frame
    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl OctreeDebugSink for DebugDrawList {
    fn view(&self) -> DebugView {
        if self.enabled { self.view } else { DebugView::empty() }
    }

    fn draw_triangle(&mut self, triangle: &Triangle, normal: Vec3, color: Vec4) {
        if !self.enabled {
            return;
        }
        self.shapes.push(DebugShape::Triangle {
            vertices: [triangle.v0, triangle.v1, triangle.v2],
            normal,
            color,
        });
    }

    fn draw_cell(&mut self, corners: &[Vec3; 8], color: Vec4) {
        if !self.enabled {
            return;
        }
        self.shapes.push(DebugShape::Cell { corners: *corners, color });
    }
}
