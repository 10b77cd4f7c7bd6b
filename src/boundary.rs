// src/boundary.rs - Border following and the boundary containment forest

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};

use crate::geometry::Point;
use crate::simplify::simplify_closed;

/// Boolean foreground grid, stored with a one-pixel background frame
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryGrid {
    width: u32,
    height: u32,
    padded: GrayImage,
}

impl BinaryGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            padded: GrayImage::new(width + 2, height + 2),
        }
    }

    /// Non-zero pixels are foreground
    pub fn from_luma(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let mut grid = Self::new(width, height);
        for (x, y, p) in image.enumerate_pixels() {
            if p[0] > 0 {
                grid.padded.put_pixel(x + 1, y + 1, Luma([255]));
            }
        }
        grid
    }

    /// Build from text rows where `#` marks foreground; used by tests and tools
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                grid.set(x as u32, y as u32, c == '#');
            }
        }
        grid
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.padded.get_pixel(x + 1, y + 1)[0] > 0
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            self.padded.put_pixel(x + 1, y + 1, Luma([if value { 255 } else { 0 }]));
        }
    }
}

/// Whether a border separates a region from its surroundings or from a hole inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    Outer,
    Hole,
}

/// A raw traced border, before simplification
#[derive(Debug, Clone, PartialEq)]
pub struct TracedBorder {
    pub kind: BorderKind,
    pub parent: Option<usize>,
    pub points: Vec<Point>,
}

/// Containment forest over every traced border
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    borders: Vec<TracedBorder>,
    children: Vec<Vec<usize>>,
}

impl Hierarchy {
    fn from_borders(borders: Vec<TracedBorder>) -> Self {
        let mut children = vec![Vec::new(); borders.len()];
        for (idx, border) in borders.iter().enumerate() {
            if let Some(parent) = border.parent {
                children[parent].push(idx);
            }
        }
        Self { borders, children }
    }

    pub fn len(&self) -> usize {
        self.borders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
    }

    pub fn border(&self, id: usize) -> Option<&TracedBorder> {
        self.borders.get(id)
    }

    pub fn borders(&self) -> &[TracedBorder] {
        &self.borders
    }

    pub fn parent(&self, id: usize) -> Option<usize> {
        self.borders.get(id).and_then(|b| b.parent)
    }

    pub fn children(&self, id: usize) -> &[usize] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Outer borders not contained in any other border
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.borders
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none() && b.kind == BorderKind::Outer)
            .map(|(idx, _)| idx)
    }

    /// Number of ancestors above a border
    pub fn depth(&self, id: usize) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }
}

/// A simplified top-level boundary; `id` indexes into the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub id: usize,
    pub points: Vec<Point>,
}

/// Boundaries retained for shape fitting plus the full forest they came from
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub boundaries: Vec<Boundary>,
    pub hierarchy: Hierarchy,
}

/// Trace all borders, keep the outermost ones and simplify them
pub fn extract_boundaries(grid: &BinaryGrid, tolerance: f64) -> Extraction {
    let hierarchy = trace_borders(grid);

    let boundaries: Vec<Boundary> = hierarchy
        .roots()
        .filter_map(|id| {
            let raw = &hierarchy.borders[id].points;
            let points = simplify_closed(raw, tolerance);
            if points.len() >= 3 {
                Some(Boundary { id, points })
            } else {
                log::trace!("Dropping border {} ({} raw points, {} after simplification)", id, raw.len(), points.len());
                None
            }
        })
        .collect();

    let max_depth = (0..hierarchy.len()).map(|id| hierarchy.depth(id)).max().unwrap_or(0);
    log::debug!(
        "Traced {} borders ({} levels deep), {} top-level, {} kept after simplification",
        hierarchy.len(),
        max_depth + 1,
        hierarchy.roots().count(),
        boundaries.len()
    );

    Extraction { boundaries, hierarchy }
}

/// Suzuki-Abe border following over 8-connected foreground.
/// The padded frame keeps regions touching the image edge classified as outer borders.
pub fn trace_borders(grid: &BinaryGrid) -> Hierarchy {
    let borders = find_contours::<i32>(&grid.padded)
        .into_iter()
        .map(|contour| TracedBorder {
            kind: match contour.border_type {
                BorderType::Outer => BorderKind::Outer,
                BorderType::Hole => BorderKind::Hole,
            },
            parent: contour.parent,
            points: contour.points.into_iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect(),
        })
        .collect();

    Hierarchy::from_borders(borders)
}
