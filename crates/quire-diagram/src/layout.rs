//! Layered layout for flowcharts.
//!
//! Nodes are assigned to ranks by longest path, ignoring the back edges a
//! depth-first search finds so cyclic charts still layer. Within a rank,
//! nodes start in declaration order and are refined by one barycenter
//! sweep. Ranks advance along the chart's
//! [`Direction`](crate::ast::Direction).

use std::collections::HashSet;

use log::{trace, warn};
use petgraph::{
    Direction as EdgeDirection,
    algo::toposort,
    graph::{DiGraph, NodeIndex},
    visit::{DfsEvent, depth_first_search},
};

use crate::{
    ast::{Flowchart, Node, NodeShape},
    config::EngineConfig,
    geometry::{Bounds, Point, Size},
};

/// Average glyph width as a fraction of the font size.
const CHAR_WIDTH_RATIO: f32 = 0.6;

/// Vertical radius of a cylinder's end caps.
pub(crate) const CYLINDER_CAP: f32 = 6.0;

/// How far a self-loop reaches beyond its node.
pub(crate) const SELF_LOOP_REACH: f32 = 30.0;

/// A placed node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    center: Point,
    size: Size,
    shape: NodeShape,
}

impl NodeBox {
    pub fn center(&self) -> Point {
        self.center
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_center(self.center, self.size)
    }

    /// Where the segment from the center toward `target` leaves the outline.
    pub fn boundary_point(&self, target: Point) -> Point {
        let delta = target.sub_point(self.center);
        if delta.is_zero() {
            return self.center;
        }

        let half_width = self.size.width() / 2.0;
        let half_height = self.size.height() / 2.0;
        let dx = delta.x().abs();
        let dy = delta.y().abs();

        let t = match self.shape {
            NodeShape::Circle => half_width / delta.hypot(),
            NodeShape::Rhombus => 1.0 / (dx / half_width + dy / half_height),
            _ => {
                let tx = if dx > 0.0 { half_width / dx } else { f32::INFINITY };
                let ty = if dy > 0.0 { half_height / dy } else { f32::INFINITY };
                tx.min(ty)
            }
        };

        self.center.add_point(delta.scale(t.min(1.0)))
    }
}

/// Positions of every node of a flowchart, indexed like
/// [`Flowchart::node`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    nodes: Vec<NodeBox>,
    ranks: Vec<usize>,
    size: Size,
}

impl Layout {
    pub fn nodes(&self) -> &[NodeBox] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&NodeBox> {
        self.nodes.get(index)
    }

    /// Rank of each node, 0 for sources.
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    /// Size of the whole drawing, padding included.
    pub fn size(&self) -> Size {
        self.size
    }
}

/// Lays out `chart` with the spacing and font metrics of `config`.
pub fn layout(chart: &Flowchart, config: &EngineConfig) -> Layout {
    let sizes: Vec<Size> = chart.nodes().map(|node| measure(node, config)).collect();
    let ranks = assign_ranks(chart);
    let rows = order_rows(chart, &ranks);

    let direction = chart.direction();
    let horizontal = direction.is_horizontal();
    // (along ranks, across ranks)
    let axes = |size: Size| {
        if horizontal {
            (size.width(), size.height())
        } else {
            (size.height(), size.width())
        }
    };

    let rank_extents: Vec<f32> = rows
        .iter()
        .map(|row| row.iter().map(|&i| axes(sizes[i]).0).fold(0.0, f32::max))
        .collect();
    let row_breadths: Vec<f32> = rows
        .iter()
        .map(|row| {
            let total: f32 = row.iter().map(|&i| axes(sizes[i]).1).sum();
            total + config.node_spacing() * row.len().saturating_sub(1) as f32
        })
        .collect();
    let breadth = row_breadths.iter().copied().fold(0.0, f32::max);
    let depth = rank_extents.iter().sum::<f32>()
        + config.rank_spacing() * rank_extents.len().saturating_sub(1) as f32;

    let padding = config.padding();
    let mut centers = vec![Point::default(); sizes.len()];
    let mut rank_start = padding;
    for ((row, extent), row_breadth) in rows.iter().zip(&rank_extents).zip(&row_breadths) {
        let mut along = rank_start + extent / 2.0;
        if direction.is_reversed() {
            along = padding * 2.0 + depth - along;
        }

        let mut across = padding + (breadth - row_breadth) / 2.0;
        for &index in row {
            let cross_size = axes(sizes[index]).1;
            let center_across = across + cross_size / 2.0;
            centers[index] = if horizontal {
                Point::new(along, center_across)
            } else {
                Point::new(center_across, along)
            };
            across += cross_size + config.node_spacing();
        }

        rank_start += extent + config.rank_spacing();
    }

    let mut size = if horizontal {
        Size::new(depth, breadth)
    } else {
        Size::new(breadth, depth)
    }
    .pad(padding);
    if chart.links().iter().any(|link| link.is_self_loop()) {
        size = Size::new(size.width() + SELF_LOOP_REACH, size.height());
    }

    let nodes = chart
        .nodes()
        .zip(centers)
        .zip(&sizes)
        .map(|((node, center), &size)| NodeBox {
            center,
            size,
            shape: node.shape(),
        })
        .collect();

    trace!(nodes = sizes.len(), ranks = rows.len(); "Flowchart laid out");
    Layout { nodes, ranks, size }
}

/// Estimates the outline size of a node from its label.
fn measure(node: &Node, config: &EngineConfig) -> Size {
    let lines = node.label_lines();
    let longest = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    let text = Size::new(
        longest as f32 * config.font_size() * CHAR_WIDTH_RATIO,
        lines.len() as f32 * config.line_height(),
    );
    let width = text.width() + config.font_size() * 2.0;
    let height = text.height() + config.font_size();

    match node.shape() {
        NodeShape::Circle => {
            let diameter = width.max(height);
            Size::new(diameter, diameter)
        }
        NodeShape::Rhombus => {
            let side = width + height;
            Size::new(side, side)
        }
        NodeShape::Hexagon => Size::new(width + height, height),
        NodeShape::Stadium => Size::new(width + height / 2.0, height),
        NodeShape::Cylinder => Size::new(width, height + CYLINDER_CAP * 2.0),
        NodeShape::Rectangle | NodeShape::Rounded | NodeShape::Subroutine => {
            Size::new(width, height)
        }
    }
}

/// Edges that do not close a cycle, as `(from, to)` node indices.
fn forward_edges(chart: &Flowchart) -> Vec<(usize, usize)> {
    let mut graph = DiGraph::<(), ()>::with_capacity(chart.node_count(), chart.links().len());
    for _ in 0..chart.node_count() {
        graph.add_node(());
    }
    for link in chart.links().iter().filter(|link| !link.is_self_loop()) {
        graph.add_edge(NodeIndex::new(link.from()), NodeIndex::new(link.to()), ());
    }

    let mut back_edges = HashSet::new();
    depth_first_search(&graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(from, to) = event {
            back_edges.insert((from.index(), to.index()));
        }
    });

    chart
        .links()
        .iter()
        .filter(|link| !link.is_self_loop())
        .map(|link| (link.from(), link.to()))
        .filter(|edge| !back_edges.contains(edge))
        .collect()
}

/// Longest-path rank of every node.
fn assign_ranks(chart: &Flowchart) -> Vec<usize> {
    let count = chart.node_count();
    let edges = forward_edges(chart);

    let mut dag = DiGraph::<(), ()>::with_capacity(count, edges.len());
    for _ in 0..count {
        dag.add_node(());
    }
    for &(from, to) in &edges {
        dag.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
    }

    let mut ranks = vec![0; count];
    match toposort(&dag, None) {
        Ok(order) => {
            for node in order {
                let rank = ranks[node.index()];
                for next in dag.neighbors_directed(node, EdgeDirection::Outgoing) {
                    ranks[next.index()] = ranks[next.index()].max(rank + 1);
                }
            }
        }
        Err(cycle) => {
            warn!(node = cycle.node_id().index(); "Cycle left after removing back edges, using a single rank");
        }
    }
    ranks
}

/// Groups nodes by rank and orders each rank.
fn order_rows(chart: &Flowchart, ranks: &[usize]) -> Vec<Vec<usize>> {
    let rank_count = ranks.iter().max().map_or(0, |max| max + 1);
    let mut rows = vec![Vec::new(); rank_count];
    for (index, &rank) in ranks.iter().enumerate() {
        rows[rank].push(index);
    }

    let edges = forward_edges(chart);
    let mut position = vec![0.0f32; ranks.len()];
    for r in 0..rows.len() {
        if r > 0 {
            let mut keyed: Vec<(f32, usize)> = rows[r]
                .iter()
                .enumerate()
                .map(|(current, &node)| {
                    let parents: Vec<f32> = edges
                        .iter()
                        .filter(|&&(from, to)| to == node && ranks[from] + 1 == r)
                        .map(|&(from, _)| position[from])
                        .collect();
                    let key = if parents.is_empty() {
                        current as f32
                    } else {
                        parents.iter().sum::<f32>() / parents.len() as f32
                    };
                    (key, node)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            rows[r] = keyed.into_iter().map(|(_, node)| node).collect();
        }
        for (slot, &node) in rows[r].iter().enumerate() {
            position[node] = slot as f32;
        }
    }
    rows
}
