//! Flowchart model produced by the parser.

use indexmap::IndexMap;

/// Flow direction of a flowchart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Top to bottom (`TD` or `TB`).
    #[default]
    TopDown,
    /// Bottom to top (`BT`).
    BottomUp,
    /// Left to right (`LR`).
    LeftRight,
    /// Right to left (`RL`).
    RightLeft,
}

impl Direction {
    /// Parses a direction keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    /// Returns `true` when ranks advance along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    /// Returns `true` when ranks advance against the axis.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BottomUp | Self::RightLeft)
    }
}

/// Outline of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeShape {
    /// `id[text]`, also used for bare `id`.
    #[default]
    Rectangle,
    /// `id(text)`
    Rounded,
    /// `id([text])`
    Stadium,
    /// `id[[text]]`
    Subroutine,
    /// `id[(text)]`
    Cylinder,
    /// `id((text))`
    Circle,
    /// `id{text}`
    Rhombus,
    /// `id{{text}}`
    Hexagon,
}

/// A flowchart node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: String,
    label: String,
    shape: NodeShape,
    explicit: bool,
}

impl Node {
    /// Creates a bare node labelled with its id.
    pub fn bare(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            shape: NodeShape::default(),
            explicit: false,
        }
    }

    /// Creates a node with an explicit shape and label.
    pub fn shaped(id: impl Into<String>, shape: NodeShape, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape,
            explicit: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    /// Label split into display lines on `<br>` tags.
    pub fn label_lines(&self) -> Vec<&str> {
        split_label_lines(&self.label)
    }
}

/// Line style of a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stroke {
    #[default]
    Normal,
    Dotted,
    Thick,
}

/// Visual style of a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStyle {
    stroke: Stroke,
    arrow_head: bool,
}

impl LinkStyle {
    pub fn new(stroke: Stroke, arrow_head: bool) -> Self {
        Self { stroke, arrow_head }
    }

    pub fn stroke(self) -> Stroke {
        self.stroke
    }

    pub fn has_arrow_head(self) -> bool {
        self.arrow_head
    }
}

/// A link between two nodes, identified by node index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    from: usize,
    to: usize,
    style: LinkStyle,
    label: Option<String>,
}

impl Link {
    pub fn new(from: usize, to: usize, style: LinkStyle, label: Option<String>) -> Self {
        Self {
            from,
            to,
            style,
            label,
        }
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }

    pub fn style(&self) -> LinkStyle {
        self.style
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns `true` for a link from a node to itself.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// A parsed flowchart.
///
/// Nodes keep declaration order, which the layout uses as its initial order
/// within a rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flowchart {
    direction: Direction,
    nodes: IndexMap<String, Node>,
    links: Vec<Link>,
}

impl Flowchart {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Declares a node, returning its index.
    ///
    /// A node referenced again keeps its first explicit shape and label; a
    /// node first seen bare takes the first explicit definition given later.
    pub fn declare(&mut self, node: Node) -> usize {
        let entry = self.nodes.entry(node.id.clone());
        let index = entry.index();
        entry
            .and_modify(|existing| {
                if !existing.explicit && node.explicit {
                    *existing = node.clone();
                }
            })
            .or_insert(node);
        index
    }

    /// Adds a link between two declared nodes.
    pub fn connect(&mut self, link: Link) {
        self.links.push(link);
    }
}

/// Splits a label on `<br>`, `<br/>` and `<br />` tags.
pub fn split_label_lines(label: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = label;
    while let Some(start) = find_ascii_case_insensitive(rest, "<br") {
        let Some(end) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 3..start + end];
        if !tag.trim().trim_end_matches('/').trim().is_empty() {
            break;
        }
        lines.push(rest[..start].trim());
        rest = &rest[start + end + 1..];
    }
    lines.push(rest.trim());
    lines
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
