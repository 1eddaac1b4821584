//! SVG export for laid-out flowcharts.
//!
//! Every id in the document is prefixed with the render id, so several
//! diagrams inlined into one HTML page never share a marker definition.
//! Labels are added as SVG text nodes.

use svg::{
    Document,
    node::{Text as SvgText, element as svg_element},
};

use crate::{
    ast::{Flowchart, Link, NodeShape, Stroke},
    config::{EngineConfig, Palette},
    geometry::Point,
    layout::{CYLINDER_CAP, Layout, NodeBox, SELF_LOOP_REACH},
};

/// Corner radius of `id(text)` nodes.
const ROUNDED_RADIUS: f32 = 8.0;

/// Inset of the inner bars of `id[[text]]` nodes.
const SUBROUTINE_INSET: f32 = 8.0;

/// Applies the theme's node fill and stroke.
macro_rules! paint {
    ($element:expr, $palette:expr $(,)?) => {
        $element
            .set("fill", $palette.node_fill)
            .set("stroke", $palette.node_stroke)
            .set("stroke-width", 1)
    };
}

/// Id of the arrowhead marker for the diagram rendered as `id`.
pub fn arrowhead_id(id: &str) -> String {
    format!("{id}-arrowhead")
}

/// Renders a laid-out flowchart to a standalone SVG document.
pub fn render_svg(id: &str, chart: &Flowchart, layout: &Layout, config: &EngineConfig) -> String {
    let palette = config.theme().palette();
    let size = layout.size();

    let mut document = Document::new()
        .set("id", id)
        .set("class", "flowchart")
        .set("width", size.width())
        .set("height", size.height())
        .set("viewBox", format!("0 0 {} {}", size.width(), size.height()))
        .set("role", "img")
        .add(svg_element::Definitions::new().add(arrowhead(id, palette)))
        .add(
            svg_element::Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", palette.background),
        );

    let mut edges = svg_element::Group::new().set("class", "edges");
    let mut edge_labels = svg_element::Group::new().set("class", "edge-labels");
    for link in chart.links() {
        let (Some(from), Some(to)) = (layout.node(link.from()), layout.node(link.to())) else {
            continue;
        };
        let (path, label_at) = edge_path(link, from, to);
        edges = edges.add(edge_element(id, link, path, palette));

        if let Some(label) = link.label() {
            edge_labels = edge_labels.add(edge_label(label, label_at, config, palette));
        }
    }

    let mut nodes = svg_element::Group::new().set("class", "nodes");
    for (node, placed) in chart.nodes().zip(layout.nodes()) {
        let group = svg_element::Group::new()
            .set("class", "node")
            .set("id", format!("{id}-node-{}", node.id()))
            .add(shape_element(placed, palette))
            .add(text_element(&node.label_lines(), placed.center(), config, palette.text));
        nodes = nodes.add(group);
    }

    document = document.add(edges).add(edge_labels).add(nodes);
    document.to_string()
}

fn arrowhead(id: &str, palette: Palette) -> svg_element::Marker {
    svg_element::Marker::new()
        .set("id", arrowhead_id(id))
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerWidth", 8)
        .set("markerHeight", 8)
        .set("markerUnits", "userSpaceOnUse")
        .set("orient", "auto")
        .add(
            svg_element::Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", palette.edge),
        )
}

/// Path data for a link and the point its label sits on.
fn edge_path(link: &Link, from: &NodeBox, to: &NodeBox) -> (String, Point) {
    if link.is_self_loop() {
        let bounds = from.bounds();
        let x = bounds.max_x();
        let top = from.center().y() - from.size().height() / 4.0;
        let bottom = from.center().y() + from.size().height() / 4.0;
        let reach = x + SELF_LOOP_REACH;
        let path = format!("M {x} {top} C {reach} {top}, {reach} {bottom}, {x} {bottom}");
        return (path, Point::new(x + SELF_LOOP_REACH * 0.75, from.center().y()));
    }

    let start = from.boundary_point(to.center());
    let end = to.boundary_point(from.center());
    let path = format!("M {} {} L {} {}", start.x(), start.y(), end.x(), end.y());
    (path, start.midpoint(end))
}

fn edge_element(id: &str, link: &Link, path: String, palette: Palette) -> svg_element::Path {
    let style = link.style();
    let mut element = svg_element::Path::new()
        .set("d", path)
        .set("fill", "none")
        .set("stroke", palette.edge);

    element = match style.stroke() {
        Stroke::Normal => element.set("stroke-width", 1.5),
        Stroke::Thick => element.set("stroke-width", 3.5),
        Stroke::Dotted => element
            .set("stroke-width", 1.5)
            .set("stroke-dasharray", "3 3"),
    };

    if style.has_arrow_head() {
        element = element.set("marker-end", format!("url(#{})", arrowhead_id(id)));
    }
    element
}

fn edge_label(
    label: &str,
    position: Point,
    config: &EngineConfig,
    palette: Palette,
) -> svg_element::Group {
    let lines = crate::ast::split_label_lines(label);
    let longest = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    let width = longest as f32 * config.font_size() * 0.6 + 8.0;
    let height = lines.len() as f32 * config.line_height();

    let background = svg_element::Rectangle::new()
        .set("x", position.x() - width / 2.0)
        .set("y", position.y() - height / 2.0)
        .set("width", width)
        .set("height", height)
        .set("fill", palette.label_background)
        .set("rx", 3.0);

    svg_element::Group::new()
        .set("class", "edge-label")
        .add(background)
        .add(text_element(&lines, position, config, palette.text))
}

fn shape_element(node: &NodeBox, palette: Palette) -> Box<dyn svg::Node> {
    let bounds = node.bounds();
    let center = node.center();
    let (x, y) = (bounds.min_x(), bounds.min_y());
    let (width, height) = (bounds.width(), bounds.height());

    let rectangle = |radius: f32| {
        svg_element::Rectangle::new()
            .set("x", x)
            .set("y", y)
            .set("width", width)
            .set("height", height)
            .set("rx", radius)
    };
    let polygon = |points: Vec<Point>| {
        let points = points
            .iter()
            .map(|p| format!("{},{}", p.x(), p.y()))
            .collect::<Vec<_>>()
            .join(" ");
        svg_element::Polygon::new().set("points", points)
    };

    match node.shape() {
        NodeShape::Rectangle => Box::new(paint!(rectangle(0.0), palette)),
        NodeShape::Rounded => Box::new(paint!(rectangle(ROUNDED_RADIUS), palette)),
        NodeShape::Stadium => Box::new(paint!(rectangle(height / 2.0), palette)),
        NodeShape::Subroutine => {
            let bar = |bar_x: f32| {
                svg_element::Line::new()
                    .set("x1", bar_x)
                    .set("y1", y)
                    .set("x2", bar_x)
                    .set("y2", y + height)
                    .set("stroke", palette.node_stroke)
            };
            Box::new(
                svg_element::Group::new()
                    .add(paint!(rectangle(0.0), palette))
                    .add(bar(x + SUBROUTINE_INSET))
                    .add(bar(x + width - SUBROUTINE_INSET)),
            )
        }
        NodeShape::Cylinder => {
            let rx = width / 2.0;
            let body = height - CYLINDER_CAP * 2.0;
            let top = y + CYLINDER_CAP;
            let d = format!(
                "M {x} {top} a {rx} {CYLINDER_CAP} 0 0 0 {width} 0 a {rx} {CYLINDER_CAP} 0 0 0 {neg} 0 \
                 l 0 {body} a {rx} {CYLINDER_CAP} 0 0 0 {width} 0 l 0 {up}",
                neg = -width,
                up = -body,
            );
            Box::new(paint!(svg_element::Path::new().set("d", d), palette))
        }
        NodeShape::Circle => Box::new(paint!(
            svg_element::Circle::new()
                .set("cx", center.x())
                .set("cy", center.y())
                .set("r", width / 2.0),
            palette,
        )),
        NodeShape::Rhombus => Box::new(paint!(
            polygon(vec![
                Point::new(center.x(), y),
                Point::new(x + width, center.y()),
                Point::new(center.x(), y + height),
                Point::new(x, center.y()),
            ]),
            palette,
        )),
        NodeShape::Hexagon => {
            let inset = height / 2.0;
            Box::new(paint!(
                polygon(vec![
                    Point::new(x + inset, y),
                    Point::new(x + width - inset, y),
                    Point::new(x + width, center.y()),
                    Point::new(x + width - inset, y + height),
                    Point::new(x + inset, y + height),
                    Point::new(x, center.y()),
                ]),
                palette,
            ))
        }
    }
}

fn text_element(
    lines: &[&str],
    center: Point,
    config: &EngineConfig,
    color: &str,
) -> svg_element::Text {
    let line_height = config.line_height();
    let first_line = center.y() - line_height * (lines.len().saturating_sub(1)) as f32 / 2.0;

    let mut text = svg_element::Text::new("")
        .set("x", center.x())
        .set("y", first_line)
        .set("text-anchor", "middle")
        .set("dominant-baseline", "central")
        .set("font-family", config.font_family())
        .set("font-size", config.font_size())
        .set("fill", color);

    for (index, line) in lines.iter().enumerate() {
        let dy = if index == 0 { 0.0 } else { line_height };
        let tspan = svg_element::TSpan::new("")
            .set("x", center.x())
            .set("dy", dy)
            .add(SvgText::new(*line));
        text = text.add(tspan);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layout::layout, parser::parse};

    fn render(id: &str, source: &str) -> String {
        let config = EngineConfig::default();
        let chart = parse(source).unwrap();
        let layout = layout(&chart, &config);
        render_svg(id, &chart, &layout, &config)
    }

    #[test]
    fn test_document_carries_render_id() {
        let svg = render("diagram-abc123xyz", "flowchart TD; A-->B");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"id="diagram-abc123xyz""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_marker_ids_are_prefixed() {
        let svg = render("diagram-one", "flowchart LR; A-->B");
        assert!(svg.contains(r#"id="diagram-one-arrowhead""#));
        assert!(svg.contains("url(#diagram-one-arrowhead)"));
        assert!(!svg.contains(r#"id="arrowhead""#));
    }

    #[test]
    fn test_labels_become_text() {
        let svg = render("d", "flowchart TD\nA[Start here] -->|go on| B((End))");
        assert!(svg.contains("Start here"));
        assert!(svg.contains("go on"));
        assert!(svg.contains("<tspan"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn test_open_link_has_no_marker() {
        let svg = render("d", "flowchart TD; A---B");
        assert!(!svg.contains("marker-end"));
    }

    #[test]
    fn test_dotted_link_is_dashed() {
        let svg = render("d", "flowchart TD; A-.->B");
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_every_shape_renders() {
        let svg = render(
            "d",
            "flowchart TD\na[r] --> b(r) --> c([s]) --> d[[s]] --> e[(c)] --> f((c)) --> g{r} --> h{{h}}\nh --> h",
        );
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<line"));
        assert_eq!(svg.matches(r#"class="node""#).count(), 8);
    }

    #[test]
    fn test_circle_rhombus_and_hexagon_are_painted() {
        let palette = EngineConfig::default().theme().palette();
        let fill = format!(r#"fill="{}""#, palette.node_fill);
        let stroke = format!(r#"stroke="{}""#, palette.node_stroke);

        let svg = render("d", "flowchart TD\nf((c)) --> g{r} --> h{{h}}");
        let elements: Vec<&str> = svg
            .match_indices("<circle")
            .chain(svg.match_indices("<polygon"))
            .map(|(start, _)| &svg[start..start + svg[start..].find('>').unwrap()])
            .collect();

        assert_eq!(elements.len(), 3);
        for element in elements {
            assert!(element.contains(&fill), "{element}");
            assert!(element.contains(&stroke), "{element}");
        }
    }
}
