//! Parser for the Mermaid flowchart subset.
//!
//! The definition is first split into statements (lines, further split on
//! `;` outside quoted labels, with `%%` comment lines dropped). The first
//! statement is the header naming the diagram type and direction; every
//! other statement is parsed independently with [`winnow`] so one bad
//! statement does not hide errors in the next.

use log::{debug, trace};
use winnow::{
    ModalResult, Parser as _,
    ascii::{space0, space1},
    combinator::{alt, cut_err, delimited, opt, preceded, repeat, terminated},
    error::{ContextError, StrContext, StrContextValue},
    token::{take_till, take_until, take_while},
};

use crate::{
    ast::{Direction, Flowchart, Link, LinkStyle, Node, NodeShape, Stroke},
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
};

/// Header keywords accepted for flowcharts.
const FLOWCHART_KEYWORDS: [&str; 2] = ["flowchart", "graph"];

/// Other Mermaid diagram kinds, recognized so they can be reported as
/// unsupported rather than unknown.
const OTHER_DIAGRAM_KINDS: [&str; 21] = [
    "sequenceDiagram",
    "classDiagram",
    "classDiagram-v2",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "journey",
    "gantt",
    "pie",
    "quadrantChart",
    "requirementDiagram",
    "gitGraph",
    "C4Context",
    "mindmap",
    "timeline",
    "sankey-beta",
    "xychart-beta",
    "block-beta",
    "packet-beta",
    "architecture-beta",
    "kanban",
];

/// Statements that are valid flowchart syntax but carry only styling or
/// grouping information the engine does not draw.
const IGNORED_KEYWORDS: [&str; 10] = [
    "classDef",
    "class",
    "style",
    "linkStyle",
    "click",
    "subgraph",
    "end",
    "direction",
    "accTitle",
    "accDescr",
];

const SHAPE_CONTEXT: &str = "node shape";

/// A trimmed statement and its byte offset in the definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Statement<'s> {
    text: &'s str,
    offset: usize,
}

impl Statement<'_> {
    fn span(&self) -> Span {
        Span::new(self.offset..self.offset + self.text.len())
    }
}

#[derive(Debug)]
struct ParsedNode<'s> {
    id: &'s str,
    shape: Option<(NodeShape, &'s str)>,
}

#[derive(Debug)]
struct ParsedLink<'s> {
    style: LinkStyle,
    label: Option<&'s str>,
}

type Chain<'s> = (ParsedNode<'s>, Vec<(ParsedLink<'s>, ParsedNode<'s>)>);

/// Parse a flowchart definition.
///
/// # Errors
///
/// Returns a [`ParseError`] holding one diagnostic per malformed statement,
/// or a single diagnostic when the definition is empty or is not a
/// flowchart.
///
/// # Examples
///
/// ```
/// # use quire_diagram::parse;
/// let chart = parse("flowchart LR; A[Start] -->|go| B{Done?}").unwrap();
/// assert_eq!(chart.node_count(), 2);
/// assert_eq!(chart.links()[0].label(), Some("go"));
/// ```
pub fn parse(source: &str) -> Result<Flowchart, ParseError> {
    let statements = skip_front_matter(split_statements(source));
    let mut statements = statements.into_iter();

    let Some(header) = statements.next() else {
        return Err(Diagnostic::error("empty diagram definition")
            .with_code(ErrorCode::E001)
            .with_label(Span::new(0..source.len()), "no statements found")
            .with_help("start the definition with `flowchart TD`")
            .into());
    };

    let direction = parse_header(header)?;
    debug!(direction:? = direction; "Parsing flowchart");

    let mut chart = Flowchart::new(direction);
    let mut diagnostics = Vec::new();

    for statement in statements {
        if is_ignored(statement.text) {
            trace!(statement = statement.text; "Ignoring styling statement");
            continue;
        }

        match chain.parse(statement.text) {
            Ok(parsed) => add_chain(&mut chart, parsed),
            Err(err) => diagnostics.push(statement_diagnostic(statement, &err)),
        }
    }

    if diagnostics.is_empty() {
        Ok(chart)
    } else {
        Err(diagnostics.into())
    }
}

/// Split the definition into trimmed, non-empty, non-comment statements.
fn split_statements(source: &str) -> Vec<Statement<'_>> {
    let mut statements = Vec::new();
    let mut line_start = 0;

    for line in source.split_inclusive('\n') {
        let line_offset = line_start;
        line_start += line.len();

        if line.trim_start().starts_with("%%") {
            continue;
        }

        let mut start = 0;
        let mut in_quote = false;
        for (index, c) in line.char_indices() {
            match c {
                '"' => in_quote = !in_quote,
                ';' if !in_quote => {
                    push_statement(&mut statements, &line[start..index], line_offset + start);
                    start = index + 1;
                }
                _ => {}
            }
        }
        push_statement(&mut statements, &line[start..], line_offset + start);
    }

    statements
}

fn push_statement<'s>(statements: &mut Vec<Statement<'s>>, raw: &'s str, offset: usize) {
    let text = raw.trim();
    if text.is_empty() {
        return;
    }
    let leading = raw.len() - raw.trim_start().len();
    statements.push(Statement {
        text,
        offset: offset + leading,
    });
}

/// Drop a leading `---` ... `---` configuration block.
fn skip_front_matter(statements: Vec<Statement<'_>>) -> Vec<Statement<'_>> {
    if statements.first().map(|s| s.text) != Some("---") {
        return statements;
    }

    match statements.iter().skip(1).position(|s| s.text == "---") {
        Some(close) => statements.into_iter().skip(close + 2).collect(),
        None => statements,
    }
}

fn parse_header(header: Statement<'_>) -> Result<Direction, ParseError> {
    let (keyword, rest) = header
        .text
        .split_once(char::is_whitespace)
        .unwrap_or((header.text, ""));
    let keyword_span = Span::new(header.offset..header.offset + keyword.len());

    if !FLOWCHART_KEYWORDS.contains(&keyword) {
        let diagnostic = if OTHER_DIAGRAM_KINDS.contains(&keyword) {
            Diagnostic::error(format!("unsupported diagram type `{keyword}`"))
                .with_code(ErrorCode::E003)
                .with_label(keyword_span, "only flowcharts can be rendered")
                .with_help("use `flowchart` or `graph`, or configure an external diagram engine")
        } else {
            Diagnostic::error(format!("unknown diagram type `{keyword}`"))
                .with_code(ErrorCode::E002)
                .with_label(keyword_span, "expected a diagram type")
                .with_help("start the definition with `flowchart TD`")
        };
        return Err(diagnostic.into());
    }

    let direction = rest.trim();
    if direction.is_empty() {
        return Ok(Direction::default());
    }

    let direction_offset = header.offset + header.text.len() - rest.trim_start().len();
    let direction_span = Span::new(direction_offset..direction_offset + direction.len());

    Direction::from_keyword(direction).ok_or_else(|| {
        Diagnostic::error(format!("invalid direction `{direction}`"))
            .with_code(ErrorCode::E101)
            .with_label(direction_span, "unknown direction")
            .with_secondary_label(keyword_span, "in this header")
            .with_help("valid directions: `TD`, `TB`, `BT`, `LR`, `RL`")
            .into()
    })
}

fn is_ignored(text: &str) -> bool {
    let keyword = text.split(char::is_whitespace).next().unwrap_or(text);
    IGNORED_KEYWORDS.contains(&keyword)
}

fn add_chain(chart: &mut Flowchart, (first, rest): Chain<'_>) {
    let mut previous = chart.declare(into_node(first));
    for (link, node) in rest {
        let next = chart.declare(into_node(node));
        chart.connect(Link::new(
            previous,
            next,
            link.style,
            link.label.map(str::to_string),
        ));
        previous = next;
    }
}

fn into_node(parsed: ParsedNode<'_>) -> Node {
    match parsed.shape {
        Some((shape, label)) => Node::shaped(parsed.id, shape, label.trim()),
        None => Node::bare(parsed.id),
    }
}

fn statement_diagnostic(
    statement: Statement<'_>,
    err: &winnow::error::ParseError<&str, ContextError>,
) -> Diagnostic {
    let offset = err.offset();
    let rest = &statement.text[offset..];
    let position = statement.offset + offset;

    let expected = err.inner().context().find_map(|context| match context {
        StrContext::Expected(StrContextValue::StringLiteral(literal)) => Some(*literal),
        StrContext::Expected(StrContextValue::CharLiteral('|')) => Some("|"),
        _ => None,
    });
    let in_shape = err
        .inner()
        .context()
        .any(|context| matches!(context, StrContext::Label(SHAPE_CONTEXT)));

    if in_shape {
        let close = expected.unwrap_or("]");
        let opened = Span::new(position.saturating_sub(1)..statement.span().end());
        return Diagnostic::error("unclosed node shape")
            .with_code(ErrorCode::E102)
            .with_label(opened, "label opened here is never closed")
            .with_secondary_label(statement.span(), "in this statement")
            .with_help(format!("close the label with `{close}`"));
    }

    let (message, span) = match rest.chars().next() {
        Some(found) => (
            format!("unexpected `{found}`"),
            Span::new(position..position + found.len_utf8()),
        ),
        None => (
            "unexpected end of statement".to_string(),
            Span::new(position..position),
        ),
    };

    let diagnostic = Diagnostic::error(message)
        .with_code(ErrorCode::E100)
        .with_label(span, "not expected here");

    match expected {
        Some(literal) => diagnostic.with_help(format!("expected `{literal}`")),
        None => diagnostic.with_help("statements are `id`, `id[label]` or `a --> b` links"),
    }
}

// =============================================================================
// Statement grammar
// =============================================================================

/// `node (link node)*`
fn chain<'s>(input: &mut &'s str) -> ModalResult<Chain<'s>> {
    (
        node,
        repeat(0.., (preceded(space0, link), preceded(space0, cut_err(node)))),
        space0,
    )
        .map(|(first, rest, _)| (first, rest))
        .parse_next(input)
}

fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_')
        .context(StrContext::Label("node identifier"))
        .parse_next(input)
}

fn node<'s>(input: &mut &'s str) -> ModalResult<ParsedNode<'s>> {
    let id = identifier.parse_next(input)?;
    let shape = opt(shape).parse_next(input)?;
    // Class shorthand `id:::className` only affects styling.
    opt(preceded(":::", identifier)).parse_next(input)?;
    Ok(ParsedNode { id, shape })
}

fn shape<'s>(input: &mut &'s str) -> ModalResult<(NodeShape, &'s str)> {
    alt((
        enclosed("((", "))", NodeShape::Circle),
        enclosed("([", "])", NodeShape::Stadium),
        enclosed("[[", "]]", NodeShape::Subroutine),
        enclosed("[(", ")]", NodeShape::Cylinder),
        enclosed("{{", "}}", NodeShape::Hexagon),
        enclosed("[", "]", NodeShape::Rectangle),
        enclosed("(", ")", NodeShape::Rounded),
        enclosed("{", "}", NodeShape::Rhombus),
    ))
    .parse_next(input)
}

/// A label between `open` and `close`; committed once `open` matches.
fn enclosed<'s>(
    open: &'static str,
    close: &'static str,
    shape: NodeShape,
) -> impl FnMut(&mut &'s str) -> ModalResult<(NodeShape, &'s str)> {
    move |input: &mut &'s str| {
        preceded(
            open,
            cut_err(terminated(label_body(close), close))
                .context(StrContext::Label(SHAPE_CONTEXT))
                .context(StrContext::Expected(StrContextValue::StringLiteral(close))),
        )
        .map(|label| (shape, label))
        .parse_next(input)
    }
}

/// Either a quoted label or everything up to `close`.
fn label_body<'s>(close: &'static str) -> impl FnMut(&mut &'s str) -> ModalResult<&'s str> {
    move |input: &mut &'s str| {
        alt((
            delimited((space0, '"'), take_till(0.., '"'), ('"', space0)),
            take_until(0.., close),
        ))
        .parse_next(input)
    }
}

fn link<'s>(input: &mut &'s str) -> ModalResult<ParsedLink<'s>> {
    alt((
        (arrow, opt(preceded(space0, pipe_label)))
            .map(|(style, label)| ParsedLink { style, label }),
        text_link,
    ))
    .parse_next(input)
}

fn arrow(input: &mut &str) -> ModalResult<LinkStyle> {
    alt((dotted_arrow, run_arrow('-', Stroke::Normal), run_arrow('=', Stroke::Thick)))
        .parse_next(input)
}

/// `-.-`, `-.->`, `-..->`
fn dotted_arrow(input: &mut &str) -> ModalResult<LinkStyle> {
    ('-', take_while(1.., '.'), '-', opt('>'))
        .map(|(_, _, _, head)| LinkStyle::new(Stroke::Dotted, head.is_some()))
        .parse_next(input)
}

/// A run of `ch` of at least three characters, or two followed by `>`.
fn run_arrow<'s>(ch: char, stroke: Stroke) -> impl FnMut(&mut &'s str) -> ModalResult<LinkStyle> {
    move |input: &mut &'s str| {
        (take_while(2.., ch), opt('>'))
            .verify_map(|(run, head): (&str, Option<char>)| {
                (run.len() >= 3 || head.is_some())
                    .then(|| LinkStyle::new(stroke, head.is_some()))
            })
            .parse_next(input)
    }
}

/// `|label|`
fn pipe_label<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    delimited(
        '|',
        take_till(0.., '|'),
        cut_err('|').context(StrContext::Expected(StrContextValue::CharLiteral('|'))),
    )
    .map(str::trim)
    .parse_next(input)
}

/// `-- label -->`
fn text_link<'s>(input: &mut &'s str) -> ModalResult<ParsedLink<'s>> {
    preceded(
        ("--", space1),
        cut_err((take_until(1.., "--"), run_arrow('-', Stroke::Normal)))
            .context(StrContext::Expected(StrContextValue::StringLiteral("-->"))),
    )
    .map(|(label, style): (&str, LinkStyle)| ParsedLink {
        style,
        label: Some(label.trim()),
    })
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn parse_ok(source: &str) -> Flowchart {
        match parse(source) {
            Ok(chart) => chart,
            Err(err) => panic!("Expected parsing to succeed, but got error: {err}"),
        }
    }

    fn parse_err(source: &str) -> ParseError {
        match parse(source) {
            Ok(chart) => panic!("Expected parsing to fail, but got {chart:?}"),
            Err(err) => err,
        }
    }

    fn first_code(err: &ParseError) -> Option<ErrorCode> {
        err.diagnostics().first().and_then(Diagnostic::code)
    }

    #[test]
    fn test_single_line_definition() {
        let chart = parse_ok("flowchart TD; A-->B");
        assert_eq!(chart.direction(), Direction::TopDown);
        assert_eq!(chart.node_count(), 2);
        assert_eq!(chart.links().len(), 1);
        let link = &chart.links()[0];
        assert_eq!((link.from(), link.to()), (0, 1));
        assert!(link.style().has_arrow_head());
    }

    #[test]
    fn test_graph_keyword_and_default_direction() {
        let chart = parse_ok("graph\n  A --- B\n");
        assert_eq!(chart.direction(), Direction::TopDown);
        assert!(!chart.links()[0].style().has_arrow_head());
    }

    #[test]
    fn test_all_directions() {
        for (keyword, direction) in [
            ("TB", Direction::TopDown),
            ("BT", Direction::BottomUp),
            ("LR", Direction::LeftRight),
            ("RL", Direction::RightLeft),
        ] {
            let chart = parse_ok(&format!("flowchart {keyword}\nA"));
            assert_eq!(chart.direction(), direction);
        }
    }

    #[test]
    fn test_all_shapes() {
        let source = "flowchart TD
            a[Rect]
            b(Round)
            c([Stadium])
            d[[Sub]]
            e[(Db)]
            f((Circle))
            g{Decide}
            h{{Hex}}
            i";
        let chart = parse_ok(source);
        let shapes: Vec<NodeShape> = chart.nodes().map(Node::shape).collect();
        assert_eq!(
            shapes,
            vec![
                NodeShape::Rectangle,
                NodeShape::Rounded,
                NodeShape::Stadium,
                NodeShape::Subroutine,
                NodeShape::Cylinder,
                NodeShape::Circle,
                NodeShape::Rhombus,
                NodeShape::Hexagon,
                NodeShape::Rectangle,
            ]
        );
        assert_eq!(chart.node_by_id("g").unwrap().label(), "Decide");
        assert_eq!(chart.node_by_id("i").unwrap().label(), "i");
    }

    #[test]
    fn test_quoted_label_may_contain_delimiters() {
        let chart = parse_ok("flowchart LR\nA[\"a; b ] c\"] --> B");
        assert_eq!(chart.node_by_id("A").unwrap().label(), "a; b ] c");
        assert_eq!(chart.links().len(), 1);
    }

    #[test]
    fn test_link_styles() {
        let chart = parse_ok(
            "flowchart TD\nA --> B\nA --- C\nA -.-> D\nA -.- E\nA ==> F\nA === G\nA ----> H",
        );
        let styles: Vec<(Stroke, bool)> = chart
            .links()
            .iter()
            .map(|link| (link.style().stroke(), link.style().has_arrow_head()))
            .collect();
        assert_eq!(
            styles,
            vec![
                (Stroke::Normal, true),
                (Stroke::Normal, false),
                (Stroke::Dotted, true),
                (Stroke::Dotted, false),
                (Stroke::Thick, true),
                (Stroke::Thick, false),
                (Stroke::Normal, true),
            ]
        );
    }

    #[test]
    fn test_link_labels() {
        let chart = parse_ok("flowchart TD\nA -->|yes| B\nA -- no --> C\nA -->| spaced | D");
        let labels: Vec<Option<&str>> = chart.links().iter().map(Link::label).collect();
        assert_eq!(labels, vec![Some("yes"), Some("no"), Some("spaced")]);
    }

    #[test]
    fn test_chain() {
        let chart = parse_ok("flowchart LR\nA --> B --> C[End]");
        assert_eq!(chart.links().len(), 2);
        assert_eq!((chart.links()[1].from(), chart.links()[1].to()), (1, 2));
        assert_eq!(chart.node_by_id("C").unwrap().label(), "End");
    }

    #[test]
    fn test_comments_styles_and_subgraphs_are_ignored() {
        let source = "%%{init: {'theme': 'dark'}}%%
flowchart TD
    %% a comment; with a semicolon
    subgraph one
      A --> B
    end
    classDef hot fill:#f96
    class A hot
    style B fill:#bbf
    B:::hot --> C";
        let chart = parse_ok(source);
        assert_eq!(chart.node_count(), 3);
        assert_eq!(chart.links().len(), 2);
    }

    #[test]
    fn test_front_matter_block_is_skipped() {
        let chart = parse_ok("---\ntitle: Flow\n---\nflowchart LR\nA-->B");
        assert_eq!(chart.direction(), Direction::LeftRight);
    }

    #[test]
    fn test_empty_definition() {
        let err = parse_err("  \n%% only a comment\n");
        assert_eq!(first_code(&err), Some(ErrorCode::E001));
    }

    #[test]
    fn test_unsupported_diagram_type() {
        let err = parse_err("sequenceDiagram\nAlice->>Bob: Hi");
        assert_eq!(first_code(&err), Some(ErrorCode::E003));
        let label = &err.diagnostics()[0].labels()[0];
        assert_eq!((label.span().start(), label.span().end()), (0, 15));
    }

    #[test]
    fn test_unknown_diagram_type() {
        let err = parse_err("flowchartt TD\nA-->B");
        assert_eq!(first_code(&err), Some(ErrorCode::E002));
    }

    #[test]
    fn test_invalid_direction() {
        let err = parse_err("flowchart XY\nA-->B");
        assert_eq!(first_code(&err), Some(ErrorCode::E101));
        let span = err.diagnostics()[0].labels()[0].span();
        assert_eq!((span.start(), span.end()), (10, 12));
    }

    #[test]
    fn test_unclosed_shape() {
        let err = parse_err("flowchart TD\nA[Start --> B");
        assert_eq!(first_code(&err), Some(ErrorCode::E102));
        assert_eq!(err.diagnostics()[0].help(), Some("close the label with `]`"));
    }

    #[test]
    fn test_unexpected_token_span() {
        let source = "flowchart TD\nA --> B\nA & B --> C";
        let err = parse_err(source);
        assert_eq!(err.diagnostics().len(), 1);
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        let span = diag.labels()[0].span();
        assert_eq!(&source[span.start()..span.end()], "&");
    }

    #[test]
    fn test_every_bad_statement_is_reported() {
        let err = parse_err("flowchart TD\nA -->\nB[oops\nC --> D\n-->");
        assert_eq!(err.diagnostics().len(), 3);
    }

    #[test]
    fn test_dangling_link_is_an_error() {
        let err = parse_err("flowchart TD; A -->");
        assert_eq!(first_code(&err), Some(ErrorCode::E100));
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(body in "[A-Za-z0-9 \\[\\](){}|;\"%<>.=-]{0,64}") {
            let _ = parse(&format!("flowchart TD\n{body}"));
        }
    }
}
