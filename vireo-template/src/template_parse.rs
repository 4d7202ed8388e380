use pest::Parser;
use pest::iterators::Pair;

use crate::error::ParseError;
use crate::source::SourceNode;

#[derive(pest_derive::Parser)]
#[grammar = "template.pest"]
struct TemplateParser;

/// Parse markup into a list of top-level source nodes.
///
/// Supports nested elements, self-closing and void tags, quoted, bare and
/// boolean attributes, comments, and the common character entities. Text,
/// including whitespace-only runs, is kept verbatim.
pub fn parse_template(source: &str) -> Result<Vec<SourceNode>, ParseError> {
    let mut pairs = TemplateParser::parse(Rule::document, source)
        .map_err(|e| ParseError::Syntax(e.to_string()))?;
    let Some(document) = pairs.next() else {
        return Ok(Vec::new());
    };

    let nodes: Vec<SourceNode> = document.into_inner().filter_map(consume_node).collect();
    tracing::debug!(roots = nodes.len(), "parsed template");
    Ok(nodes)
}

/// Parse markup that must contain exactly one root element. Whitespace and
/// comments around it are ignored.
pub fn parse_root(source: &str) -> Result<SourceNode, ParseError> {
    let mut roots: Vec<SourceNode> = parse_template(source)?
        .into_iter()
        .filter(|n| !n.is_whitespace() && !matches!(n, SourceNode::Comment(_)))
        .collect();
    if roots.len() != 1 || roots[0].name().is_none() {
        return Err(ParseError::RootCount(roots.len()));
    }
    Ok(roots.remove(0))
}

fn consume_node(pair: Pair<Rule>) -> Option<SourceNode> {
    match pair.as_rule() {
        Rule::element => pair.into_inner().next().map(parse_element),
        Rule::text => Some(SourceNode::Text(decode_entities(pair.as_str()))),
        Rule::comment => {
            let body = pair
                .into_inner()
                .next()
                .map(|b| b.as_str().to_string())
                .unwrap_or_default();
            Some(SourceNode::Comment(body))
        }
        _ => None,
    }
}

// `self_closing`, `void_element` and `paired` share one shape: a tag name,
// attributes, then (for `paired`) child nodes.
fn parse_element(el: Pair<Rule>) -> SourceNode {
    let mut name = String::new();
    let mut attributes = Vec::new();
    let mut children = Vec::new();

    for part in el.into_inner() {
        match part.as_rule() {
            Rule::tag_name => name = part.as_str().to_string(),
            Rule::attribute => attributes.push(parse_attr(part)),
            _ => {
                if let Some(child) = consume_node(part) {
                    children.push(child);
                }
            }
        }
    }
    SourceNode::Element { name, attributes, children }
}

fn parse_attr(attr: Pair<Rule>) -> (String, String) {
    // attribute = attr_name ( "=" value )?
    let mut name = String::new();
    let mut value = String::new();

    for part in attr.into_inner() {
        match part.as_rule() {
            Rule::attr_name => name = part.as_str().to_string(),
            Rule::dq_value | Rule::sq_value | Rule::bare_value => {
                value = decode_entities(part.as_str())
            }
            _ => {}
        }
    }
    (name, value)
}

/// Decode the handful of named and numeric entities templates actually use.
/// Unknown entities are left as written.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
