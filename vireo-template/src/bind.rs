use vireo_core::{Object, Value};
use vireo_dom::{VNode, text};

use crate::error::BindError;

/// Resolve every placeholder of `ast` against `data`.
///
/// Builds a brand-new tree; the AST is only read. Reads go through
/// [`Object::get`], so binding inside a watcher run subscribes the watcher to
/// every slot the template touches.
pub fn bind(ast: &VNode, data: &Object) -> Result<VNode, BindError> {
    match ast {
        VNode::Element { tag, props, children, .. } => {
            let children = children
                .iter()
                .map(|child| bind(child, data))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(VNode::Element {
                tag: tag.clone(),
                props: props.clone(),
                children,
                el: None,
            })
        }
        VNode::Text { value, .. } => Ok(text(interpolate(value, data)?)),
    }
}

/// Replace each `{{ path }}` span of `raw` with the string form of the value at
/// `path`. All spans resolve against the same `data`.
pub fn interpolate(raw: &str, data: &Object) -> Result<String, BindError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(span) = next_placeholder(rest) {
        out.push_str(&rest[..span.start]);
        let value = resolve_path(data, span.expr)?;
        out.push_str(&value.to_string());
        rest = &rest[span.end..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Look `path` up segment by segment, starting at `data`.
///
/// Objects are indexed by key, arrays by decimal index, and arrays and strings
/// also answer `length`. Anything else along the way is unresolved.
pub fn resolve_path(data: &Object, path: &str) -> Result<Value, BindError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(BindError::EmptyPlaceholder);
    }
    let mut current = Value::Object(data.clone());
    for segment in path.split('.') {
        let next = match &current {
            Value::Object(obj) => obj.get(segment),
            Value::Array(arr) if segment == "length" => Some(Value::from(arr.len())),
            Value::Array(arr) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
            Value::String(s) if segment == "length" => {
                Some(Value::from(s.encode_utf16().count()))
            }
            _ => None,
        };
        current = next.ok_or_else(|| BindError::UnresolvedPath {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }
    Ok(current)
}

/// Placeholder expressions of `raw`, trimmed, in order of appearance.
pub fn placeholders(raw: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = raw;
    while let Some(span) = next_placeholder(rest) {
        found.push(span.expr.trim());
        rest = &rest[span.end..];
    }
    found
}

struct Placeholder<'a> {
    start: usize,
    end: usize,
    expr: &'a str,
}

// `{{`, then the shortest non-empty run without a line break, then `}}`.
fn next_placeholder(s: &str) -> Option<Placeholder<'_>> {
    let mut from = 0;
    while let Some(offset) = s[from..].find("{{") {
        let start = from + offset;
        let body_start = start + 2;
        let body = &s[body_start..];
        for (i, ch) in body.char_indices() {
            if i > 0 && body[i..].starts_with("}}") {
                return Some(Placeholder {
                    start,
                    end: body_start + i + 2,
                    expr: &body[..i],
                });
            }
            if matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                break;
            }
        }
        from = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exprs(raw: &str) -> Vec<&str> {
        placeholders(raw)
    }

    #[test]
    fn shortest_span_wins() {
        assert_eq!(exprs("{{a}} and {{ b.c }}"), vec!["a", "b.c"]);
        assert_eq!(exprs("{{a}}}}"), vec!["a"]);
    }

    #[test]
    fn empty_and_broken_spans_are_literal() {
        assert!(exprs("{{}}").is_empty());
        assert!(exprs("{{ a").is_empty());
        assert!(exprs("{{ a\n }}").is_empty());
    }

    #[test]
    fn extra_open_brace_is_part_of_the_expression() {
        assert_eq!(exprs("{{{a}}"), vec!["{a"]);
    }

    #[test]
    fn multibyte_text_around_placeholders() {
        let data = Object::new().with("name", "Zoë");
        assert_eq!(interpolate("¡hola {{name}}!", &data).unwrap(), "¡hola Zoë!");
    }
}
