use proptest::prelude::*;
use vireo_core::Object;
use vireo_dom::VNode;
use vireo_template::{SourceNode, bind, compile, placeholders};

const KEYS: [&str; 4] = ["k0", "k1", "k2", "k3"];

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Slot(usize, String),
}

fn arb_piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        "[a-z .,!]{0,6}".prop_map(Piece::Literal),
        (0usize..KEYS.len(), "[ ]{0,2}").prop_map(|(k, pad)| Piece::Slot(k, pad)),
    ]
}

fn arb_text() -> impl Strategy<Value = Vec<Piece>> {
    proptest::collection::vec(arb_piece(), 1..5)
}

fn raw(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|p| match p {
            Piece::Literal(s) => s.clone(),
            Piece::Slot(k, pad) => format!("{{{{{pad}{}{pad}}}}}", KEYS[*k]),
        })
        .collect()
}

fn expected(pieces: &[Piece], values: &[String]) -> String {
    pieces
        .iter()
        .map(|p| match p {
            Piece::Literal(s) => s.clone(),
            Piece::Slot(k, _) => values[*k].clone(),
        })
        .collect()
}

fn texts(node: &VNode, out: &mut Vec<String>) {
    match node {
        VNode::Text { value, .. } => out.push(value.clone()),
        VNode::Element { children, .. } => children.iter().for_each(|c| texts(c, out)),
    }
}

proptest! {
    #[test]
    fn bind_of_compile_resolves_every_placeholder(
        bodies in proptest::collection::vec((arb_text(), any::<bool>()), 1..5),
        values in proptest::collection::vec("[a-z]{0,6}", KEYS.len()),
    ) {
        let children: Vec<SourceNode> = bodies
            .iter()
            .map(|(pieces, wrap)| {
                let t = SourceNode::text(raw(pieces));
                if *wrap { SourceNode::element("span", vec![], vec![t]) } else { t }
            })
            .collect();
        let source = SourceNode::element("div", vec![("id", "root")], children);
        let data: Object = KEYS.iter().copied().zip(values.iter().cloned()).collect();

        let ast = compile(&source).unwrap();
        let bound = bind(&ast, &data).unwrap();

        let mut got = Vec::new();
        texts(&bound, &mut got);
        let want: Vec<String> = bodies.iter().map(|(p, _)| expected(p, &values)).collect();
        prop_assert_eq!(&got, &want);
        for t in &got {
            prop_assert!(placeholders(t).is_empty());
        }

        let again = bind(&ast, &data).unwrap();
        prop_assert_eq!(bound, again);
    }
}
