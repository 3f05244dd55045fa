#![no_main]

use dw_core::Graph;
use libfuzzer_sys::fuzz_target;

// Splits the input at the first NUL: graph source before it, path source after.
fuzz_target!(|data: &[u8]| {
    let (graph_src, path_src) = match data.iter().position(|&b| b == 0) {
        Some(split) => (&data[..split], &data[split + 1..]),
        None => (data, &b""[..]),
    };

    let parsed = dw_parser::parse("graph.dot", graph_src);
    let mut graph = dw_parser::convert(&parsed.ast);

    for link in &graph.links {
        assert!(graph.contains_node(&link.source));
        assert!(graph.contains_node(&link.target));
    }

    let path = dw_parser::parse("path.dot", path_src);
    let node_count = graph.nodes.len();
    let result = dw_parser::apply_highlight(&mut graph, &path.ast);
    assert_eq!(graph.nodes.len(), node_count);
    assert_eq!(result.valid, result.error.is_none());

    let encoded = serde_json::to_string(&graph).expect("graph serializes");
    let decoded: Graph = serde_json::from_str(&encoded).expect("graph deserializes");
    assert_eq!(decoded, graph);
});
