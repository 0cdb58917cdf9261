use render_js::render_with_source_map;
use render_js::sourcemap::SourceMap;
use render_js::sourcemap::SourceMapOptions;
use render_js::RenderOptions;
use syntax_js::loc::SourceId;
use syntax_js::parse_source;

fn options() -> SourceMapOptions {
  SourceMapOptions {
    file: "out.js".to_string(),
    sources: vec!["in.js".to_string()],
    sources_content: None,
  }
}

#[test]
fn records_statements_and_identifiers() {
  let module = parse_source("let a = 1;\nfoo(a);", SourceId(0)).unwrap();
  let (text, map) = render_with_source_map(&module, &RenderOptions::minified(), &options());
  assert_eq!(text, "let a=1;foo(a);");
  assert_eq!(map.names, vec!["a", "foo"]);
  assert_eq!(map.mappings, "AAAA,IAAIA,IACJC,IAAID");

  let segments = map.segments().unwrap();
  assert_eq!(segments.len(), 1);
  let positions: Vec<(u32, u32, u32, Option<u32>)> = segments[0]
    .iter()
    .map(|s| (s.generated_column, s.line, s.column, s.name))
    .collect();
  assert_eq!(
    positions,
    vec![
      (0, 0, 0, None),
      (4, 0, 4, Some(0)),
      (8, 1, 0, Some(1)),
      (12, 1, 4, Some(0))
    ]
  );
}

#[test]
fn pretty_output_starts_new_mapping_lines() {
  let module = parse_source("a;\nb;", SourceId(0)).unwrap();
  let (text, map) = render_with_source_map(&module, &RenderOptions::default(), &options());
  assert_eq!(text, "a;\nb;\n");
  let segments = map.segments().unwrap();
  assert_eq!(segments[1][0].generated_column, 0);
  assert_eq!(segments[1][0].line, 1);
}

#[test]
fn json_shape() {
  let module = parse_source("a;", SourceId(0)).unwrap();
  let mut opts = options();
  opts.sources_content = Some(vec!["a;".to_string()]);
  let (_, map) = render_with_source_map(&module, &RenderOptions::minified(), &opts);
  let json = map.to_json();
  assert!(json.contains("\"version\":3"));
  assert!(json.contains("\"sourcesContent\":[\"a;\"]"));
  assert_eq!(SourceMap::from_json(&json).unwrap(), map);
  assert!(map
    .to_inline_comment()
    .starts_with("//# sourceMappingURL=data:application/json;charset=utf-8;base64,"));
}
