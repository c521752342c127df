use pretty_assertions::assert_eq;
use proptest::prelude::*;
use turndown_confluence::{convert, convert_bytes, Error};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[track_caller]
fn must_contain(out: &str, want: &str) {
    assert!(out.contains(want), "expected {want:?} in output:\n{out}");
}

#[track_caller]
fn must_not_contain(out: &str, unwanted: &str) {
    assert!(!out.contains(unwanted), "unexpected {unwanted:?} in output:\n{out}");
}

const VIEW_PAGE: &str = r#"
<div class="contentLayout2">
  <div class="toc-macro"></div>
  <h2>Overview</h2>
  <p>Status: <span class="status-macro aui-lozenge">LIVE</span></p>
  <p><strong>Bold</strong> <em>Italic</em> <del>Old</del> and <code>inline()</code></p>
  <p><a class="confluence-userlink" href="/wiki/display/~abc">Jane Doe</a> updated <span class="confluence-jim-macro" data-jira-key="CF-42"><a href="https://jira.example/browse/CF-42">CF-42</a></span> on <time datetime="2025-10-01">01 Oct 2025</time></p>
  <div class="table-wrap">
    <table>
      <thead><tr><th>Name</th><th>Value</th></tr></thead>
      <tbody><tr><td>A</td><td>1</td></tr></tbody>
    </table>
  </div>
  <p><a href="https://example.com/path?atlOrigin=abc">https://example.com/path?atlOrigin=abc</a></p>
  <p><img alt="Diagram" src="/wiki/download/attachments/1/diag.png"/></p>
</div>"#;

#[test]
fn test_view_page() {
    init_tracing();
    let out = convert(VIEW_PAGE).unwrap();

    for want in [
        "## Overview",
        "[LIVE]",
        "**Bold**",
        "_Italic_",
        "~~Old~~",
        "`inline()`",
        "Jane Doe",
        "CF-42",
        "2025-10-01",
        "| Name | Value |",
        "https://example.com/path",
    ] {
        must_contain(&out, want);
    }
    for unwanted in ["atlOrigin=", "[Jane Doe](", "toc-macro", "![Diagram]", "<h2>"] {
        must_not_contain(&out, unwanted);
    }
}

#[test]
fn test_view_page_exact_output() {
    let out = convert(VIEW_PAGE).unwrap();
    assert_eq!(
        out,
        "## Overview\n\
         \n\
         Status: [LIVE]\n\
         \n\
         **Bold** _Italic_ ~~Old~~ and `inline()`\n\
         \n\
         Jane Doe updated CF-42 on 2025-10-01\n\
         \n\
         | Name | Value |\n\
         | --- | --- |\n\
         | A | 1 |\n\
         \n\
         https://example.com/path"
    );
}

#[test]
fn test_removes_high_noise_macros() {
    let input = r#"
<div>
  <p>Important intro.</p>
  <div class="recently-updated conf-macro output-block">
    <ul><li>Very long noisy feed item 1</li><li>Very long noisy feed item 2</li></ul>
  </div>
  <div class="plugin-contributors conf-macro output-block">
    <ul><li>Alice</li><li>Bob</li></ul>
  </div>
  <p>Important outro.</p>
</div>"#;

    let out = convert(input).unwrap();
    assert_eq!(out, "Important intro.\n\nImportant outro.");
    must_not_contain(&out, "feed item");
    must_not_contain(&out, "Alice");
    assert!(out.len() < input.trim().len());
}

#[test]
fn test_table_cell_line_breaks() {
    let input = r#"
<table>
  <thead><tr><th>Field</th><th>Details</th></tr></thead>
  <tbody>
    <tr><td>Example</td><td>Line one<br>Line two<br/>Line three</td></tr>
  </tbody>
</table>"#;

    let out = convert(input).unwrap();
    must_contain(&out, "| Field | Details |");
    must_contain(&out, "Line one / Line two / Line three");
    must_not_contain(&out, "<br");
}

#[test]
fn test_table_has_one_line_per_row_plus_separator() {
    let input = r#"<div class="table-wrap"><table class="confluenceTable">
        <colgroup><col><col></colgroup>
        <tbody>
          <tr><th>K</th><th>V</th></tr>
          <tr><td>a</td><td>1</td></tr>
          <tr><td>b</td><td>2</td></tr>
        </tbody>
      </table></div>"#;

    let out = convert(input).unwrap();
    assert_eq!(out, "| K | V |\n| --- | --- |\n| a | 1 |\n| b | 2 |");
    assert_eq!(out.lines().count(), 4);
}

#[test]
fn test_links() {
    let out = convert(
        r##"<p>See <a href="https://e.com/a?focusedCommentId=9&amp;b=2">https://e.com/a?b=2&amp;focusedCommentId=9</a></p>
           <p><a href="/wiki/spaces/X/pages/1?src=contextnavpagetreemode">Runbook</a></p>
           <p><a href="#section">Jump</a> and <a href="https://e.com/x"><img src="icon.png"></a>.</p>"##,
    )
    .unwrap();
    assert_eq!(
        out,
        "See https://e.com/a?b=2\n\n[Runbook](/wiki/spaces/X/pages/1)\n\n[Jump](#section) and ."
    );
}

#[test]
fn test_images_are_dropped() {
    let out = convert(
        r#"<p>Before</p><p><img src="a.png" alt="Diagram"></p>
           <p>Inline <img src="b.png" alt="icon">icon</p><p>After</p>"#,
    )
    .unwrap();
    must_not_contain(&out, "![");
    must_not_contain(&out, "png");
    must_contain(&out, "Before\n\nInline icon\n\nAfter");
}

#[test]
fn test_nested_list_inside_layout_wrappers() {
    let input = r#"
<div class="contentLayout2">
  <div class="columnLayout single" data-layout="single">
    <div class="cell normal" data-type="normal">
      <div class="innerCell">
        <ul>
          <li>Top
            <ul>
              <li>Inner one</li>
              <li>Inner two</li>
            </ul>
          </li>
          <li>Second</li>
        </ul>
        <p>&nbsp;</p>
      </div>
    </div>
  </div>
</div>"#;

    let out = convert(input).unwrap();
    assert_eq!(out, "- Top\n  - Inner one\n  - Inner two\n- Second");
}

#[test]
fn test_code_panel() {
    let input = r#"<div class="code panel pdl" style="border-width: 1px;">
  <div class="codeContent panelContent pdl">
    <pre class="syntaxhighlighter-pre" data-syntaxhighlighter-params="brush: java; gutter: false; theme: Confluence" data-theme="Confluence">public class A {
    int x = 1;
}</pre>
  </div>
</div>"#;

    let out = convert(input).unwrap();
    assert_eq!(out, "```java\npublic class A {\n    int x = 1;\n}\n```");
}

#[test]
fn test_mixed_macros_in_a_list() {
    let out = convert(
        r#"<ul>
             <li><span class="status-macro aui-lozenge aui-lozenge-success">DONE</span> Migrate <span class="confluence-jim-macro jira-issue" data-jira-key="OPS-7"><a href="https://jira.example/browse/OPS-7">OPS-7</a> <span class="summary">Move DB</span></span></li>
             <li>Owner: <a class="confluence-userlink user-mention" href="/wiki/display/~jdoe" data-username="jdoe">John Doe</a></li>
           </ul>"#,
    )
    .unwrap();
    assert_eq!(out, "- [DONE] Migrate OPS-7\n- Owner: John Doe");
}

#[test]
fn test_convert_bytes_rejects_invalid_utf8() {
    let Error::Parse { offset, message } = convert_bytes(b"<p>caf\xe9</p>").unwrap_err();
    assert_eq!(offset, Some(6));
    assert!(!message.is_empty());

    assert_eq!(convert_bytes("<p>café</p>".as_bytes()).unwrap(), "café");
}

#[test]
fn test_huge_ordered_list_start() {
    let out = convert(r#"<ol start="18446744073709551615"><li>a</li><li>b</li></ol>"#).unwrap();
    assert_eq!(out, "18446744073709551615. a\n18446744073709551615. b");
}

#[test]
fn test_inline_code_with_backtick_runs_keeps_blank_lines_collapsed() {
    let out = convert("<p><code>a``b</code></p><p>x</p><p>y</p>").unwrap();
    assert_eq!(out, "```a``b```\n\nx\n\ny");
}

#[test]
fn test_table_with_leading_empty_row() {
    let out = convert(
        "<table><tr></tr><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>",
    )
    .unwrap();
    assert_eq!(out, "| a | b |\n| --- | --- |\n| c | d |");
}

#[test]
fn test_deeply_nested_markup_on_a_small_stack() {
    let html = format!("{}x", "<div>".repeat(3000));
    let out = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || convert(&html))
        .unwrap()
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(out, "x");
}

proptest! {
    #[test]
    fn prop_conversion_is_deterministic(parts in prop::collection::vec(
        prop::sample::select(vec![
            "<p>", "</p>", "<div class=\"cell\">", "</div>", "<ul><li>", "</li></ul>",
            "<span class=\"status-macro\">", "</span>", "<a href=\"/x?src=y\">", "</a>",
            "<table><tr><td>", "</td></tr></table>", "<br>", "<code>", "</code>",
            "text", " ", "*", "_", "&nbsp;", "\n", "a``b", "```", "<code>x```y</code>",
        ]),
        0..24,
    )) {
        let html = parts.concat();
        let first = convert(&html).unwrap();
        let second = convert(&html).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.trim_end(), first.as_str());
        prop_assert!(!first.contains("\n\n\n"));
    }

    #[test]
    fn prop_arbitrary_input_never_fails(html in ".{0,200}") {
        prop_assert!(convert(&html).is_ok());
    }
}
