//! Application pages generated from an `index.html` template found in the search roots.
//!
//! The template is copied as is, except for these markers:
//!
//! - `${PATH}`: the resource path prefix, without a trailing slash.
//! - `<!--TITLE-->`: a `<title>` element.
//! - `<!--FAVICON-->`: a favicon link, when `favicon.ico` exists in the roots.
//! - `<!--STYLE-->`: the stylesheet, inline or linked.
//! - `<!--SOURCE-->`: the bundle, inline or linked.
//! - `<!--RENDER-->`: a script mounting a new instance of the entry point on `#root`.

use crate::error::escape_html;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
  pub title: String,
  /// Prefix of linked resources, ending in `/`.
  pub path_prefix: String,
  /// Called as `render(root_element, node)` once the page has loaded.
  pub render_function: String,
  /// Embed the stylesheet and bundle in the page instead of linking `static/index.css` and
  /// `static/index.js`.
  pub inline: bool,
}

impl Default for HtmlConfig {
  fn default() -> Self {
    HtmlConfig {
      title: String::new(),
      path_prefix: "/".to_string(),
      render_function: "daedalus.render".to_string(),
      inline: true,
    }
  }
}

/// Template names to look for, most specific first.
pub fn template_candidates(platform: Option<&str>) -> Vec<String> {
  let mut names = Vec::with_capacity(2);
  if let Some(platform) = platform {
    names.push(format!("index.{platform}.html"));
  }
  names.push("index.html".to_string());
  names
}

pub struct Page<'a> {
  pub css: &'a str,
  pub js: &'a str,
  /// Expression naming the entry point.
  pub export: &'a str,
  pub favicon: bool,
}

fn script_text(js: &str) -> String {
  js.replace("</script", "<\\/script")
}

fn style(config: &HtmlConfig, css: &str) -> String {
  if css.is_empty() {
    String::new()
  } else if config.inline {
    format!("<style type=\"text/css\">\n{}\n</style>", css.replace("</style", "<\\/style"))
  } else {
    format!(
      "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}static/index.css\">",
      config.path_prefix
    )
  }
}

fn source(config: &HtmlConfig, js: &str) -> String {
  if config.inline {
    format!("<script type=\"text/javascript\">\n{}\n</script>", script_text(js))
  } else {
    format!(
      "<script type=\"text/javascript\" src=\"{}static/index.js\"></script>",
      config.path_prefix
    )
  }
}

fn render_script(config: &HtmlConfig, export: &str) -> String {
  [
    "<script type=\"text/javascript\">".to_string(),
    format!("const document_node = new {export}();"),
    "const document_root = document.getElementById(\"root\");".to_string(),
    "while (document_root.hasChildNodes()) {".to_string(),
    "  document_root.removeChild(document_root.lastChild);".to_string(),
    "}".to_string(),
    format!("{}(document_root, document_node);", config.render_function),
    "</script>".to_string(),
  ]
  .join("\n")
}

pub fn render_page(template: &str, config: &HtmlConfig, page: &Page<'_>) -> String {
  let favicon = if page.favicon {
    format!(
      "<link rel=\"icon\" type=\"image/x-icon\" href=\"{}favicon.ico\" />",
      config.path_prefix
    )
  } else {
    String::new()
  };
  template
    .replace("${PATH}", config.path_prefix.trim_end_matches('/'))
    .replace(
      "<!--TITLE-->",
      &format!("<title>{}</title>", escape_html(&config.title)),
    )
    .replace("<!--FAVICON-->", &favicon)
    .replace("<!--STYLE-->", &style(config, page.css))
    .replace("<!--SOURCE-->", &source(config, page.js))
    .replace("<!--RENDER-->", &render_script(config, page.export))
}

#[cfg(test)]
mod tests {
  use super::render_page;
  use super::template_candidates;
  use super::HtmlConfig;
  use super::Page;

  const TEMPLATE: &str = "<html><head><!--TITLE--><!--FAVICON--><!--STYLE--></head><body><div id=\"root\"></div><!--SOURCE--><!--RENDER--></body></html>";

  fn page<'a>(css: &'a str, js: &'a str) -> Page<'a> {
    Page {
      css,
      js,
      export: "a.App",
      favicon: false,
    }
  }

  #[test]
  fn inline_pages_embed_the_bundle() {
    let config = HtmlConfig {
      title: "Tools & more".into(),
      ..HtmlConfig::default()
    };
    let html = render_page(TEMPLATE, &config, &page(".x{color:red}", "a=1;"));
    assert!(html.contains("<title>Tools &amp; more</title>"));
    assert!(html.contains("<style type=\"text/css\">\n.x{color:red}\n</style>"));
    assert!(html.contains("<script type=\"text/javascript\">\na=1;\n</script>"));
    assert!(html.contains("const document_node = new a.App();"));
    assert!(html.contains("daedalus.render(document_root, document_node);"));
    assert!(!html.contains("<!--"));
  }

  #[test]
  fn linked_pages_use_the_path_prefix() {
    let config = HtmlConfig {
      path_prefix: "/app/".into(),
      inline: false,
      ..HtmlConfig::default()
    };
    let mut page = page("", "a=1;");
    page.favicon = true;
    let html = render_page(
      &format!("{TEMPLATE}<a href=\"${{PATH}}/about\">"),
      &config,
      &page,
    );
    assert!(html.contains("src=\"/app/static/index.js\""));
    assert!(!html.contains("stylesheet"));
    assert!(html.contains("href=\"/app/favicon.ico\""));
    assert!(html.contains("<a href=\"/app/about\">"));
  }

  #[test]
  fn scripts_cannot_close_their_element() {
    let html = render_page(TEMPLATE, &HtmlConfig::default(), &page("", "s=\"</script>\";"));
    assert!(html.contains("s=\"<\\/script>\";"));
  }

  #[test]
  fn platform_templates_are_preferred() {
    assert_eq!(
      template_candidates(Some("android")),
      ["index.android.html", "index.html"]
    );
    assert_eq!(template_candidates(None), ["index.html"]);
  }
}
