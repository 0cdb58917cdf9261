use crate::assemble::export_expression;
use crate::assemble::module_wrapper;
use crate::assemble::namespace_owners;
use crate::assemble::namespace_statements;
use crate::assemble::ModuleParts;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::html::render_page;
use crate::html::template_candidates;
use crate::html::Page;
use crate::lookup::absolute_path;
use crate::lookup::Lookup;
use crate::lookup::RealFs;
use crate::lookup::SourceFs;
use crate::module::FileSet;
use crate::module::JsModule;
use crate::order::depth_order;
use crate::BuildWarning;
use parking_lot::Mutex;
use render_js::render;
use render_js::render_with_source_map;
use render_js::sourcemap::SourceMap;
use render_js::sourcemap::SourceMapOptions;
use render_js::RenderOptions;
use scope_js::apply_names;
use scope_js::mangle;
use scope_js::resolve;
use scope_js::Diagnostic;
use scope_js::MangleResult;
use scope_js::ResolveError;
use scope_js::ResolveOptions;
use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::loc::Loc;
use tracing::debug;
use tracing::debug_span;
use tracing::info;
use tracing::warn;

pub const MULTIPLE_ENTRY_EXPORTS: &str = "BD0001";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
  pub minify: bool,
  /// Emit only the entry module's own wrapper, leaving its dependencies to be loaded separately.
  pub standalone: bool,
}

#[derive(Clone, Debug)]
pub struct BuildOutput {
  pub css: String,
  pub js: String,
  /// Expression evaluating to the entry module's first export in the emitted program.
  pub export: String,
  pub source_map: Option<SourceMap>,
  /// Application page, when the search roots contain an `index.html` template.
  pub html: Option<String>,
  pub warnings: Vec<BuildWarning>,
}

/// The assembled, not yet resolved, program of one build.
struct Assembly {
  tree: Node,
  root_global: String,
  root_index: PathBuf,
  export: String,
  modules: usize,
  source_bytes: usize,
  css: String,
  warnings: Vec<BuildWarning>,
}

#[derive(Debug, Default)]
struct Workspace {
  files: FileSet,
  modules: BTreeMap<String, JsModule>,
}

impl Workspace {
  /// Loads the module graph reachable from `entry`. Returns the reachable module names, entry
  /// first, in discovery order.
  fn discover<F: SourceFs>(
    &mut self,
    lookup: &Lookup<'_, F>,
    static_data: &BTreeMap<String, Map<String, Value>>,
    entry: &str,
  ) -> Result<Vec<String>, BuildError> {
    let started = Instant::now();
    if !self.modules.contains_key(entry) {
      let index = if entry.ends_with(".js") {
        absolute_path(Path::new(entry))?
      } else {
        lookup.find_module(entry, Path::new(entry))?
      };
      self
        .modules
        .insert(entry.to_string(), JsModule::new(entry.to_string(), index));
    }

    let mut reachable = vec![entry.to_string()];
    let mut reparsed = 0;
    let mut next = 0;
    while next < reachable.len() {
      let name = reachable[next].clone();
      next += 1;
      let Some(module) = self.modules.get_mut(&name) else {
        continue;
      };
      let data = static_data
        .get(&module.name)
        .or_else(|| static_data.get(&module.global));
      if module.reload(&mut self.files, lookup, data)? {
        reparsed += 1;
      }
      let importer = module.index.clone();
      let imports: Vec<String> = module.imports.keys().cloned().collect();
      for import in imports {
        if reachable.contains(&import) {
          continue;
        }
        if !self.modules.contains_key(&import) {
          let index = lookup.find_module(&import, &importer)?;
          debug!(module = %import, index = %index.display(), "found module");
          self
            .modules
            .insert(import.clone(), JsModule::new(import.clone(), index));
        }
        reachable.push(import);
      }
    }
    debug!(
      entry,
      modules = reachable.len(),
      reparsed,
      elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
      "discovered module graph"
    );
    Ok(reachable)
  }

  fn module(&self, name: &str) -> Result<&JsModule, BuildError> {
    self
      .modules
      .get(name)
      .ok_or_else(|| BuildError::graph(name, format!("module `{name}` was not discovered")))
  }

  fn assemble(&mut self, reachable: &[String], standalone: bool) -> Result<Assembly, BuildError> {
    let Some(root) = reachable.first() else {
      return Err(BuildError::graph("", "nothing to build"));
    };
    let modules = &self.modules;
    let order = depth_order(root.clone(), reachable.len(), |name| {
      modules
        .get(name)
        .map(|m| m.imports.keys().cloned().collect())
        .unwrap_or_default()
    })
    .map_err(|cycle| {
      let path = modules
        .get(&cycle.0[0])
        .map(|m| m.index.clone())
        .unwrap_or_default();
      BuildError::graph(
        path,
        format!("import cycle detected: {}", cycle.0.join(" -> ")),
      )
    })?;

    // Dependencies come first, so re-exported modules are complete when they are reached.
    let mut exports_of: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for name in order.iter() {
      let module = self.module(name)?;
      let mut exports = module.exports.clone();
      for source in module.star_exports.iter() {
        if let Some(more) = exports_of.get(source.as_str()) {
          exports.extend(more.iter().cloned());
        }
      }
      if exports.is_empty() {
        return Err(BuildError::graph(
          &module.index,
          format!("module `{name}` has no exports"),
        ));
      }
      exports_of.insert(name.as_str(), exports);
    }

    let root_module = self.module(root)?;
    let root_global = root_module.global.clone();
    let root_index = root_module.index.clone();
    let mut warnings = Vec::new();
    let root_exports = exports_of.get(root.as_str()).cloned().unwrap_or_default();
    let Some(export) = root_exports.first().cloned() else {
      return Err(BuildError::graph(&root_index, format!("module `{root}` has no exports")));
    };
    if root_exports.len() > 1 {
      let names: Vec<&str> = root_exports.iter().map(|e| e.as_str()).collect();
      warnings.push(BuildWarning {
        code: MULTIPLE_ENTRY_EXPORTS,
        path: root_index.clone(),
        line: None,
        column: None,
        message: format!(
          "entry module `{root}` exports {} symbols ({}); `{export}` is used as the entry point",
          names.len(),
          names.join(", ")
        ),
      });
    }

    let globals: Vec<String> = order
      .iter()
      .filter_map(|name| self.modules.get(name))
      .map(|m| m.global.clone())
      .collect();
    let owners = namespace_owners(&globals);
    let emitted: Vec<&String> = if standalone {
      vec![root]
    } else {
      order.iter().collect()
    };
    let mut statements = if standalone {
      Vec::new()
    } else {
      namespace_statements(&globals)
    };
    let mut styles = Vec::new();
    let mut source_bytes = 0;
    for name in emitted {
      let Some(module) = self.modules.get_mut(name) else {
        return Err(BuildError::graph(name.as_str(), format!("module `{name}` was not discovered")));
      };
      let body = module.body(&self.files)?;
      let imports = module.wrapper_imports(&exports_of);
      let exports = exports_of.get(name.as_str()).cloned().unwrap_or_default();
      let wrapper = module_wrapper(ModuleParts {
        name: &module.global,
        body,
        imports: &imports,
        exports: &exports,
        merge: owners.contains(&module.global),
      })
      .map_err(|msg| BuildError::graph(&module.index, msg))?;
      statements.push(wrapper);
      source_bytes += module.source_bytes(&self.files);
      styles.extend(module.styles(&self.files));
      warnings.extend(module.warnings(&self.files));
    }

    Ok(Assembly {
      tree: Node::with_children(Kind::Module, Loc::synthetic(), statements),
      root_global,
      root_index,
      export,
      modules: order.len(),
      source_bytes,
      css: styles.join("\n"),
      warnings,
    })
  }

  /// Position of a resolver finding, in the file it points into.
  fn locate(&self, loc: Loc, fallback: &Path) -> (PathBuf, Option<&str>) {
    match self.files.by_source(loc.source) {
      Some(file) => (file.source_path.clone(), file.text()),
      None => (fallback.to_path_buf(), None),
    }
  }

  fn resolve_error(&self, err: &ResolveError, fallback: &Path) -> BuildError {
    let (path, text) = self.locate(err.loc(), fallback);
    BuildError::from_resolve(path, text, err)
  }

  fn warning(&self, diagnostic: &Diagnostic, fallback: &Path) -> BuildWarning {
    let (path, _) = self.locate(diagnostic.loc, fallback);
    let known = !diagnostic.loc.is_synthetic();
    BuildWarning {
      code: diagnostic.code,
      path,
      line: known.then_some(diagnostic.loc.line + 1),
      column: known.then_some(diagnostic.loc.column + 1),
      message: diagnostic.message.clone(),
    }
  }

  fn source_map_options(&self, file: String) -> SourceMapOptions {
    let files: Vec<_> = self.files.in_source_order().collect();
    SourceMapOptions {
      file,
      sources: files
        .iter()
        .map(|f| f.source_path.display().to_string())
        .collect(),
      sources_content: Some(
        files
          .iter()
          .map(|f| f.text().unwrap_or_default().to_string())
          .collect(),
      ),
    }
  }
}

/// Builds bundles from a project on disk. Parsed files are cached between builds and reparsed
/// only when they change, so one builder should serve every build of a project.
pub struct Builder<F: SourceFs = RealFs> {
  config: BuildConfig,
  fs: F,
  workspace: Mutex<Workspace>,
}

impl Builder<RealFs> {
  pub fn new(config: BuildConfig) -> Self {
    Self::with_fs(config, RealFs)
  }
}

impl<F: SourceFs> Builder<F> {
  pub fn with_fs(config: BuildConfig, fs: F) -> Self {
    Builder {
      config,
      fs,
      workspace: Mutex::new(Workspace::default()),
    }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  fn lookup(&self) -> Lookup<'_, F> {
    Lookup {
      fs: &self.fs,
      roots: self.config.roots(),
      platform: self.config.platform.as_deref(),
    }
  }

  /// Fills in the first template found for the configured platform, if any.
  fn page(&self, css: &str, js: &str, export: &str) -> Result<Option<String>, BuildError> {
    let lookup = self.lookup();
    let Some(path) = template_candidates(lookup.platform)
      .iter()
      .find_map(|name| lookup.find_file(name))
    else {
      return Ok(None);
    };
    let template = self
      .fs
      .read_to_string(&path)
      .map_err(|err| BuildError::io(&path, &err))?;
    let page = Page {
      css,
      js,
      export,
      favicon: lookup.find_file("favicon.ico").is_some(),
    };
    debug!(template = %path.display(), "rendering page");
    Ok(Some(render_page(&template, &self.config.html, &page)))
  }

  /// Loads everything reachable from `entry`, a `.js` path or a module name, and returns the
  /// names of the reachable modules with the entry first.
  pub fn discover(&self, entry: &str) -> Result<Vec<String>, BuildError> {
    let mut workspace = self.workspace.lock();
    workspace.discover(&self.lookup(), &self.config.static_data, entry)
  }

  /// The unresolved program for `entry`: every reachable module in dependency order, or only the
  /// entry module's wrapper when `standalone`.
  pub fn assemble(&self, entry: &str, standalone: bool) -> Result<Node, BuildError> {
    let mut workspace = self.workspace.lock();
    let reachable = workspace.discover(&self.lookup(), &self.config.static_data, entry)?;
    Ok(workspace.assemble(&reachable, standalone)?.tree)
  }

  /// Returns the stylesheet, the program and the expression naming the entry point.
  pub fn build(&self, entry: &str, minify: bool) -> Result<(String, String, String), BuildError> {
    let output = self.build_with_options(
      entry,
      &BuildOptions {
        minify,
        standalone: false,
      },
    )?;
    Ok((output.css, output.js, output.export))
  }

  pub fn build_with_options(
    &self,
    entry: &str,
    options: &BuildOptions,
  ) -> Result<BuildOutput, BuildError> {
    let _span = debug_span!("build", entry, minify = options.minify).entered();
    let started = Instant::now();
    let mut workspace = self.workspace.lock();
    let reachable = workspace.discover(&self.lookup(), &self.config.static_data, entry)?;
    let assembly = workspace.assemble(&reachable, options.standalone)?;
    let mut tree = assembly.tree;

    let resolve_options = ResolveOptions {
      path: assembly.root_global.clone(),
      strict: false,
    };
    let mut resolution = resolve(&mut tree, &resolve_options)
      .map_err(|err| workspace.resolve_error(&err, &assembly.root_index))?;
    if options.standalone {
      // Dependencies are loaded separately and found under their declared paths.
      for binding in resolution.scopes.bindings.iter_mut() {
        if binding.synthetic {
          binding.pinned = true;
        }
      }
    }
    let mangled = if options.minify {
      mangle(&mut tree, &resolution.scopes)
    } else {
      apply_names(&mut tree, &resolution.scopes, self.config.naming);
      MangleResult::default()
    };

    let mut warnings = assembly.warnings;
    warnings.extend(
      resolution
        .diagnostics
        .iter()
        .map(|d| workspace.warning(d, &assembly.root_index)),
    );
    for warning in warnings.iter() {
      warn!(code = warning.code, "{warning}");
    }

    let render_options = RenderOptions {
      minify: options.minify,
    };
    let wants_map = self.config.source_map || self.config.inline_source_map;
    let (mut js, source_map) = if wants_map {
      let map_options = workspace.source_map_options(format!("{}.js", assembly.root_global));
      let (js, map) = render_with_source_map(&tree, &render_options, &map_options);
      (js, Some(map))
    } else {
      (render(&tree, &render_options), None)
    };
    if self.config.inline_source_map {
      if let Some(map) = &source_map {
        js.push('\n');
        js.push_str(&map.to_inline_comment());
      }
    }

    let export = export_expression(
      &assembly.root_global,
      &assembly.export,
      &mangled.renamed_globals,
    );
    let html = self.page(&assembly.css, &js, &export)?;
    info!(
      entry,
      modules = assembly.modules,
      source_bytes = assembly.source_bytes,
      js_bytes = js.len(),
      css_bytes = assembly.css.len(),
      ratio = js.len() as f64 / assembly.source_bytes.max(1) as f64,
      renamed = mangled.renamed,
      warnings = warnings.len(),
      elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
      "build finished"
    );
    Ok(BuildOutput {
      css: assembly.css,
      js,
      export,
      source_map,
      html,
      warnings,
    })
  }

  /// Forces `path` to be reparsed by the next build, whatever its timestamp.
  pub fn invalidate(&self, path: &Path) -> bool {
    let mut workspace = self.workspace.lock();
    if !workspace.files.invalidate(path) {
      return false;
    }
    for module in workspace.modules.values_mut() {
      if module.contains(path) {
        module.invalidate();
      }
    }
    true
  }
}
