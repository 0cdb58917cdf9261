//! Logical modules: an index file plus everything it textually includes.

use crate::assemble::file_wrapper;
use crate::assemble::static_data_statements;
use crate::error::BuildError;
use crate::file::JsFile;
use crate::file::Parsed;
use crate::lookup::include_path;
use crate::lookup::module_global_name;
use crate::lookup::Lookup;
use crate::lookup::SourceFs;
use crate::order::depth_order;
use crate::BuildWarning;
use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use syntax_js::ast::Node;
use syntax_js::loc::SourceId;
use syntax_js::surface::STAR;
use tracing::info;

/// Every file seen by a builder, keyed by path. Files shared between modules are loaded once.
#[derive(Debug, Default)]
pub struct FileSet {
  files: BTreeMap<PathBuf, JsFile>,
  /// File paths indexed by `SourceId`.
  sources: Vec<PathBuf>,
  /// Bumped on every successful reparse.
  revision: u64,
  revisions: BTreeMap<PathBuf, u64>,
}

impl FileSet {
  pub fn get(&self, path: &Path) -> Option<&JsFile> {
    self.files.get(path)
  }

  pub fn parsed(&self, path: &Path) -> Option<&Parsed> {
    self.files.get(path).and_then(|f| f.parsed())
  }

  pub fn by_source(&self, id: SourceId) -> Option<&JsFile> {
    if id.is_synthetic() {
      return None;
    }
    self
      .sources
      .get(id.raw() as usize)
      .and_then(|path| self.files.get(path))
  }

  /// Every known file in `SourceId` order.
  pub fn in_source_order(&self) -> impl Iterator<Item = &JsFile> {
    self.sources.iter().filter_map(|path| self.files.get(path))
  }

  pub fn invalidate(&mut self, path: &Path) -> bool {
    match self.files.get_mut(path) {
      Some(file) => {
        file.invalidate();
        true
      }
      None => false,
    }
  }

  /// Brings one file up to date, registering it first if it is new. Returns its revision.
  fn refresh<F: SourceFs>(
    &mut self,
    path: &Path,
    lookup: &Lookup<'_, F>,
    name: String,
  ) -> Result<(u64, &JsFile), BuildError> {
    if !self.files.contains_key(path) {
      let source_id = SourceId(self.sources.len() as u32);
      let file = JsFile::new(path.to_path_buf(), lookup.source_path(path), name, source_id);
      self.sources.push(path.to_path_buf());
      self.files.insert(path.to_path_buf(), file);
    }
    let Some(file) = self.files.get_mut(path) else {
      return Err(BuildError::graph(path, "file vanished from the workspace"));
    };
    if file.reload(lookup.fs)? {
      self.revision += 1;
      self.revisions.insert(path.to_path_buf(), self.revision);
    }
    let revision = self.revisions.get(path).copied().unwrap_or_default();
    Ok((revision, &self.files[path]))
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleState {
  Unloaded,
  Loaded,
  /// One of the files was invalidated.
  Stale,
  Error,
}

#[derive(Debug)]
pub struct JsModule {
  /// Name the module is imported by: dotted, or a path ending in `.js`.
  pub name: String,
  /// Dotted global path the module is published under.
  pub global: String,
  pub index: PathBuf,
  /// Member files in build order. The index file is last.
  order: Vec<PathBuf>,
  /// Revision of every member file as of the last load.
  revisions: BTreeMap<PathBuf, u64>,
  /// Import name as written to `{imported: local}`, merged over all member files.
  pub imports: BTreeMap<String, BTreeMap<String, String>>,
  /// Exports of all member files and the static data keys.
  pub exports: BTreeSet<String>,
  pub static_exports: BTreeSet<String>,
  /// Modules re-exported with `export * from`.
  pub star_exports: BTreeSet<String>,
  static_data: Vec<Node>,
  /// Static data, wrapped files and index statements, ready to be put in a module wrapper.
  assembled: Option<Vec<Node>>,
  state: ModuleState,
}

fn file_stem(path: &Path) -> String {
  path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default()
}

impl JsModule {
  pub fn new(name: String, index: PathBuf) -> JsModule {
    JsModule {
      global: module_global_name(&name),
      name,
      index,
      order: Vec::new(),
      revisions: BTreeMap::new(),
      imports: BTreeMap::new(),
      exports: BTreeSet::new(),
      static_exports: BTreeSet::new(),
      star_exports: BTreeSet::new(),
      static_data: Vec::new(),
      assembled: None,
      state: ModuleState::Unloaded,
    }
  }

  pub fn state(&self) -> ModuleState {
    self.state
  }

  pub fn files(&self) -> &[PathBuf] {
    &self.order
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.revisions.contains_key(path)
  }

  pub fn invalidate(&mut self) {
    if self.state == ModuleState::Loaded {
      self.state = ModuleState::Stale;
    }
  }

  /// Reloads every member file that changed on disk. Returns whether anything was reparsed, in
  /// which case the cached assembled body has been dropped.
  pub fn reload<F: SourceFs>(
    &mut self,
    files: &mut FileSet,
    lookup: &Lookup<'_, F>,
    static_data: Option<&Map<String, Value>>,
  ) -> Result<bool, BuildError> {
    match self.load(files, lookup, static_data) {
      Ok(changed) => Ok(changed),
      Err(err) => {
        self.state = ModuleState::Error;
        self.assembled = None;
        Err(err)
      }
    }
  }

  fn load<F: SourceFs>(
    &mut self,
    files: &mut FileSet,
    lookup: &Lookup<'_, F>,
    static_data: Option<&Map<String, Value>>,
  ) -> Result<bool, BuildError> {
    let mut found = vec![self.index.clone()];
    let mut edges: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    let mut revisions = BTreeMap::new();
    let mut next = 0;
    while next < found.len() {
      let path = found[next].clone();
      next += 1;
      let name = if path == self.index {
        self.global.clone()
      } else {
        format!("{}.{}", self.global, file_stem(&path))
      };
      let (revision, file) = files.refresh(&path, lookup, name)?;
      revisions.insert(path.clone(), revision);
      let mut targets = Vec::new();
      for include in file.includes() {
        let target = include_path(&path, include);
        if !lookup.fs.is_file(&target) {
          return Err(BuildError::graph(
            &path,
            format!(
              "included file `{include}` not found at {}",
              target.display()
            ),
          ));
        }
        if !found.contains(&target) {
          found.push(target.clone());
        }
        targets.push(target);
      }
      edges.insert(path, targets);
    }

    if self.state == ModuleState::Loaded && revisions == self.revisions {
      return Ok(false);
    }

    let order = depth_order(self.index.clone(), found.len(), |p| {
      edges.get(p).cloned().unwrap_or_default()
    })
    .map_err(|cycle| {
      let members: Vec<String> = cycle.0.iter().map(|p| p.display().to_string()).collect();
      BuildError::graph(
        &cycle.0[0],
        format!("include cycle detected: {}", members.join(" -> ")),
      )
    })?;

    let mut imports: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut exports = BTreeSet::new();
    let mut star_exports = BTreeSet::new();
    for path in order.iter() {
      let parsed = files
        .parsed(path)
        .ok_or_else(|| BuildError::graph(path, "file is not loaded"))?;
      for (source, names) in parsed.surface.imports.iter() {
        imports
          .entry(source.clone())
          .or_default()
          .extend(names.iter().map(|(k, v)| (k.clone(), v.clone())));
      }
      exports.extend(parsed.surface.exports.iter().cloned());
      star_exports.extend(parsed.surface.star_exports.iter().cloned());
    }

    let empty = Map::new();
    let data = static_data.unwrap_or(&empty);
    self.static_data =
      static_data_statements(data).map_err(|msg| BuildError::graph(&self.index, msg))?;
    self.static_exports = data.keys().cloned().collect();
    exports.extend(self.static_exports.iter().cloned());

    info!(
      module = %self.name,
      files = order.len(),
      imports = imports.len(),
      exports = exports.len(),
      "loaded module"
    );
    self.order = order;
    self.revisions = revisions;
    self.imports = imports;
    self.exports = exports;
    self.star_exports = star_exports;
    self.assembled = None;
    self.state = ModuleState::Loaded;
    Ok(true)
  }

  /// Imports keyed by the global path of each source module. A `*` import expands to every
  /// name in `exports_of` for its module.
  pub fn wrapper_imports(
    &self,
    exports_of: &BTreeMap<&str, BTreeSet<String>>,
  ) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut out: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (source, names) in self.imports.iter() {
      let entry = out.entry(module_global_name(source)).or_default();
      for (imported, local) in names.iter() {
        if imported != STAR {
          entry.insert(imported.clone(), local.clone());
          continue;
        }
        if let Some(all) = exports_of.get(source.as_str()) {
          entry.extend(all.iter().map(|name| (name.clone(), name.clone())));
        }
      }
    }
    out
  }

  /// Module body: static data, then each included file in build order, then the index file.
  pub fn body(&mut self, files: &FileSet) -> Result<Vec<Node>, BuildError> {
    if let Some(body) = &self.assembled {
      return Ok(body.clone());
    }
    let mut body = self.static_data.clone();
    let wrap = self.order.len() > 1;
    for path in self.order.iter() {
      let parsed = files
        .parsed(path)
        .ok_or_else(|| BuildError::graph(path, "file is not loaded"))?;
      let statements = parsed.tree.children.clone();
      if !wrap || *path == self.index {
        body.extend(statements);
      } else {
        body.push(file_wrapper(statements, &parsed.surface.exports));
      }
    }
    self.assembled = Some(body.clone());
    Ok(body)
  }

  pub fn styles(&self, files: &FileSet) -> Vec<String> {
    self
      .order
      .iter()
      .filter_map(|p| files.parsed(p))
      .flat_map(|p| p.styles.iter().cloned())
      .collect()
  }

  /// Total size of the member files' source text.
  pub fn source_bytes(&self, files: &FileSet) -> usize {
    self
      .order
      .iter()
      .filter_map(|p| files.parsed(p))
      .map(|p| p.text.len())
      .sum()
  }

  pub fn warnings(&self, files: &FileSet) -> Vec<BuildWarning> {
    self
      .order
      .iter()
      .filter_map(|p| files.parsed(p))
      .flat_map(|p| p.warnings.iter().cloned())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::FileSet;
  use super::JsModule;
  use super::ModuleState;
  use crate::lookup::Lookup;
  use crate::lookup::RealFs;
  use crate::BuildErrorKind;
  use render_js::render;
  use render_js::RenderOptions;
  use std::collections::BTreeMap;
  use std::collections::BTreeSet;
  use std::fs;
  use std::path::Path;
  use syntax_js::ast::Kind;
  use syntax_js::ast::Node;
  use syntax_js::loc::Loc;

  fn lookup(root: &Path) -> Lookup<'_, RealFs> {
    Lookup {
      fs: &RealFs,
      roots: vec![root],
      platform: None,
    }
  }

  fn rendered(body: Vec<Node>) -> String {
    let module = Node::with_children(Kind::Module, Loc::synthetic(), body);
    render(&module, &RenderOptions::minified())
  }

  #[test]
  fn included_files_are_wrapped_before_the_index() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("main.js"),
      "include 'lib/helpers.js';\nexport const run = () => twice(2);\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    fs::write(
      dir.path().join("lib/helpers.js"),
      "include 'base.js';\nexport function twice(x) { return base * x; }\n",
    )
    .unwrap();
    fs::write(dir.path().join("lib/base.js"), "export const base = 2;\n").unwrap();

    let mut files = FileSet::default();
    let mut module = JsModule::new("main".into(), dir.path().join("main.js"));
    assert!(module
      .reload(&mut files, &lookup(dir.path()), None)
      .unwrap());
    assert_eq!(module.state(), ModuleState::Loaded);
    assert_eq!(
      module.files(),
      [
        dir.path().join("lib/base.js"),
        dir.path().join("lib/helpers.js"),
        dir.path().join("main.js"),
      ]
    );
    assert_eq!(
      module.exports.iter().collect::<Vec<_>>(),
      ["base", "run", "twice"]
    );
    let body = module.body(&files).unwrap();
    assert_eq!(
      rendered(body),
      concat!(
        "const[base]=function(){const base=2;return[base];}();",
        "const[twice]=function(){function twice(x){return base*x;}return[twice];}();",
        "const run=()=>twice(2);"
      )
    );
    assert_eq!(
      files.get(&dir.path().join("lib/base.js")).unwrap().name,
      "main.base"
    );

    assert!(!module
      .reload(&mut files, &lookup(dir.path()), None)
      .unwrap());
  }

  #[test]
  fn include_cycles_name_their_members() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("m.js"), "include 'n.js';\nexport const m = 1;\n").unwrap();
    fs::write(dir.path().join("n.js"), "include 'm.js';\nexport const n = 1;\n").unwrap();
    let mut files = FileSet::default();
    let mut module = JsModule::new("m".into(), dir.path().join("m.js"));
    let err = module
      .reload(&mut files, &lookup(dir.path()), None)
      .unwrap_err();
    assert_eq!(err.kind, BuildErrorKind::Graph);
    assert!(err.message.starts_with("include cycle detected: "));
    assert!(err.message.contains("m.js -> "));
    assert!(err.message.ends_with("m.js"));
    assert_eq!(module.state(), ModuleState::Error);
  }

  #[test]
  fn missing_includes_are_graph_errors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("m.js"), "include 'gone.js';\nexport const m = 1;\n").unwrap();
    let mut files = FileSet::default();
    let mut module = JsModule::new("m".into(), dir.path().join("m.js"));
    let err = module
      .reload(&mut files, &lookup(dir.path()), None)
      .unwrap_err();
    assert_eq!(err.kind, BuildErrorKind::Graph);
    assert!(err.message.contains("`gone.js`"));
    assert_eq!(err.path, dir.path().join("m.js"));
  }

  #[test]
  fn static_data_comes_first_and_is_exported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("conf.js"),
      "export const label = `v${version}`;\n",
    )
    .unwrap();
    let data = serde_json::json!({"version": "1.2"});
    let mut files = FileSet::default();
    let mut module = JsModule::new("conf".into(), dir.path().join("conf.js"));
    module
      .reload(&mut files, &lookup(dir.path()), data.as_object())
      .unwrap();
    assert!(module.exports.contains("version"));
    assert!(module.static_exports.contains("version"));
    assert_eq!(
      rendered(module.body(&files).unwrap()),
      "const version=\"1.2\";const label=`v${version}`;"
    );
  }

  #[test]
  fn imports_are_merged_and_keyed_by_global() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("main.js"),
      "include 'extra.js';\nimport {max} from 'lib.util';\nexport const a = max(1, 2);\n",
    )
    .unwrap();
    fs::write(
      dir.path().join("extra.js"),
      "import {min as smallest} from 'lib.util';\nimport {h} from 'vendor/dom.js';\nexport const b = h(smallest(1, 2));\n",
    )
    .unwrap();
    let mut files = FileSet::default();
    let mut module = JsModule::new("main".into(), dir.path().join("main.js"));
    module
      .reload(&mut files, &lookup(dir.path()), None)
      .unwrap();
    let imports = module.wrapper_imports(&BTreeMap::new());
    assert_eq!(imports.keys().collect::<Vec<_>>(), ["dom", "lib.util"]);
    assert_eq!(imports["dom"]["h"], "h");
    assert_eq!(imports["lib.util"]["max"], "max");
    assert_eq!(imports["lib.util"]["min"], "smallest");
    assert_eq!(module.files(), [dir.path().join("extra.js"), dir.path().join("main.js")]);
  }

  #[test]
  fn star_imports_expand_to_the_source_exports() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("main.js"),
      "import * from 'lib.util';\nexport * from 'lib.dom';\nexport const a = max(1, 2);\n",
    )
    .unwrap();
    let mut files = FileSet::default();
    let mut module = JsModule::new("main".into(), dir.path().join("main.js"));
    module
      .reload(&mut files, &lookup(dir.path()), None)
      .unwrap();
    assert_eq!(
      module.star_exports.iter().collect::<Vec<_>>(),
      ["lib.dom"]
    );
    let exports_of = BTreeMap::from([
      ("lib.util", BTreeSet::from(["max".to_string(), "min".to_string()])),
      ("lib.dom", BTreeSet::from(["h".to_string()])),
    ]);
    let imports = module.wrapper_imports(&exports_of);
    assert_eq!(imports["lib.util"].len(), 2);
    assert_eq!(imports["lib.util"]["min"], "min");
    assert_eq!(imports["lib.dom"]["h"], "h");
  }
}
