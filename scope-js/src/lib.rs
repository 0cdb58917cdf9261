use syntax_js::ast::Node;

pub mod builtins;
pub mod diagnostic;
pub mod mangle;
pub mod names;
pub mod resolve;
pub mod scope;

pub use diagnostic::Diagnostic;
pub use diagnostic::ResolveError;
pub use mangle::mangle;
pub use mangle::MangleResult;
pub use names::apply_names;
pub use names::NameStyle;
pub use resolve::resolve;
pub use resolve::Resolution;
pub use resolve::ResolveOptions;

/// Resolves `module` and renames its bindings, either to short mangled names (`minify`) or to the
/// names chosen by `style`.
pub fn rename(
  module: &mut Node,
  options: &ResolveOptions,
  minify: bool,
  style: NameStyle,
) -> Result<(Resolution, MangleResult), ResolveError> {
  let resolution = resolve(module, options)?;
  let mangled = if minify {
    mangle(module, &resolution.scopes)
  } else {
    apply_names(module, &resolution.scopes, style);
    MangleResult::default()
  };
  Ok((resolution, mangled))
}
