use ahash::HashSet;
use ahash::HashSetExt;
use once_cell::sync::Lazy;

/// Globals provided by browsers and the language itself. Unresolved references to these are not
/// reported.
pub static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
  let mut set = HashSet::new();
  for name in [
    "AbortController",
    "Array",
    "ArrayBuffer",
    "BigInt",
    "Blob",
    "Boolean",
    "CustomEvent",
    "DataView",
    "Date",
    "Error",
    "EvalError",
    "Event",
    "EventTarget",
    "FileReader",
    "Float32Array",
    "Float64Array",
    "FormData",
    "Function",
    "Headers",
    "Image",
    "Infinity",
    "Int16Array",
    "Int32Array",
    "Int8Array",
    "Intl",
    "JSON",
    "Map",
    "Math",
    "MutationObserver",
    "NaN",
    "Number",
    "Object",
    "Promise",
    "Proxy",
    "RangeError",
    "ReferenceError",
    "Reflect",
    "RegExp",
    "Request",
    "Response",
    "Set",
    "String",
    "Symbol",
    "SyntaxError",
    "TextDecoder",
    "TextEncoder",
    "TypeError",
    "URIError",
    "URL",
    "URLSearchParams",
    "Uint16Array",
    "Uint32Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "WeakMap",
    "WeakSet",
    "WebSocket",
    "Worker",
    "XMLHttpRequest",
    "alert",
    "arguments",
    "atob",
    "btoa",
    "cancelAnimationFrame",
    "clearInterval",
    "clearTimeout",
    "console",
    "decodeURI",
    "decodeURIComponent",
    "document",
    "encodeURI",
    "encodeURIComponent",
    "eval",
    "fetch",
    "globalThis",
    "history",
    "isFinite",
    "isNaN",
    "localStorage",
    "location",
    "navigator",
    "parseFloat",
    "parseInt",
    "performance",
    "queueMicrotask",
    "requestAnimationFrame",
    "self",
    "sessionStorage",
    "setInterval",
    "setTimeout",
    "undefined",
    "window",
  ] {
    set.insert(name);
  }
  set
});

pub fn is_builtin(name: &str) -> bool {
  BUILTINS.contains(name)
}
