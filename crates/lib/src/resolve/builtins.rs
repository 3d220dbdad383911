//! Modules supplied by the execution platform itself.

/// Core modules of the target runtime.
pub const NODE_BUILTINS: &[&str] = &[
  "_http_agent",
  "_http_client",
  "_http_common",
  "_http_incoming",
  "_http_outgoing",
  "_http_server",
  "_stream_duplex",
  "_stream_passthrough",
  "_stream_readable",
  "_stream_transform",
  "_stream_wrap",
  "_stream_writable",
  "_tls_common",
  "_tls_wrap",
  "assert",
  "async_hooks",
  "buffer",
  "child_process",
  "cluster",
  "console",
  "constants",
  "crypto",
  "dgram",
  "diagnostics_channel",
  "dns",
  "domain",
  "events",
  "fs",
  "http",
  "http2",
  "https",
  "inspector",
  "module",
  "net",
  "os",
  "path",
  "perf_hooks",
  "process",
  "punycode",
  "querystring",
  "readline",
  "repl",
  "stream",
  "string_decoder",
  "sys",
  "timers",
  "tls",
  "trace_events",
  "tty",
  "url",
  "util",
  "v8",
  "vm",
  "wasi",
  "worker_threads",
  "zlib",
];

/// Packages preinstalled in the function runtime, matched on the first
/// specifier segment.
pub const PLATFORM_PROVIDED: &[&str] = &["@aws-sdk", "aws-lambda"];

/// True if the specifier refers to something the platform already provides.
pub fn is_builtin(specifier: &str) -> bool {
  if specifier.starts_with("node:") {
    return true;
  }
  let first = specifier.split('/').next().unwrap_or(specifier);
  NODE_BUILTINS.contains(&first) || PLATFORM_PROVIDED.contains(&first)
}
