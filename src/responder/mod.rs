//! Response generation for the two dispatch targets named in spec.md §2:
//! static files (C4) and dynamic plugin handlers (C5). Both modules only
//! ever see a `Session` once the request is fully parsed and classified;
//! neither touches the parser or the URL normalizer directly.

pub mod static_file;
pub mod dynamic;
