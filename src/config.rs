//! Configuration loading (spec.md §1: "configuration loading ... supplies
//! `root_path` and `homepage_path` as immutable process-wide strings").
//!
//! Uses `argparse`, promoted here from the teacher's dev-dependency (used
//! there only by its own examples) to a real dependency, since this crate's
//! own binary needs exactly the simple `Store`-option parsing that crate is
//! built for.

use argparse::{ArgumentParser, Store};

/// Immutable once loaded; handed to sessions via `Scope<C>` for the
/// lifetime of the process (spec.md §3, §6 "Filesystem surface").
#[derive(Debug, Clone)]
pub struct Config {
    pub root_path: String,
    pub homepage_path: String,
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            root_path: ".".to_string(),
            homepage_path: "index.html".to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Parses `args` (excluding argv[0]) into a `Config`, or returns the
    /// process exit code `argparse` would use on `--help`/a bad option.
    pub fn parse_args(args: &[String]) -> Result<Config, i32> {
        let mut cfg = Config::default();
        {
            let mut ap = ArgumentParser::new();
            ap.set_description(
                "Serves static files and dynamic plugin handlers over HTTP.");
            ap.refer(&mut cfg.root_path)
                .add_option(&["-r", "--root"], Store,
                    "Document root that static and dynamic URLs resolve under");
            ap.refer(&mut cfg.homepage_path)
                .add_option(&["--homepage"], Store,
                    "Path under root served for the bare '/' target");
            ap.refer(&mut cfg.listen_addr)
                .add_option(&["-l", "--listen"], Store,
                    "Address to bind the listening socket on");
            match ap.parse(args.to_vec(), &mut ::std::io::sink(), &mut ::std::io::sink()) {
                Ok(()) => {}
                Err(code) => return Err(code),
            }
        }
        Ok(cfg)
    }
}
