//! `json-dom-pointer`: evaluate an absolute or relative pointer in a document.
//!
//! Usage:
//!   json-dom-pointer '<pointer>' ['<context-pointer>']
//!
//! The document is read from stdin. Relative pointers are evaluated from the
//! node addressed by the absolute context pointer, or from the root.

use json_dom::cli::lookup_pointer;
use std::io::{self, Read, Write};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let Some(pointer) = args.get(1) else {
        eprintln!("First argument must be a JSON Pointer.");
        std::process::exit(1);
    };
    let context = args.get(2).map(String::as_str);

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match lookup_pointer(buf.trim(), pointer, context) {
        Ok(result) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{result}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
