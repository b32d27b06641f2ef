// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

/// (variable, what it controls)
const VARS: [(&str, &str); 2] = [
    ("NTPSVCD_CONFIG", "path of the daemon configuration file"),
    ("RUST_LOG", "log level filter for tracing-subscriber"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_names.rs");
    let mut f = std::fs::File::create(path)?;

    for (name, doc) in &VARS {
        writeln!(f, "/// `{name}`: {doc}.")?;
        writeln!(f, "pub const {name}: &str = \"{name}\";")?;
    }

    Ok(())
}
