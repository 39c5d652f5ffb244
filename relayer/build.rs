use std::{env, fs, path::Path};

fn main() {
    // Version from $VERSION, falling back to the package version
    let version = env::var("VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("version.rs");
    fs::write(
        dest_path,
        format!(r#"pub const APP_VERSION: &str = "{version}";"#),
    )
    .unwrap();

    println!("cargo:rerun-if-env-changed=VERSION");
}
