//! Build-time check that the VERSION file and Cargo.toml agree.

use std::fs;

fn main() {
    println!("cargo:rerun-if-changed=VERSION");

    let recorded = fs::read_to_string("VERSION")
        .map(|s| s.trim().to_string())
        .expect("VERSION file is missing - run: echo '0.1.0' > VERSION");
    let packaged = env!("CARGO_PKG_VERSION");

    assert_eq!(
        recorded, packaged,
        "VERSION file ({recorded}) and Cargo.toml ({packaged}) disagree; \
         update both to the same version"
    );
}
