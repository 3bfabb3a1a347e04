//! Build script to track include_str! dependencies.
//! This ensures cargo rebuilds when the embedded seed data changes.

fn main() {
    println!("cargo:rerun-if-changed=resources/demo.json");
}
