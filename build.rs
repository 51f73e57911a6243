fn main() {
    let version = chrono::Utc::now().format("%Y.%m.%d-%H%M").to_string();
    println!("cargo:rustc-env=BUILD_VERSION={version}");
    println!("cargo:rustc-link-arg=-Tlinkall.x");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=assets/index.html");
}
