fn main() {
    println!("cargo:rustc-check-cfg=cfg(desktop)");
    println!("cargo:rustc-check-cfg=cfg(mobile)");

    // Headless core builds (no `app` feature) never link the Tauri runtime, and
    // `tauri_build::build()` reads env vars only the `tauri` crate exports.
    if std::env::var_os("CARGO_FEATURE_APP").is_some() {
        tauri_build::build()
    }
}
