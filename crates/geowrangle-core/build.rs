// Build script for the optional GDAL-backed geodatabase support.
// Linking itself is handled by gdal-sys; this only surfaces configuration hints.

fn main() {
    println!("cargo:rerun-if-env-changed=GDAL_HOME");
    println!("cargo:rerun-if-env-changed=GDAL_DATA");

    if std::env::var_os("CARGO_FEATURE_GDB").is_none() {
        return;
    }

    if std::env::var("GDAL_HOME").is_err() {
        println!("cargo:warning=GDAL_HOME not set. GDAL will be detected from system paths.");
    }
}
