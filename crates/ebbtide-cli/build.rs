fn main() {
    // stamped into the binary for the `version` command
    let build_time = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    println!("cargo:rustc-env=EBBTIDE_BUILD_TIME={build_time}");
    println!("cargo:rerun-if-changed=build.rs");
}
