use std::env;
use std::path::Path;

// libcanberra is a system library; nothing is vendored or compiled here. The
// link directive is only emitted when the shared object can actually be found,
// so the declarations still type-check on machines without the library
// installed (the `chime` crate gates all callers behind its `canberra`
// feature).
fn main() {
    println!("cargo:rerun-if-env-changed=CANBERRA_LIB_DIR");

    if let Ok(dir) = env::var("CANBERRA_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
        println!("cargo:rustc-link-lib=canberra");
        return;
    }

    if let Some(dir) = find_libcanberra() {
        println!("cargo:rustc-link-search=native={dir}");
        println!("cargo:rustc-link-lib=canberra");
    } else {
        println!(
            "cargo:warning=libcanberra not found; chime-sys symbols will be \
             unresolved at link time. Set CANBERRA_LIB_DIR to override."
        );
    }
}

fn find_libcanberra() -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "/usr/lib/x86_64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
        "/usr/lib64",
        "/usr/lib",
        "/usr/local/lib",
        "/opt/homebrew/lib",
    ];

    for dir in CANDIDATES {
        for name in ["libcanberra.so", "libcanberra.dylib"] {
            if Path::new(dir).join(name).exists() {
                return Some((*dir).to_string());
            }
        }
    }
    None
}
