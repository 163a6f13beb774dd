// build.rs

fn main() {
    // Only the X11 display driver links against native libraries.
    if std::env::var_os("CARGO_FEATURE_X11").is_none() {
        return;
    }

    let libraries = ["x11", "xft", "freetype2"];

    let mut pkg_config_success = true;

    for lib in &libraries {
        if pkg_config::probe_library(lib).is_err() {
            eprintln!(
                "pkg-config failed for library '{}'. Falling back to manual linking.",
                lib
            );
            pkg_config_success = false;
            break;
        }
    }

    if !pkg_config_success {
        // Assumes the libraries live in a standard search path.
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-lib=Xft");
        println!("cargo:rustc-link-lib=freetype");
        println!("cargo:rustc-link-search=/usr/lib");
        eprintln!(
            "Manual linking flags applied. Ensure X11, Xft and Freetype development libraries are installed."
        );
    } else {
        eprintln!("pkg-config successfully found libraries. Linking configured automatically.");
    }
}
