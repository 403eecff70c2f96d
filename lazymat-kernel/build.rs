fn main() {
    println!("cargo:rerun-if-env-changed=OPENBLAS_LIB_DIR");

    #[cfg(feature = "blas")]
    {
        // CBLAS symbols come from a system OpenBLAS.
        match std::env::var("OPENBLAS_LIB_DIR") {
            Ok(dir) => println!("cargo:rustc-link-search=native={dir}"),
            Err(_) if cfg!(target_os = "macos") => {
                println!("cargo:rustc-link-search=native=/opt/homebrew/opt/openblas/lib");
                println!("cargo:rustc-link-search=native=/usr/local/opt/openblas/lib");
            }
            Err(_) => {}
        }
        println!("cargo:rustc-link-lib=openblas");
    }
}
