//! `cargo run -p bioauth-uniffi --features bindgen --bin uniffi-bindgen -- \
//!     generate --library <path/to/libbioauth_ffi.so> --language kotlin \
//!     --out-dir <dir>`

fn main() {
    uniffi::uniffi_bindgen_main()
}
