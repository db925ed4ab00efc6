//! Native entry point. Drop an image on the window, press `N` for the next bundled
//! example, `Backspace` to clear and `Escape` to quit.
//!
//! ```bash
//! cargo run --release
//! ```

fn main() {
    #[cfg(not(target_family = "wasm"))]
    voxelish::run();
}
