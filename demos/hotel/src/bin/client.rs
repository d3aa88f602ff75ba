#![allow(missing_docs)]

fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        if let Err(error) = hotel::hydrate() {
            concierge::web_sys::console::error_1(&error);
        }
    }
}
