//! Returns its single argument unchanged.
//!
//! Build with `cargo build --release --target wasm32-unknown-unknown` and
//! deploy the resulting `fx_echo.wasm` with entrypoint `fx`.

/// Hands out `size` bytes that are never freed; the instance is discarded after one call.
#[no_mangle]
pub extern "C" fn alloc(size: i32) -> i32 {
    let mut buf = Vec::<u8>::with_capacity(size.max(0) as usize);
    let ptr = buf.as_mut_ptr();
    std::mem::forget(buf);
    ptr as i32
}

/// The input already sits at `ptr`, so the output is the same range.
#[no_mangle]
pub extern "C" fn fx(_ptr: i32, len: i32) -> i32 {
    len
}
