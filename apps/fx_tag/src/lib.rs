//! Appends a fixed tag to its argument, writing into the slack after the input.

const TAG: &[u8] = b" <-- Tagged from Wasm";

#[no_mangle]
pub extern "C" fn alloc(size: i32) -> i32 {
    let mut buf = Vec::<u8>::with_capacity(size.max(0) as usize);
    let ptr = buf.as_mut_ptr();
    std::mem::forget(buf);
    ptr as i32
}

#[no_mangle]
pub extern "C" fn fx(ptr: i32, len: i32) -> i32 {
    let tail = unsafe { std::slice::from_raw_parts_mut((ptr + len) as *mut u8, TAG.len()) };
    tail.copy_from_slice(TAG);
    len + TAG.len() as i32
}
