//! Adds two little-endian `i32` arguments and returns the 4-byte sum.

#[no_mangle]
pub extern "C" fn alloc(size: i32) -> i32 {
    let mut buf = Vec::<u8>::with_capacity(size.max(0) as usize);
    let ptr = buf.as_mut_ptr();
    std::mem::forget(buf);
    ptr as i32
}

fn read_i32(ptr: i32, len: i32) -> i32 {
    let mut raw = [0u8; 4];
    let n = len.clamp(0, 4) as usize;
    let bytes = unsafe { std::slice::from_raw_parts(ptr as *const u8, n) };
    raw[..n].copy_from_slice(bytes);
    i32::from_le_bytes(raw)
}

#[no_mangle]
pub extern "C" fn fx(ptr: i32, a_len: i32, b_len: i32) -> i32 {
    let a = read_i32(ptr, a_len);
    let b = read_i32(ptr + a_len, b_len);
    let sum = a.wrapping_add(b).to_le_bytes();
    // The slack after the input always has room for 4 bytes.
    let out = unsafe { std::slice::from_raw_parts_mut(ptr as *mut u8, sum.len()) };
    out.copy_from_slice(&sum);
    sum.len() as i32
}
