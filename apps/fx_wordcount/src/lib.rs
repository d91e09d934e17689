//! Counts words in its argument and answers with one `word count` line per
//! distinct word, sorted by word.
//!
//! The output has to fit the allocation the host made for the call, which is
//! the input length plus at least 100 bytes. Lines that would overflow it are
//! dropped and a final `...` line marks the cut.

use std::collections::BTreeMap;

const MIN_SLACK: usize = 100;
const ELLIPSIS: &[u8] = b"...\n";

#[no_mangle]
pub extern "C" fn alloc(size: i32) -> i32 {
    let mut buf = Vec::<u8>::with_capacity(size.max(0) as usize);
    let ptr = buf.as_mut_ptr();
    std::mem::forget(buf);
    ptr as i32
}

fn count(text: &str) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }
    counts
}

fn render(counts: &BTreeMap<String, u32>, budget: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for (word, n) in counts {
        let line = format!("{} {}\n", word, n);
        if out.len() + line.len() + ELLIPSIS.len() > budget {
            out.extend_from_slice(ELLIPSIS);
            break;
        }
        out.extend_from_slice(line.as_bytes());
    }
    out
}

#[no_mangle]
pub extern "C" fn fx(ptr: i32, len: i32) -> i32 {
    let len = len.max(0) as usize;
    let input = unsafe { std::slice::from_raw_parts(ptr as *const u8, len) };
    let text = String::from_utf8_lossy(input);

    let out = render(&count(&text), len + MIN_SLACK);
    let dest = unsafe { std::slice::from_raw_parts_mut(ptr as *mut u8, out.len()) };
    dest.copy_from_slice(&out);
    out.len() as i32
}
