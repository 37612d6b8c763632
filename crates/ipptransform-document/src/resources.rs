// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resource-name remap during page composition (Design Notes §9): merging
// several input pages' `/Resources` into one N-up output page can collide
// names across categories (`ColorSpace`, `ExtGState`, `Font`, `Pattern`,
// `ProcSet`, `Properties`, `Shading`, `XObject`). On collision the Nth
// cell's names are prefixed `a+n` (`a`, `b`, ...) and its content stream is
// rewritten to match.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Object};

/// The resource dictionary categories merged during N-up composition.
pub const RESOURCE_CATEGORIES: &[&[u8]] = &[
    b"ColorSpace",
    b"ExtGState",
    b"Font",
    b"Pattern",
    b"ProcSet",
    b"Properties",
    b"Shading",
    b"XObject",
];

/// Per-cell remap: old name -> new name, built while merging one cell's
/// `/Resources` into the shared output dictionary.
pub type Remap = BTreeMap<Vec<u8>, Vec<u8>>;

/// `a`, `b`, `c`, ... `z`, `aa`, `ab`, ... prefix used for the Nth
/// colliding cell (0-indexed).
fn cell_prefix(cell_index: usize) -> String {
    let mut n = cell_index;
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    letters.into_iter().rev().collect()
}

/// Merge `cell_resources` into `merged`, renaming any entry whose name
/// already exists in `merged` under the same category. Returns the remap of
/// old -> new names for names that had to change (possibly empty).
pub fn merge_resources(merged: &mut Dictionary, cell_resources: &Dictionary, cell_index: usize) -> Remap {
    let mut remap = Remap::new();

    for &category in RESOURCE_CATEGORIES {
        let Ok(Object::Dictionary(cell_dict)) = cell_resources.get(category) else {
            continue;
        };

        let merged_category = match merged.get_mut(category) {
            Ok(Object::Dictionary(d)) => d,
            _ => {
                merged.set(category, Object::Dictionary(Dictionary::new()));
                match merged.get_mut(category) {
                    Ok(Object::Dictionary(d)) => d,
                    _ => unreachable!(),
                }
            }
        };

        for (name, value) in cell_dict.iter() {
            if !merged_category.has(name) {
                merged_category.set(name.clone(), value.clone());
                continue;
            }

            let prefix = cell_prefix(cell_index);
            let new_name = format!("{prefix}{}", String::from_utf8_lossy(name)).into_bytes();
            merged_category.set(new_name.clone(), value.clone());
            remap.insert(name.clone(), new_name);
        }
    }

    remap
}

/// Rewrite every `/Name` token in a content stream according to `remap`,
/// honoring `#HH` hex escapes within names and skipping string literals
/// (balanced parentheses with `\`-escape) so a literal `(...)` payload that
/// happens to contain a `/` is never mistaken for a name token.
pub fn rewrite_content_stream(content: &[u8], remap: &Remap) -> Vec<u8> {
    if remap.is_empty() {
        return content.to_vec();
    }

    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    let len = content.len();

    while i < len {
        let b = content[i];
        match b {
            b'(' => {
                let start = i;
                i += 1;
                let mut depth = 1usize;
                while i < len && depth > 0 {
                    match content[i] {
                        b'\\' => i += 2,
                        b'(' => {
                            depth += 1;
                            i += 1;
                        }
                        b')' => {
                            depth -= 1;
                            i += 1;
                        }
                        _ => i += 1,
                    }
                }
                out.extend_from_slice(&content[start..i.min(len)]);
            }
            b'/' => {
                let start = i;
                i += 1;
                let (decoded, consumed) = read_name(&content[i..]);
                i += consumed;
                match remap.get(&decoded) {
                    Some(new_name) => {
                        out.push(b'/');
                        out.extend_from_slice(new_name);
                    }
                    None => out.extend_from_slice(&content[start..i]),
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

/// Read a PDF name's raw bytes (decoding `#HH` escapes), returning the
/// decoded name and the number of source bytes consumed (not including the
/// leading `/`).
fn read_name(rest: &[u8]) -> (Vec<u8>, usize) {
    let mut decoded = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b @ (b'\0'..=b' ' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%') => {
                let _ = b;
                break;
            }
            b'#' if i + 2 < rest.len()
                && rest[i + 1].is_ascii_hexdigit()
                && rest[i + 2].is_ascii_hexdigit() =>
            {
                let hex = std::str::from_utf8(&rest[i + 1..i + 3]).unwrap_or("00");
                let byte = u8::from_str_radix(hex, 16).unwrap_or(0);
                decoded.push(byte);
                i += 3;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }
    (decoded, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_prefixes_follow_excel_column_style() {
        assert_eq!(cell_prefix(0), "a");
        assert_eq!(cell_prefix(1), "b");
        assert_eq!(cell_prefix(25), "z");
        assert_eq!(cell_prefix(26), "aa");
    }

    #[test]
    fn rewrite_skips_names_inside_string_literals() {
        let content = b"(/Font1 looks like a name) /Font1 Do";
        let mut remap = Remap::new();
        remap.insert(b"Font1".to_vec(), b"aFont1".to_vec());
        let out = rewrite_content_stream(content, &remap);
        assert_eq!(
            out,
            b"(/Font1 looks like a name) /aFont1 Do".to_vec()
        );
    }

    #[test]
    fn rewrite_handles_hash_escapes_in_names() {
        let content = b"/Im#61ge1 Do"; // #61 = 'a' -> "Image1"
        let mut remap = Remap::new();
        remap.insert(b"Image1".to_vec(), b"bImage1".to_vec());
        let out = rewrite_content_stream(content, &remap);
        assert_eq!(out, b"/bImage1 Do".to_vec());
    }

    #[test]
    fn rewrite_handles_escaped_parens_in_literal() {
        let content = br"(a \) literal /Name inside) /Name Do";
        let mut remap = Remap::new();
        remap.insert(b"Name".to_vec(), b"aName".to_vec());
        let out = rewrite_content_stream(content, &remap);
        assert_eq!(out, br"(a \) literal /Name inside) /aName Do".to_vec());
    }

    #[test]
    fn merge_resources_renames_on_collision() {
        let mut merged = Dictionary::new();
        let mut font_dict = Dictionary::new();
        font_dict.set("F1", Object::Integer(1));
        merged.set("Font", Object::Dictionary(font_dict));

        let mut cell_font_dict = Dictionary::new();
        cell_font_dict.set("F1", Object::Integer(2));
        let mut cell_resources = Dictionary::new();
        cell_resources.set("Font", Object::Dictionary(cell_font_dict));

        let remap = merge_resources(&mut merged, &cell_resources, 1);
        assert_eq!(remap.get(&b"F1".to_vec()), Some(&b"bF1".to_vec()));
    }
}
