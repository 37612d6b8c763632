// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reading PDF input documents: password unlock, page enumeration, and the
// per-page resource/content/media-box lookups `pdf::writer` needs while
// composing output pages. Also carries the deep-object-clone helper used
// to copy a page (and everything it references) from one `lopdf::Document`
// into another during composition.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};

use crate::error::{PrepError, Result};

/// Open a PDF from disk, unlocking it with `password` if it is encrypted.
///
/// `password` comes from the job's `IPP_DOCUMENT_PASSWORD[n]` environment
/// variable (§4.2); its absence on an encrypted document surfaces as a
/// per-document prep error, not a whole-job failure — the caller decides
/// whether to skip the document or abort.
#[instrument(skip(password), fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<Path>, password: Option<&str>) -> Result<Document> {
    let path_ref = path.as_ref();
    let mut document = Document::load(path_ref).map_err(|err| {
        PrepError::BadInput(format!("failed to open {}: {err}", path_ref.display()))
    })?;
    unlock(&mut document, password)?;
    debug!(pages = document.get_pages().len(), "PDF opened");
    Ok(document)
}

/// Load a PDF already in memory — used for the intermediate per-input PDFs
/// `convert` builds for JPEG, PNG, and plain-text input documents.
pub fn from_bytes(data: &[u8]) -> Result<Document> {
    Document::load_mem(data)
        .map_err(|err| PrepError::BadInput(format!("failed to load PDF from memory: {err}")))
}

fn unlock(document: &mut Document, password: Option<&str>) -> Result<()> {
    if document.trailer.get(b"Encrypt").is_err() {
        return Ok(());
    }
    let password = password.ok_or_else(|| {
        PrepError::BadInput(
            "document is password-protected and no IPP_DOCUMENT_PASSWORD was supplied".into(),
        )
    })?;
    document
        .decrypt(password)
        .map_err(|err| PrepError::BadInput(format!("failed to unlock encrypted document: {err}")))
}

/// Page object IDs in 1-indexed page-number order.
pub fn page_ids(document: &Document) -> Vec<ObjectId> {
    let pages = document.get_pages();
    let mut numbers: Vec<u32> = pages.keys().copied().collect();
    numbers.sort_unstable();
    numbers.into_iter().map(|n| pages[&n]).collect()
}

pub fn page_count(document: &Document) -> usize {
    document.get_pages().len()
}

/// A page's `/Resources` dictionary, walking up `/Parent` if the page
/// itself doesn't carry one (the PDF inheritance rule for `/Resources`,
/// `/MediaBox`, and `/Rotate`).
pub fn resources_of(document: &Document, page_id: ObjectId) -> Result<Dictionary> {
    inherited_dict(document, page_id, b"Resources")
        .ok_or_else(|| PrepError::BadInput(format!("page {page_id:?} has no /Resources")))
}

/// A page's `/MediaBox` in PDF points, `[x1, y1, x2, y2]`, walking up
/// `/Parent` when a page omits it.
pub fn media_box_of(document: &Document, page_id: ObjectId) -> Option<[f64; 4]> {
    let value = inherited_lookup(document, page_id, b"MediaBox")?;
    let arr = value.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0_f64; 4];
    for (i, item) in arr.iter().enumerate() {
        out[i] = item
            .as_float()
            .map(|v| v as f64)
            .or_else(|_| item.as_i64().map(|v| v as f64))
            .ok()?;
    }
    Some(out)
}

/// The fully decoded, concatenated content stream for `page_id`.
pub fn content_of(document: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    document
        .get_page_content(page_id)
        .map_err(|err| PrepError::BadInput(format!("failed to read page content: {err}")))
}

fn inherited_dict(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Dictionary> {
    inherited_lookup(document, page_id, key)?.as_dict().ok().cloned()
}

fn inherited_lookup(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    loop {
        let dict = document.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return match value {
                Object::Reference(id) => document.get_object(*id).ok().cloned(),
                other => Some(other.clone()),
            };
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
}

/// Deep-clone `object` (read from `source`) into `target`, returning the
/// equivalent object with every reference re-pointed at a freshly added
/// object in `target`. `/Parent` keys are dropped — the caller re-patches
/// them to point at the target's own page tree, since a page's content and
/// resources never need to dereference `/Parent` themselves.
pub fn clone_object_into(source: &Document, target: &mut Document, object: &Object) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                new_dict.set(key.clone(), clone_object_into(source, target, value)?);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(items) => {
            let mut new_items = Vec::with_capacity(items.len());
            for item in items {
                new_items.push(clone_object_into(source, target, item)?);
            }
            Ok(Object::Array(new_items))
        }
        Object::Reference(ref_id) => match source.get_object(*ref_id) {
            Ok(referenced) => {
                let cloned = clone_object_into(source, target, referenced)?;
                Ok(Object::Reference(target.add_object(cloned)))
            }
            Err(err) => {
                warn!(?ref_id, %err, "dangling reference while cloning, substituting null");
                Ok(Object::Null)
            }
        },
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                new_dict.set(key.clone(), clone_object_into(source, target, value)?);
            }
            Ok(Object::Stream(lopdf::Stream::new(new_dict, stream.content.clone())))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_blank_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = doc.add_object(Dictionary::new());
        let content_id = doc.add_object(lopdf::Stream::new(Dictionary::new(), Vec::new()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        );
        page.set("Resources", Object::Reference(resources_id));
        page.set("Contents", Object::Reference(content_id));
        let page_id = doc.add_object(page);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        pages.set("Count", Object::Integer(1));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc.max_id = doc.objects.len() as u32;

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn from_bytes_reads_page_count_and_media_box() {
        let bytes = single_blank_page_pdf();
        let doc = from_bytes(&bytes).unwrap();
        assert_eq!(page_count(&doc), 1);
        let ids = page_ids(&doc);
        assert_eq!(ids.len(), 1);
        assert_eq!(media_box_of(&doc, ids[0]), Some([0.0, 0.0, 612.0, 792.0]));
    }

    #[test]
    fn unencrypted_document_needs_no_password() {
        let mut doc = from_bytes(&single_blank_page_pdf()).unwrap();
        assert!(unlock(&mut doc, None).is_ok());
    }
}
