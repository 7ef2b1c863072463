//! # Preview Resources
//!
//! A single-file upload field that accepts images may show a preview of the
//! selected image. The preview is a transient resource allocated by the
//! environment; the [`PreviewRegistry`] owns every live handle and releases
//! it when the file is replaced, when the field is cleared, on reset, and
//! when the registry is dropped.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use formflow_core::{FieldValue, FileRef, FormSchema, QuestionId, QuestionSpec};
use parking_lot::Mutex;
use uuid::Uuid;

/// A live preview of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    /// Allocator-assigned identifier.
    pub id: String,
    /// The file the preview was made from.
    pub file: FileRef,
}

/// Allocates and releases preview handles.
pub trait PreviewAllocator: Send + Sync {
    /// Allocate a preview for `file`.
    fn allocate(&self, file: &FileRef) -> PreviewHandle;

    /// Release a handle previously returned by `allocate`.
    fn release(&self, handle: &PreviewHandle);
}

/// Allocator issuing `preview-<uuid>` ids and tracking which are live.
#[derive(Debug, Default)]
pub struct TrackingPreviewAllocator {
    live: Mutex<HashSet<String>>,
    allocated: Mutex<usize>,
}

impl TrackingPreviewAllocator {
    /// A new allocator with no live handles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles allocated and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Total handles ever allocated.
    pub fn allocated_count(&self) -> usize {
        *self.allocated.lock()
    }
}

impl PreviewAllocator for TrackingPreviewAllocator {
    fn allocate(&self, file: &FileRef) -> PreviewHandle {
        let id = format!("preview-{}", Uuid::new_v4());
        self.live.lock().insert(id.clone());
        *self.allocated.lock() += 1;
        PreviewHandle {
            id,
            file: file.clone(),
        }
    }

    fn release(&self, handle: &PreviewHandle) {
        if !self.live.lock().remove(&handle.id) {
            tracing::warn!(handle = %handle.id, "release of unknown preview handle");
        }
    }
}

/// Owns at most one live preview per eligible field.
pub struct PreviewRegistry {
    allocator: Arc<dyn PreviewAllocator>,
    handles: BTreeMap<QuestionId, PreviewHandle>,
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}

/// Whether the question with `id` can show an image preview.
pub fn previews_images(schema: &FormSchema, id: &str) -> bool {
    matches!(
        schema.question(id).map(|q| &q.spec),
        Some(QuestionSpec::FileUpload(spec)) if !spec.multiple && spec.accept.admits_images()
    )
}

impl PreviewRegistry {
    /// An empty registry backed by `allocator`.
    pub fn new(allocator: Arc<dyn PreviewAllocator>) -> Self {
        Self {
            allocator,
            handles: BTreeMap::new(),
        }
    }

    /// The live preview for a field.
    pub fn handle(&self, id: &str) -> Option<&PreviewHandle> {
        self.handles.get(id)
    }

    /// Number of live previews.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no preview is live.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Bring the preview of field `id` in line with its new value.
    ///
    /// An image file on an eligible field gets a preview, replacing and
    /// releasing any earlier one. Any other value releases the field's
    /// preview. The same file keeps its existing handle.
    pub fn sync(&mut self, schema: &FormSchema, id: &QuestionId, value: &FieldValue) {
        let wanted = match value {
            FieldValue::File(file) if file.is_image() && previews_images(schema, id.as_str()) => {
                Some(file)
            }
            _ => None,
        };
        match wanted {
            Some(file) => {
                if self.handles.get(id).is_some_and(|h| &h.file == file) {
                    return;
                }
                let handle = self.allocator.allocate(file);
                tracing::debug!(field = %id, handle = %handle.id, "preview allocated");
                if let Some(old) = self.handles.insert(id.clone(), handle) {
                    self.allocator.release(&old);
                }
            }
            None => self.release(id.as_str()),
        }
    }

    /// Release the preview of one field, if any.
    pub fn release(&mut self, id: &str) {
        if let Some(handle) = self.handles.remove(id) {
            tracing::debug!(field = id, handle = %handle.id, "preview released");
            self.allocator.release(&handle);
        }
    }

    /// Release every live preview.
    pub fn release_all(&mut self) {
        for (_, handle) in std::mem::take(&mut self.handles) {
            self.allocator.release(&handle);
        }
    }
}

impl Drop for PreviewRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_core::{AcceptList, FileUploadSpec, Question};

    fn upload(accept: &str, multiple: bool) -> QuestionSpec {
        QuestionSpec::FileUpload(FileUploadSpec {
            accept: AcceptList::parse(accept).unwrap(),
            max_size: 2.0,
            multiple,
        })
    }

    fn schema() -> FormSchema {
        FormSchema::from_questions(vec![
            Question::new("avatar", "Avatar", false, upload("image/*", false)),
            Question::new("gallery", "Gallery", false, upload("image/*", true)),
            Question::new("cv", "CV", false, upload(".pdf", false)),
        ])
    }

    fn png(name: &str) -> FieldValue {
        FieldValue::File(FileRef::new(name, 100, "image/png"))
    }

    fn setup() -> (Arc<TrackingPreviewAllocator>, PreviewRegistry) {
        let allocator = Arc::new(TrackingPreviewAllocator::new());
        let registry = PreviewRegistry::new(allocator.clone());
        (allocator, registry)
    }

    #[test]
    fn test_superseded_preview_is_released() {
        let (alloc, mut reg) = setup();
        let s = schema();
        let avatar = QuestionId::new("avatar");
        reg.sync(&s, &avatar, &png("a.png"));
        let first = reg.handle("avatar").unwrap().id.clone();
        reg.sync(&s, &avatar, &png("b.png"));
        assert_ne!(reg.handle("avatar").unwrap().id, first);
        assert_eq!(alloc.live_count(), 1);
        assert_eq!(alloc.allocated_count(), 2);
    }

    #[test]
    fn test_same_file_keeps_handle() {
        let (alloc, mut reg) = setup();
        let s = schema();
        let avatar = QuestionId::new("avatar");
        reg.sync(&s, &avatar, &png("a.png"));
        reg.sync(&s, &avatar, &png("a.png"));
        assert_eq!(alloc.allocated_count(), 1);
    }

    #[test]
    fn test_clearing_field_releases_preview() {
        let (alloc, mut reg) = setup();
        let s = schema();
        let avatar = QuestionId::new("avatar");
        reg.sync(&s, &avatar, &png("a.png"));
        reg.sync(&s, &avatar, &FieldValue::Empty);
        assert!(reg.is_empty());
        assert_eq!(alloc.live_count(), 0);
    }

    #[test]
    fn test_only_single_image_fields_get_previews() {
        let (alloc, mut reg) = setup();
        let s = schema();
        reg.sync(&s, &QuestionId::new("gallery"), &png("a.png"));
        reg.sync(&s, &QuestionId::new("cv"), &png("a.png"));
        reg.sync(
            &s,
            &QuestionId::new("avatar"),
            &FieldValue::File(FileRef::new("notes.txt", 1, "text/plain")),
        );
        assert_eq!(alloc.allocated_count(), 0);
    }

    #[test]
    fn test_drop_releases_everything() {
        let alloc = Arc::new(TrackingPreviewAllocator::new());
        {
            let mut reg = PreviewRegistry::new(alloc.clone());
            reg.sync(&schema(), &QuestionId::new("avatar"), &png("a.png"));
            assert_eq!(alloc.live_count(), 1);
        }
        assert_eq!(alloc.live_count(), 0);
    }
}
