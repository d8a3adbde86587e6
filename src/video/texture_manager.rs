//! Texture cache and context-loss recovery.
//!
//! Image files are loaded once and shared; a second request for the same
//! path returns the cached texture. The cache holds weak references, so a
//! texture's pixel memory is released as soon as the last user drops it.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Weak};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::error::{VideoError, VideoResult};
use crate::video::backend::SharedBackend;
use crate::video::texture::{
    next_power_of_two, ImageTexture, SavedTexture, Texture, TextureId,
};

/// A strong reference to either kind of managed texture.
enum TextureRef {
    Image(Arc<ImageTexture>),
    Plain(Arc<Texture>),
}

impl TextureRef {
    fn texture(&self) -> &Texture {
        match self {
            Self::Image(image) => image,
            Self::Plain(texture) => texture,
        }
    }
}

struct SavedEntry {
    texture: TextureRef,
    saved: SavedTexture,
}

pub struct TextureManager {
    backend: SharedBackend,
    cache: Mutex<HashMap<PathBuf, Weak<ImageTexture>>>,
    /// Non-file textures (lightmaps) that still need save/reload handling.
    extra: Mutex<Vec<Weak<Texture>>>,
    saved: Mutex<Vec<SavedEntry>>,
}

/// Collapse `.` and `..` components so equivalent spellings of a path hit
/// the same cache entry.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component.as_os_str());
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

impl TextureManager {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
            extra: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Load an image file as a texture, or return the cached one.
    pub fn get(&self, path: &Path) -> VideoResult<Arc<ImageTexture>> {
        let key = normalize(path);
        let mut cache = self.cache.lock();
        if let Some(existing) = cache.get(&key).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        let texture = Arc::new(self.load(&key)?);
        cache.insert(key, Arc::downgrade(&texture));
        Ok(texture)
    }

    /// Drop the cache entry for a path. Existing users keep their texture
    /// alive; the next `get` reloads from disk.
    pub fn release(&self, path: &Path) {
        self.cache.lock().remove(&normalize(path));
    }

    fn load(&self, path: &Path) -> VideoResult<ImageTexture> {
        let image = image::open(path).map_err(|err| VideoError::ImageLoad {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        match image.color() {
            image::ColorType::Rgb8 | image::ColorType::Rgba8 => {}
            other => {
                return Err(VideoError::UnsupportedDepth {
                    path: path.to_path_buf(),
                    depth: other.bits_per_pixel(),
                });
            }
        }

        let rgba = image.to_rgba8();
        let (image_width, image_height) = rgba.dimensions();
        let padded_width = next_power_of_two(image_width);
        let padded_height = next_power_of_two(image_height);

        // Copy rows into a power-of-two buffer; the padding stays
        // transparent black and is never sampled.
        let mut pixels = vec![0u8; (padded_width * padded_height * 4) as usize];
        let src_row = (image_width * 4) as usize;
        let dst_row = (padded_width * 4) as usize;
        let raw = rgba.as_raw();
        for y in 0..image_height as usize {
            pixels[y * dst_row..y * dst_row + src_row]
                .copy_from_slice(&raw[y * src_row..(y + 1) * src_row]);
        }

        let texture = Texture::from_pixels(&self.backend, &pixels, padded_width, padded_height)?;
        debug!(
            "loaded {} ({}x{} in a {}x{} texture)",
            path.display(),
            image_width,
            image_height,
            padded_width,
            padded_height
        );
        Ok(ImageTexture::new(
            texture,
            path.to_path_buf(),
            image_width,
            image_height,
        ))
    }

    /// Track a non-file texture so mode changes preserve it.
    pub fn register_texture(&self, texture: &Arc<Texture>) {
        self.extra.lock().push(Arc::downgrade(texture));
    }

    pub fn remove_texture(&self, texture: &Arc<Texture>) {
        self.extra
            .lock()
            .retain(|weak| match weak.upgrade() {
                Some(alive) => !Arc::ptr_eq(&alive, texture),
                None => false,
            });
    }

    fn live_textures(&self) -> Vec<TextureRef> {
        let mut textures = Vec::new();
        for weak in self.cache.lock().values() {
            if let Some(image) = weak.upgrade() {
                textures.push(TextureRef::Image(image));
            }
        }
        let mut extra = self.extra.lock();
        extra.retain(|weak| weak.upgrade().is_some());
        for weak in extra.iter() {
            if let Some(texture) = weak.upgrade() {
                textures.push(TextureRef::Plain(texture));
            }
        }
        textures
    }

    /// Download every live texture into host memory and release its
    /// backend handle. Must run before a mode change. Safe to call twice;
    /// textures already saved are skipped.
    ///
    /// Texture references are never dropped while the backend lock is
    /// held: freeing a texture re-locks the backend.
    pub fn save_textures(&self) -> VideoResult<()> {
        let entries = self.live_textures();
        let mut snapshots = Vec::with_capacity(entries.len());
        let mut result = Ok(());
        {
            let mut backend = self.backend.lock();
            for entry in &entries {
                let handle = entry.texture().handle();
                if handle.is_none() {
                    snapshots.push(None);
                    continue;
                }
                match backend.download_texture(handle) {
                    Ok(snapshot) => {
                        backend.destroy_texture(handle);
                        entry.texture().set_handle(TextureId::NONE);
                        snapshots.push(Some(snapshot));
                    }
                    Err(err) => {
                        result = Err(err);
                        break;
                    }
                }
            }
        }

        let mut saved = self.saved.lock();
        for (entry, snapshot) in entries.into_iter().zip(snapshots) {
            if let Some(snapshot) = snapshot {
                saved.push(SavedEntry {
                    texture: entry,
                    saved: snapshot,
                });
            }
        }
        result?;
        info!("saved {} textures for mode change", saved.len());
        Ok(())
    }

    /// Recreate every saved texture after a mode change.
    pub fn reload_textures(&self) -> VideoResult<()> {
        let entries: Vec<SavedEntry> = std::mem::take(&mut *self.saved.lock());
        let count = entries.len();
        let mut result = Ok(());
        {
            let mut backend = self.backend.lock();
            for entry in &entries {
                match backend.restore_texture(&entry.saved) {
                    Ok(handle) => entry.texture.texture().set_handle(handle),
                    Err(err) => {
                        warn!(
                            "failed to restore a {}x{} texture: {err}",
                            entry.saved.width, entry.saved.height
                        );
                        result = Err(err);
                        break;
                    }
                }
            }
        }
        // Entries may hold the last reference to their texture; they are
        // freed only after the backend lock is gone.
        drop(entries);
        result?;
        info!("reloaded {count} textures");
        Ok(())
    }

    /// Number of cached image textures still alive. Diagnostic.
    pub fn cached_count(&self) -> usize {
        self.cache
            .lock()
            .values()
            .filter(|weak| weak.upgrade().is_some())
            .count()
    }
}
