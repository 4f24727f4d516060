//! ID3 metadata on a [`LameEngine`]
//!
//! LAME builds the tags itself; these methods only hand it the values and
//! read the finished tags back. Set tags before the first write. By default
//! the engine writes the ID3v2 tag into the stream when its parameters are
//! initialized; turn that off with
//! [`set_write_id3tag_automatic`](LameEngine::set_write_id3tag_automatic)
//! to fetch the tag with [`id3v2_tag`](LameEngine::id3v2_tag) and place it
//! yourself.
//!
//! On a closed engine setters do nothing and readers return empty buffers.

use crate::engine::lame::{ffi, LameEngine};
use crate::error::TagError;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};

/// First buffer size tried when reading a tag back
pub const TAG_BUFFER_SIZE: usize = 32768;

type TagResult<T> = std::result::Result<T, TagError>;

fn c_text(value: &str) -> TagResult<CString> {
    CString::new(value).map_err(|_| TagError::InteriorNul)
}

impl LameEngine {
    fn with_handle(&self, call: impl FnOnce(*mut ffi::LameGlobalFlags)) {
        if let Some(gfp) = self.handle() {
            call(gfp);
        }
    }

    fn set_text(
        &mut self,
        value: &str,
        setter: unsafe extern "C" fn(*mut ffi::LameGlobalFlags, *const c_char),
    ) -> TagResult<()> {
        let text = c_text(value)?;
        self.with_handle(|gfp| unsafe { setter(gfp, text.as_ptr()) });
        Ok(())
    }

    /// Reset all tag fields
    pub fn init_id3_tag(&mut self) {
        self.with_handle(|gfp| unsafe { ffi::id3tag_init(gfp) });
    }

    /// Force a version 2 tag
    pub fn add_id3v2(&mut self) {
        self.with_handle(|gfp| unsafe { ffi::id3tag_add_v2(gfp) });
    }

    pub fn id3v1_only(&mut self) {
        self.with_handle(|gfp| unsafe { ffi::id3tag_v1_only(gfp) });
    }

    pub fn id3v2_only(&mut self) {
        self.with_handle(|gfp| unsafe { ffi::id3tag_v2_only(gfp) });
    }

    /// Pad the version 1 tag with spaces instead of NULs
    pub fn space_id3v1(&mut self) {
        self.with_handle(|gfp| unsafe { ffi::id3tag_space_v1(gfp) });
    }

    /// Pad the version 2 tag with 128 extra bytes
    pub fn pad_id3v2(&mut self) {
        self.with_handle(|gfp| unsafe { ffi::id3tag_pad_v2(gfp) });
    }

    /// Pad the version 2 tag with `bytes` extra bytes
    pub fn set_id3_pad(&mut self, bytes: usize) {
        self.with_handle(|gfp| unsafe { ffi::id3tag_set_pad(gfp, bytes) });
    }

    pub fn set_title(&mut self, title: &str) -> TagResult<()> {
        self.set_text(title, ffi::id3tag_set_title)
    }

    pub fn set_artist(&mut self, artist: &str) -> TagResult<()> {
        self.set_text(artist, ffi::id3tag_set_artist)
    }

    pub fn set_album(&mut self, album: &str) -> TagResult<()> {
        self.set_text(album, ffi::id3tag_set_album)
    }

    pub fn set_year(&mut self, year: &str) -> TagResult<()> {
        self.set_text(year, ffi::id3tag_set_year)
    }

    pub fn set_comment(&mut self, comment: &str) -> TagResult<()> {
        self.set_text(comment, ffi::id3tag_set_comment)
    }

    /// Track as text, e.g. `"3"` or `"3/12"`
    pub fn set_track(&mut self, track: &str) -> TagResult<()> {
        let text = c_text(track)?;
        let mut code: c_int = 0;
        self.with_handle(|gfp| code = unsafe { ffi::id3tag_set_track(gfp, text.as_ptr()) });
        match code {
            -1 => Err(TagError::TrackOutOfRange),
            _ => Ok(()),
        }
    }

    /// Genre by ID3v1 number or name.
    ///
    /// A name ID3v1 does not know is kept for version 2 and reported as
    /// [`TagError::GenreOther`].
    pub fn set_genre(&mut self, genre: &str) -> TagResult<()> {
        let text = c_text(genre)?;
        let mut code: c_int = 0;
        self.with_handle(|gfp| code = unsafe { ffi::id3tag_set_genre(gfp, text.as_ptr()) });
        match code {
            -1 => Err(TagError::GenreOutOfRange),
            -2 => Err(TagError::GenreOther),
            _ => Ok(()),
        }
    }

    /// Rendered version 1 tag
    pub fn id3v1_tag(&mut self) -> Vec<u8> {
        self.read_tag(|gfp, buffer, size| unsafe { ffi::lame_get_id3v1_tag(gfp, buffer, size) })
    }

    /// Rendered version 2 tag
    pub fn id3v2_tag(&mut self) -> Vec<u8> {
        self.read_tag(|gfp, buffer, size| unsafe { ffi::lame_get_id3v2_tag(gfp, buffer, size) })
    }

    // The reader returns the size it needs; retry once with that size when
    // the first buffer was too small.
    fn read_tag(
        &self,
        reader: impl Fn(*mut ffi::LameGlobalFlags, *mut u8, usize) -> usize,
    ) -> Vec<u8> {
        let Some(gfp) = self.handle() else {
            return Vec::new();
        };

        let mut buffer = vec![0u8; TAG_BUFFER_SIZE];
        let required = reader(gfp, buffer.as_mut_ptr(), buffer.len());
        if required < buffer.len() {
            buffer.truncate(required);
            return buffer;
        }

        buffer.resize(required, 0);
        let written = reader(gfp, buffer.as_mut_ptr(), buffer.len());
        buffer.truncate(written.min(required));
        buffer
    }

    /// Whether the engine writes the ID3v2 tag into the stream itself
    pub fn set_write_id3tag_automatic(&mut self, automatic: bool) {
        self.with_handle(|gfp| unsafe {
            ffi::lame_set_write_id3tag_automatic(gfp, automatic as c_int)
        });
    }

    pub fn write_id3tag_automatic(&self) -> bool {
        match self.handle() {
            Some(gfp) => unsafe { ffi::lame_get_write_id3tag_automatic(gfp) == 1 },
            None => false,
        }
    }

    /// Final LAME/Xing info frame, to replace the empty frame the engine
    /// put at the start of the audio data once encoding has finished.
    ///
    /// Empty when VBR tags are disabled.
    pub fn lametag_frame(&self) -> Vec<u8> {
        let Some(gfp) = self.handle() else {
            return Vec::new();
        };

        let mut buffer = vec![0u8; TAG_BUFFER_SIZE];
        let size = unsafe { ffi::lame_get_lametag_frame(gfp, buffer.as_mut_ptr(), buffer.len()) };
        buffer.truncate(size.min(TAG_BUFFER_SIZE));
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_nul_is_rejected() {
        assert_eq!(c_text("Radio\0Head").unwrap_err(), TagError::InteriorNul);
        assert_eq!(c_text("Radiohead").unwrap().as_bytes(), b"Radiohead");
    }
}
