//! UTF-16 to UTF-8 transcoding with a fixed byte budget
//!
//! Tokens are scanned as UTF-16 code units and handed to listeners as UTF-8.
//! The destination has a byte capacity that includes a terminator slot, so at
//! most `capacity - 1` bytes of text are ever produced. Text that does not fit
//! is an error; the destination is never silently truncated.

use thiserror::Error;

/// Failures while transcoding a token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The encoded text needs more bytes than the destination allows
    #[error("encoded text exceeds {capacity} byte buffer")]
    Capacity { capacity: usize },

    /// A surrogate code unit without its partner
    #[error("unpaired surrogate {unit:#06x} at unit {index}")]
    UnpairedSurrogate { unit: u16, index: usize },
}

/// Transcodes `src` into `dst`, returning the number of bytes written.
///
/// Decoding stops at the first zero unit, if any. On failure `dst` is left
/// empty. A zero `capacity` has no room for the terminator and always fails.
pub fn transcode(src: &[u16], dst: &mut String, capacity: usize) -> Result<usize, CodecError> {
    dst.clear();
    if capacity == 0 {
        return Err(CodecError::Capacity { capacity });
    }

    let available = capacity - 1;
    let units = src.iter().copied().take_while(|&unit| unit != 0);
    let mut index = 0;

    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(c) => {
                if dst.len() + c.len_utf8() > available {
                    dst.clear();
                    return Err(CodecError::Capacity { capacity });
                }
                dst.push(c);
                index += c.len_utf16();
            }
            Err(err) => {
                dst.clear();
                return Err(CodecError::UnpairedSurrogate {
                    unit: err.unpaired_surrogate(),
                    index,
                });
            }
        }
    }

    Ok(dst.len())
}
