//! Chunked LZ4 block frames.
//!
//! A compressed region starts with a `u8` chunk count. The value 127
//! flags a single chunk whose compressed size is a `u64`; any other count
//! is followed by that many `(u32 compressedSize, bytes)` pairs. The
//! uncompressed chunks are concatenated in order.

use crate::util::{Error, Result};

/// Maximum uncompressed size of a single chunk.
pub const MAX_CHUNK_SIZE: usize = 127 * 1024 * 1024;

/// Chunk-count flag for the single 64-bit-sized chunk form.
const SINGLE_CHUNK_FLAG: u8 = 127;

/// Decompress a whole frame. `expected_size` is the declared uncompressed
/// size; frames that inflate to anything else are rejected.
pub fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    if expected_size > MAX_CHUNK_SIZE * 255 {
        return Err(Error::LimitExceeded {
            what: "uncompressed frame size",
            value: expected_size as u64,
            max: (MAX_CHUNK_SIZE * 255) as u64,
        });
    }
    if data.is_empty() {
        return Err(Error::invalid("empty LZ4 frame"));
    }

    let n_chunks = data[0];
    let mut body = &data[1..];
    let mut out = Vec::with_capacity(expected_size);

    if n_chunks == SINGLE_CHUNK_FLAG {
        if body.len() < 8 {
            return Err(Error::invalid("truncated LZ4 frame header"));
        }
        let size = u64::from_le_bytes(body[..8].try_into().unwrap());
        body = &body[8..];
        if size as usize != body.len() {
            return Err(Error::invalid(format!(
                "LZ4 chunk size {} disagrees with frame length {}",
                size,
                body.len()
            )));
        }
        decompress_chunk(body, expected_size, &mut out)?;
    } else {
        for _ in 0..n_chunks {
            if body.len() < 4 {
                return Err(Error::invalid("truncated LZ4 chunk header"));
            }
            let size = u32::from_le_bytes(body[..4].try_into().unwrap()) as usize;
            body = &body[4..];
            if size > body.len() {
                return Err(Error::invalid(format!(
                    "LZ4 chunk size {} exceeds remaining frame length {}",
                    size,
                    body.len()
                )));
            }
            let remaining = expected_size
                .checked_sub(out.len())
                .ok_or_else(|| Error::invalid("LZ4 frame inflates past declared size"))?;
            decompress_chunk(&body[..size], remaining, &mut out)?;
            body = &body[size..];
        }
        if !body.is_empty() {
            return Err(Error::invalid("trailing bytes after final LZ4 chunk"));
        }
    }

    if out.len() != expected_size {
        return Err(Error::invalid(format!(
            "LZ4 frame inflated to {} bytes, expected {}",
            out.len(),
            expected_size
        )));
    }
    Ok(out)
}

fn decompress_chunk(chunk: &[u8], max_size: usize, out: &mut Vec<u8>) -> Result<()> {
    let decoded = lz4_flex::block::decompress(chunk, max_size)
        .map_err(|e| Error::invalid(format!("LZ4 decode failed: {}", e)))?;
    out.extend_from_slice(&decoded);
    Ok(())
}

/// Decompress a frame whose exact inflated size is not declared, only
/// bounded. Used for compressed-integer blocks, where the worst-case
/// encoded size is computable from the element count.
pub fn decompress_unsized(data: &[u8], max_size: usize) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::invalid("empty LZ4 frame"));
    }
    let n_chunks = data[0];
    let mut body = &data[1..];
    let mut out = Vec::new();

    if n_chunks == SINGLE_CHUNK_FLAG {
        if body.len() < 8 {
            return Err(Error::invalid("truncated LZ4 frame header"));
        }
        let size = u64::from_le_bytes(body[..8].try_into().unwrap());
        body = &body[8..];
        if size as usize != body.len() {
            return Err(Error::invalid(format!(
                "LZ4 chunk size {} disagrees with frame length {}",
                size,
                body.len()
            )));
        }
        decompress_chunk(body, max_size, &mut out)?;
    } else {
        for _ in 0..n_chunks {
            if body.len() < 4 {
                return Err(Error::invalid("truncated LZ4 chunk header"));
            }
            let size = u32::from_le_bytes(body[..4].try_into().unwrap()) as usize;
            body = &body[4..];
            if size > body.len() {
                return Err(Error::invalid(format!(
                    "LZ4 chunk size {} exceeds remaining frame length {}",
                    size,
                    body.len()
                )));
            }
            let remaining = max_size
                .checked_sub(out.len())
                .ok_or_else(|| Error::invalid("LZ4 frame inflates past its bound"))?;
            decompress_chunk(&body[..size], remaining, &mut out)?;
            body = &body[size..];
        }
        if !body.is_empty() {
            return Err(Error::invalid("trailing bytes after final LZ4 chunk"));
        }
    }

    if out.len() > max_size {
        return Err(Error::invalid("LZ4 frame inflates past its bound"));
    }
    Ok(out)
}

/// Compress into a frame the decoder accepts. Chunks are split at
/// [`MAX_CHUNK_SIZE`]; inputs small enough use the multi-chunk form with a
/// single chunk. Used by the test fixture builders; the public API of this
/// crate never encodes.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let chunks: Vec<&[u8]> = if data.is_empty() {
        vec![data]
    } else {
        data.chunks(MAX_CHUNK_SIZE).collect()
    };
    assert!(chunks.len() < SINGLE_CHUNK_FLAG as usize);

    let mut out = vec![chunks.len() as u8];
    for chunk in chunks {
        let compressed = lz4_flex::block::compress(chunk);
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let original: Vec<u8> = b"the quick brown fox jumps over the lazy dog "
            .repeat(100);
        let frame = compress(&original);
        let restored = decompress(&frame, original.len()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_roundtrip_empty() {
        let frame = compress(&[]);
        let restored = decompress(&frame, 0).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_single_chunk_form() {
        let original = b"hello hello hello hello hello".to_vec();
        let compressed = lz4_flex::block::compress(&original);
        let mut frame = vec![SINGLE_CHUNK_FLAG];
        frame.extend_from_slice(&(compressed.len() as u64).to_le_bytes());
        frame.extend_from_slice(&compressed);

        let restored = decompress(&frame, original.len()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_size_disagreement_rejected() {
        let original = b"data data data data".to_vec();
        let frame = compress(&original);
        // Wrong expected size must be rejected, not silently accepted.
        assert!(decompress(&frame, original.len() + 1).is_err());
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let original = b"some compressible payload payload payload".to_vec();
        let frame = compress(&original);
        assert!(decompress(&frame[..frame.len() - 3], original.len()).is_err());
        assert!(decompress(&[], 0).is_err());
    }

    #[test]
    fn test_chunk_size_overrun_rejected() {
        // Declared chunk size larger than the remaining frame bytes.
        let mut frame = vec![1u8];
        frame.extend_from_slice(&(1000u32).to_le_bytes());
        frame.extend_from_slice(&[0u8; 10]);
        assert!(decompress(&frame, 10).is_err());
    }
}
