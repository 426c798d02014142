//! Text encoders
//!
//! The query parser only works when queries are embedded by the same encoder
//! that produced the knowledge index, so every encoder carries an identity
//! that is recorded in the index and checked once at startup.

use crate::{Error, KnowledgeIndex, Result, Vector};
use std::collections::HashSet;

/// Default dimension for the hashing encoder
pub const DEFAULT_ENCODER_DIM: usize = 384;

/// Maps text to a fixed-dimension vector
pub trait Encoder: Send + Sync {
    /// Stable identity recorded alongside every index built with this encoder
    fn id(&self) -> &str;

    /// Output dimension
    fn dim(&self) -> usize;

    /// Embed a single text. Empty text is embedded as-is.
    fn encode(&self, text: &str) -> Vector;

    /// Embed a batch of texts
    fn encode_batch(&self, texts: &[String]) -> Vec<Vector> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

/// Check that an encoder can be used to query an index
pub fn validate_encoder(encoder: &dyn Encoder, index: &KnowledgeIndex) -> Result<()> {
    if encoder.id() != index.encoder_id() {
        return Err(Error::EncoderMismatch {
            index: index.encoder_id().to_string(),
            encoder: encoder.id().to_string(),
        });
    }
    if encoder.dim() != index.dim() {
        return Err(Error::InvalidDimension {
            expected: index.dim(),
            actual: encoder.dim(),
        });
    }
    Ok(())
}

/// Feature-hashing encoder over character trigrams and words.
///
/// Buckets come from 64-bit FNV-1a over the UTF-8 bytes, so the embedding
/// is fixed by the algorithm and not by the toolchain that built it. Texts
/// sharing words or spelling fragments land close to each other in L2
/// distance.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    id: String,
    dim: usize,
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("encoder dimension must be positive".into()));
        }
        Ok(Self {
            id: format!("hashing-trigram-fnv1a-v2-{}", dim),
            dim,
        })
    }
}

impl Encoder for HashingEncoder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, text: &str) -> Vector {
        let mut components = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        for trigram in trigrams(&normalized) {
            components[bucket(&trigram, self.dim)] += 1.0;
        }

        // Words contribute more than fragments
        for word in normalized.split_whitespace() {
            components[bucket(word, self.dim)] += 2.0;
        }

        let mut vector = Vector::new(components);
        vector.normalize();
        vector
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

fn bucket(value: &str, dim: usize) -> usize {
    (fnv1a(value.as_bytes()) % dim as u64) as usize
}

/// Character trigrams of a space-padded string
pub(crate) fn trigrams(s: &str) -> HashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();

    chars.windows(3).map(|w| w.iter().collect::<String>()).collect()
}
