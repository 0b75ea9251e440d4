use crate::channel::Outbound;
use crate::error::SortError;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

const READ_BUFFER_SIZE: usize = 8192;

/// Unsigned values stored as fixed-width little-endian bytes in input files.
pub trait FixedWidth: Copy + Ord + Send + Display + 'static {
    const WIDTH: usize;

    fn decode(bytes: &[u8]) -> Self;
    fn encode(self, out: &mut Vec<u8>);
    fn random(rng: &mut fastrand::Rng) -> Self;
}

macro_rules! fixed_width {
    ($($ty:ident),*) => {$(
        impl FixedWidth for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn decode(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            fn encode(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn random(rng: &mut fastrand::Rng) -> Self {
                rng.$ty(..)
            }
        }
    )*};
}

fixed_width!(u8, u16, u32, u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ElementWidth {
    #[default]
    #[value(name = "1")]
    U8,
    #[value(name = "2")]
    U16,
    #[value(name = "4")]
    U32,
    #[value(name = "8")]
    U64,
}

impl ElementWidth {
    pub fn bytes(self) -> usize {
        match self {
            ElementWidth::U8 => 1,
            ElementWidth::U16 => 2,
            ElementWidth::U32 => 4,
            ElementWidth::U64 => 8,
        }
    }
}

/// Reads every value of a raw input file.
pub fn read_elements<T: FixedWidth>(path: &Path) -> Result<Vec<T>, SortError> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if bytes.len() % T::WIDTH != 0 {
        return Err(SortError::Setup(format!(
            "{}: {} bytes is not a whole number of {}-byte values",
            path.display(),
            bytes.len(),
            T::WIDTH
        )));
    }
    let values: Vec<T> = bytes.chunks_exact(T::WIDTH).map(T::decode).collect();
    debug!(path = %path.display(), count = values.len(), "read input");
    Ok(values)
}

pub fn write_elements<T: FixedWidth>(path: &Path, values: &[T]) -> Result<(), SortError> {
    let mut bytes = Vec::with_capacity(values.len() * T::WIDTH);
    for value in values {
        value.encode(&mut bytes);
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

pub fn random_elements<T: FixedWidth>(count: usize, seed: Option<u64>) -> Vec<T> {
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    (0..count).map(|_| T::random(&mut rng)).collect()
}

/// Head of the chain: forwards the input unchanged, one element per message.
pub struct Source<T> {
    items: Vec<T>,
}

impl<T> Source<T> {
    pub fn new(items: Vec<T>) -> Self {
        Source { items }
    }

    pub fn run<S: Outbound<T>>(self, outbound: &mut S) -> Result<usize, SortError> {
        let mut sent = 0;
        for item in self.items {
            outbound.send(item)?;
            sent += 1;
        }
        info!(sent, "source finished");
        Ok(sent)
    }
}
