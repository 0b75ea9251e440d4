use crate::channel::ChannelMode;
use crate::error::SortError;
use crate::order::SortOrder;

/// Topology and behaviour of one sorting chain.
///
/// `stages` counts the source too, so a chain with `stages = P` has `P - 1`
/// merge stages and sorts exactly `2^(P-1)` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub stages: usize,
    pub order: SortOrder,
    pub channel: ChannelMode,
}

impl PipelineConfig {
    pub fn new(stages: usize) -> Self {
        PipelineConfig {
            stages,
            order: SortOrder::default(),
            channel: ChannelMode::default(),
        }
    }

    /// Picks the stage count for an input of `len` elements.
    pub fn for_input_len(len: usize) -> Result<Self, SortError> {
        if len < 2 || !len.is_power_of_two() {
            return Err(SortError::Setup(format!(
                "input length {} is not a power of two of at least 2",
                len
            )));
        }
        Ok(Self::new(len.trailing_zeros() as usize + 1))
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_channel(mut self, channel: ChannelMode) -> Self {
        self.channel = channel;
        self
    }

    pub fn merge_stages(&self) -> usize {
        self.stages.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), SortError> {
        if self.stages < 2 {
            return Err(SortError::Setup(format!(
                "need a source and at least one merge stage, got {} stages",
                self.stages
            )));
        }
        if self.stages - 1 >= usize::BITS as usize {
            return Err(SortError::Setup(format!(
                "{} stages would sort more than usize::MAX elements",
                self.stages
            )));
        }
        Ok(())
    }

    /// Number of elements the chain must be fed.
    pub fn input_len(&self) -> Result<usize, SortError> {
        self.validate()?;
        Ok(1usize << (self.stages - 1))
    }

    pub fn check_input_len(&self, len: usize) -> Result<(), SortError> {
        let expected = self.input_len()?;
        if len != expected {
            return Err(SortError::Setup(format!(
                "{} stages sort exactly {} elements, got {}",
                self.stages, expected, len
            )));
        }
        Ok(())
    }
}
