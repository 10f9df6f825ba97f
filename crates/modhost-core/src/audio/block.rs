//! Planar sample blocks shared between the platform layer and the engine
//!
//! An `AudioBlock` owns one pre-allocated lane per channel. The platform
//! sizes it once (channels × `MAX_BUFFER_SIZE`) and then only changes the
//! active frame count, so the real-time path never allocates.

/// Sample type used throughout the shell
pub type Sample = f32;

/// Fixed-capacity planar buffer of `channels` lanes
#[derive(Debug, Clone)]
pub struct AudioBlock {
    /// Channel-major storage: lane `c` lives at `[c * capacity .. c * capacity + frames]`
    data: Vec<Sample>,
    channels: usize,
    capacity: usize,
    frames: usize,
}

impl AudioBlock {
    /// Allocate a silent block (not RT-safe; call at setup time)
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            data: vec![0.0; channels * capacity],
            channels,
            capacity,
            frames: 0,
        }
    }

    /// Number of channel lanes
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Active frame count
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Maximum frame count without reallocation
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set the active frame count (RT-safe: clamps to capacity, no allocation)
    #[inline]
    pub fn set_frames(&mut self, frames: usize) {
        self.frames = frames.min(self.capacity);
    }

    /// Read one channel lane
    #[inline]
    pub fn channel(&self, channel: usize) -> &[Sample] {
        let start = channel * self.capacity;
        &self.data[start..start + self.frames]
    }

    /// Mutable access to one channel lane
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [Sample] {
        let start = channel * self.capacity;
        &mut self.data[start..start + self.frames]
    }

    /// Zero the active region of every lane
    pub fn fill_silence(&mut self) {
        for channel in 0..self.channels {
            self.channel_mut(channel).fill(0.0);
        }
    }

    /// Copy interleaved frames into the lanes
    ///
    /// Sets the active frame count to the number of whole frames read.
    /// Source channels beyond `self.channels()` are dropped; missing ones are silent.
    pub fn read_interleaved(&mut self, interleaved: &[Sample], source_channels: usize) {
        if source_channels == 0 {
            self.set_frames(0);
            return;
        }
        let frames = (interleaved.len() / source_channels).min(self.capacity);
        self.set_frames(frames);

        for channel in 0..self.channels {
            let start = channel * self.capacity;
            let lane = &mut self.data[start..start + frames];
            if channel < source_channels {
                for (i, sample) in lane.iter_mut().enumerate() {
                    *sample = interleaved[i * source_channels + channel];
                }
            } else {
                lane.fill(0.0);
            }
        }
    }

    /// Write the active frames into an interleaved buffer
    ///
    /// Destination channels without a matching lane are filled with silence.
    pub fn write_interleaved(&self, interleaved: &mut [Sample], dest_channels: usize) {
        if dest_channels == 0 {
            return;
        }
        for (i, frame) in interleaved
            .chunks_mut(dest_channels)
            .take(self.frames)
            .enumerate()
        {
            for (channel, out) in frame.iter_mut().enumerate() {
                *out = if channel < self.channels {
                    self.data[channel * self.capacity + i]
                } else {
                    0.0
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_frames_clamps_to_capacity() {
        let mut block = AudioBlock::new(2, 64);
        block.set_frames(128);
        assert_eq!(block.frames(), 64);
        assert_eq!(block.channel(1).len(), 64);
    }

    #[test]
    fn test_deinterleave_drops_extra_channels() {
        let mut block = AudioBlock::new(2, 16);
        // 3-channel source, 2 frames
        block.read_interleaved(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);

        assert_eq!(block.frames(), 2);
        assert_eq!(block.channel(0), &[1.0, 4.0]);
        assert_eq!(block.channel(1), &[2.0, 5.0]);
    }

    #[test]
    fn test_interleave_pads_missing_channels() {
        let mut block = AudioBlock::new(1, 16);
        block.set_frames(2);
        block.channel_mut(0).copy_from_slice(&[0.5, -0.5]);

        let mut out = [9.0; 6];
        block.write_interleaved(&mut out, 3);
        assert_eq!(out, [0.5, 0.0, 0.0, -0.5, 0.0, 0.0]);
    }
}
