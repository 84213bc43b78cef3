use num_complex::Complex32;

/*
Delay Line
==========

A ring buffer of complex samples: left channel in `re`, right in `im`, so
the reflection can rotate energy between channels with a single multiply.
`read(d)` returns what was written d samples before the next `write`.
Fractional delays interpolate linearly between the two neighbouring samples:

    buffer: ... [n-3] [n-2] [n-1] | write position n
                        ↑     ↑
                 read(1.4) = 0.6 × [n-1] + 0.4 × [n-2]

The buffer is allocated once, for the longest delay the engine can ever
ask for. Delays are clamped to [1, capacity − 2].
*/

#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<Complex32>,
    write_pos: usize,
}

impl DelayLine {
    /// Allocate a line able to hold `max_delay` samples of delay (at least one).
    pub fn new(max_delay: usize) -> Self {
        Self {
            buffer: vec![Complex32::new(0.0, 0.0); max_delay.max(1) + 2],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest delay `read` will honour.
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 2) as f32
    }

    #[inline]
    pub fn read(&self, delay: f32) -> Complex32 {
        let delay = delay.clamp(1.0, self.max_delay());
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let len = self.buffer.len();

        let newer = self.buffer[(self.write_pos + len - whole) % len];
        let older = self.buffer[(self.write_pos + len - whole - 1) % len];
        newer * (1.0 - frac) + older * frac
    }

    #[inline]
    pub fn write(&mut self, sample: Complex32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    pub fn clear(&mut self) {
        self.buffer.fill(Complex32::new(0.0, 0.0));
        self.write_pos = 0;
    }
}
