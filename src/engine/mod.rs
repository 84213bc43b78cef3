// Purpose: the seam between hosts and resonators.
// Engines implement `StereoEngine`; hosts wrap them in `Powered` for
// click-free on/off switching.

pub mod powered;

pub use powered::Powered;

/// Core trait for per-sample stereo engines.
///
/// One call to [`render_frame`](StereoEngine::render_frame) advances the
/// simulation exactly one sample. Implementations must not allocate, lock or
/// block in any of these methods.
pub trait StereoEngine: Send {
    /// Inform the engine of a new sample rate. Rare, control-rate.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Advance one sample and return the stereo output.
    fn render_frame(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Return the simulation to rest without touching configured parameters.
    fn quiet(&mut self);

    /// Compression currently applied by the engine's limiter, in dB.
    ///
    /// Default implementation reports no limiting.
    fn agc_distortion(&self) -> f32 {
        0.0
    }
}

/// Allow boxed engines to be used as engines (for dynamic dispatch)
impl StereoEngine for Box<dyn StereoEngine> {
    fn set_sample_rate(&mut self, sample_rate: f32) {
        (**self).set_sample_rate(sample_rate)
    }

    fn render_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        (**self).render_frame(left, right)
    }

    fn quiet(&mut self) {
        (**self).quiet()
    }

    fn agc_distortion(&self) -> f32 {
        (**self).agc_distortion()
    }
}
