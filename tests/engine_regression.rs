use resona_dsp::elastika::mesh::{MAX_DISPLACEMENT, MAX_SPEED};
use resona_dsp::elastika::ElastikaEngine;
use resona_dsp::engine::{Powered, StereoEngine};
use resona_dsp::tube::{TubeBank, TubeUnitEngine};
use resona_dsp::MAX_CHANNELS;

const SR: f32 = 48_000.0;

/// Deterministic pseudo-noise in [-1, 1].
fn noise(n: usize) -> f32 {
    let x = (n as u32).wrapping_mul(2_654_435_761) ^ 0x5bd1_e995;
    (x >> 8) as f32 / (1u32 << 23) as f32 - 1.0
}

/// Lag in `lags` with the largest autocorrelation.
fn best_lag(signal: &[f32], lags: std::ops::RangeInclusive<usize>) -> usize {
    let corr = |lag: usize| -> f32 { signal.iter().zip(&signal[lag..]).map(|(x, y)| x * y).sum() };
    lags.max_by(|&a, &b| corr(a).total_cmp(&corr(b))).unwrap_or(0)
}

/// Peak of `value` over consecutive windows of `window` samples.
fn window_peaks(values: &[f32], window: usize) -> Vec<f32> {
    values
        .chunks(window)
        .map(|w| w.iter().copied().fold(0.0f32, f32::max))
        .collect()
}

#[test]
fn elastika_stays_bounded_across_settings() {
    // One second per corner: noise for a quarter, then silence.
    const DRIVEN: usize = 12_000;
    const TOTAL: usize = 48_000;
    let speed_limit = MAX_SPEED * 1.0001;
    let displacement_limit = MAX_DISPLACEMENT * 1.001;

    for &friction in &[0.0, 1.0] {
        for &stiffness in &[0.0, 1.0] {
            for &span in &[0.0, 1.0] {
                for &curl in &[0.0, 1.0] {
                    for &mass in &[-1.0, 1.0] {
                        let corner = format!(
                            "friction={friction} stiffness={stiffness} span={span} \
                             curl={curl} mass={mass}"
                        );
                        let mut engine = ElastikaEngine::new(SR);
                        engine.set_agc_enabled(false);
                        engine.set_friction(friction);
                        engine.set_stiffness(stiffness);
                        engine.set_span(span);
                        engine.set_curl(curl);
                        engine.set_mass(mass);
                        engine.set_drive(2.0);
                        engine.set_gain(16.0);

                        let mut energy = Vec::with_capacity(TOTAL - DRIVEN);
                        for n in 0..TOTAL {
                            let (x, y) = if n < DRIVEN {
                                (4.0 * noise(n), 4.0 * noise(n + 7))
                            } else {
                                (0.0, 0.0)
                            };
                            let (l, r) = engine.process(SR, x, y);
                            assert!(l.is_finite() && r.is_finite(), "{corner}: ({l}, {r})");
                            if n >= DRIVEN {
                                energy.push(engine.kinetic_energy());
                            }
                            if n % 64 == 0 {
                                for ball in engine.mesh().balls() {
                                    let speed = ball.vel.length();
                                    let offset = ball.displacement().length();
                                    assert!(speed <= speed_limit, "{corner}: speed {speed}");
                                    assert!(
                                        offset <= displacement_limit,
                                        "{corner}: displacement {offset}"
                                    );
                                }
                            }
                        }
                        assert_eq!(engine.recovery_count(), 0, "{corner}");

                        // Friction with no curl must bleed the mesh dry.
                        if friction > 0.0 && curl == 0.0 {
                            let peaks = window_peaks(&energy, 4_800);
                            let first = peaks[0];
                            let last = peaks[peaks.len() - 1];
                            assert!(
                                last <= 0.01 * first + 1e-12,
                                "{corner}: kinetic energy {first} -> {last}"
                            );
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn tube_stays_bounded_across_settings() {
    // Loop gain stays below MAX_REFLECTION, so even at full airflow and gain
    // the unlimited output settles orders of magnitude below this.
    const CEILING: f32 = 1.0e5;

    for &airflow in &[0.0, 5.0] {
        for &decay in &[0.0, 1.0] {
            for &stiffness in &[0.005, 50.0] {
                for &vortex in &[0.0, 1.0] {
                    for &root in &[4.0, 1024.0] {
                        let corner = format!(
                            "airflow={airflow} decay={decay} k={stiffness} \
                             vortex={vortex} root={root}"
                        );
                        let mut engine = TubeUnitEngine::new(SR);
                        engine.set_agc_enabled(false);
                        engine.set_airflow(airflow);
                        engine.set_reflection_decay(decay);
                        engine.set_spring_constant(stiffness);
                        engine.set_vortex(vortex);
                        engine.set_root_frequency(root);
                        engine.set_gain(2.0);
                        let mut peak = 0.0f32;
                        for n in 0..48_000 {
                            let (l, r) = engine.process(noise(n), noise(n + 7));
                            assert!(l.is_finite() && r.is_finite(), "{corner}: ({l}, {r})");
                            peak = peak.max(l.abs()).max(r.abs());
                        }
                        assert!(peak < CEILING, "{corner}: peak {peak}");
                        assert_eq!(engine.recovery_count(), 0, "{corner}");
                    }
                }
            }
        }
    }
}

#[test]
fn setters_clamp_idempotently() {
    let mut elastika = ElastikaEngine::new(SR);
    elastika.set_friction(7.0);
    elastika.set_curl(-3.0);
    elastika.set_gain(100.0);
    elastika.set_drive(f32::NAN);
    let snapshot = (elastika.friction(), elastika.curl(), elastika.gain(), elastika.drive());
    assert_eq!(snapshot, (1.0, -1.0, 16.0, 0.0));
    elastika.set_friction(snapshot.0);
    elastika.set_curl(snapshot.1);
    elastika.set_gain(snapshot.2);
    elastika.set_drive(snapshot.3);
    assert_eq!(
        (elastika.friction(), elastika.curl(), elastika.gain(), elastika.drive()),
        snapshot
    );

    let mut tube = TubeUnitEngine::new(SR);
    tube.set_root_frequency(1.0e6);
    tube.set_spring_constant(-1.0);
    tube.set_bypass_center(-50.0);
    let snapshot = (tube.root_frequency(), tube.spring_constant(), tube.bypass_center());
    assert_eq!(snapshot, (1024.0, 0.005, -10.0));
    tube.set_root_frequency(snapshot.0);
    tube.set_spring_constant(snapshot.1);
    tube.set_bypass_center(snapshot.2);
    assert_eq!(
        (tube.root_frequency(), tube.spring_constant(), tube.bypass_center()),
        snapshot
    );
}

fn ring_tube(angle: f32) -> Vec<f32> {
    let mut engine = TubeUnitEngine::new(SR);
    engine.set_airflow(0.0);
    engine.set_vortex(0.0);
    engine.set_reflection_angle(angle);
    engine.set_reflection_decay(1.0);
    engine.set_root_frequency(440.0);
    engine.set_agc_enabled(false);
    (0..4_800)
        .map(|n| engine.process(if n == 0 { 1.0 } else { 0.0 }, 0.0).0)
        .collect()
}

#[test]
fn tube_pitch_follows_root_frequency() {
    // Inverting reflection: one period is two trips down the tube.
    let period = best_lag(&ring_tube(0.0), 60..=160);
    assert!((108..=110).contains(&period), "period {period}");
}

#[test]
fn tube_half_turn_raises_an_octave() {
    let period = best_lag(&ring_tube(std::f32::consts::PI), 30..=80);
    assert!((53..=56).contains(&period), "period {period}");
}

#[test]
fn power_off_fades_then_quiets_once() {
    let mut powered = Powered::new(TubeUnitEngine::new(SR), SR);
    for _ in 0..2_000 {
        powered.process(true, 0.0, 0.0);
    }

    let mut audible = 0;
    for _ in 0..500 {
        let (l, r) = powered.process(false, 0.0, 0.0);
        if powered.is_running() {
            audible += 1;
        } else {
            assert_eq!((l, r), (0.0, 0.0));
        }
    }
    assert_eq!(audible, 119);
    assert!(!powered.is_running());
    assert_eq!(powered.quiet_events(), 1);

    // Back on and off again: one more quiet.
    for _ in 0..200 {
        powered.process(true, 0.0, 0.0);
    }
    for _ in 0..200 {
        powered.process(false, 0.0, 0.0);
    }
    assert_eq!(powered.quiet_events(), 2);
}

#[test]
fn bank_channels_do_not_leak() {
    let mut bank = TubeBank::new(SR);
    for engine in bank.engines_mut() {
        engine.set_airflow(0.0);
    }

    let mut peaks = [0.0f32; MAX_CHANNELS];
    for n in 0..2_000 {
        for (c, peak) in peaks.iter_mut().enumerate() {
            let input = if c == 3 && n == 0 { 1.0 } else { 0.0 };
            let (l, r) = bank.process(c, input, input);
            *peak = peak.max(l.abs()).max(r.abs());
        }
    }
    for (c, &peak) in peaks.iter().enumerate() {
        if c == 3 {
            assert!(peak > 0.01, "excited channel peak {peak}");
        } else {
            assert_eq!(peak, 0.0, "channel {c} leaked");
        }
    }
}

#[test]
fn non_finite_input_recovers() {
    let mut engines: Vec<Box<dyn StereoEngine>> =
        vec![Box::new(ElastikaEngine::new(SR)), Box::new(TubeUnitEngine::new(SR))];
    for engine in &mut engines {
        for n in 0..500 {
            engine.render_frame(noise(n), noise(n + 1));
        }
        assert_eq!(engine.render_frame(f32::NAN, 0.0), (0.0, 0.0));
        assert_eq!(engine.render_frame(0.0, f32::INFINITY), (0.0, 0.0));
        for n in 0..500 {
            let (l, r) = engine.render_frame(noise(n), noise(n + 1));
            assert!(l.is_finite() && r.is_finite());
        }
    }
}

#[test]
fn quiet_returns_to_silence_across_settings() {
    for &friction in &[0.0, 0.5, 1.0] {
        for &stiffness in &[0.0, 1.0] {
            for &curl in &[-1.0, 0.0, 1.0] {
                let mut engine = ElastikaEngine::new(SR);
                engine.set_friction(friction);
                engine.set_stiffness(stiffness);
                engine.set_curl(curl);
                for n in 0..300 {
                    engine.process(SR, noise(n), noise(n + 3));
                }
                engine.quiet();
                for _ in 0..500 {
                    let (l, r) = engine.process(SR, 0.0, 0.0);
                    assert!(
                        l.abs() < 1e-3 && r.abs() < 1e-3,
                        "friction={friction} stiffness={stiffness} curl={curl}: ({l}, {r})"
                    );
                }
            }
        }
    }

    for &decay in &[0.0, 1.0] {
        for &vortex in &[0.0, 1.0] {
            let mut engine = TubeUnitEngine::new(SR);
            engine.set_reflection_decay(decay);
            engine.set_vortex(vortex);
            for n in 0..2_000 {
                engine.process(noise(n), 0.0);
            }
            engine.set_airflow(0.0);
            engine.clear();
            for _ in 0..2_000 {
                assert_eq!(engine.process(0.0, 0.0), (0.0, 0.0));
            }
        }
    }
}
