//! End-to-end recording and loop playback
//!
//! Each test records a staircase ramp, so every played-back sample can be
//! traced to the exact input sample it came from.

use crate::helpers::tolerances::{FLOAT_EPSILON, SILENCE_THRESHOLD};
use crate::helpers::*;
use approx::assert_relative_eq;
use nowloop::prelude::*;

/// Record `blocks` of ramp into a new track, then finish and feed ramp until it loops.
/// Returns the track and how many blocks the finish took.
fn record_loop(
    graph: &LoopGraph,
    processor: &mut GraphProcessor,
    blocks: usize,
) -> nowloop::Result<(TrackId, usize)> {
    graph.inputs()[0].set_monitoring(false);
    let id = graph.create_recording_track(AudioInputId::new(0))?;
    let mut next = feed_ramp(processor, 0, blocks);

    graph.finish_recording(id)?;
    let mut finish_blocks = 0;
    while graph.track_state(id)? != TrackState::Looping {
        next = feed_ramp(processor, next, 1);
        finish_blocks += 1;
        assert!(finish_blocks < 100, "track never started looping");
    }
    Ok((id, finish_blocks))
}

/// Left channel of `blocks` silent callbacks.
fn play(processor: &mut GraphProcessor, blocks: usize) -> Vec<f32> {
    let mut played = Vec::with_capacity(blocks * TEST_BLOCK_FRAMES);
    for _ in 0..blocks {
        played.extend(left(&run_silence(processor, TEST_BLOCK_FRAMES)));
    }
    played
}

fn assert_plays_ramp(played: &[f32], first: usize, loop_len: usize, gain: f32) {
    for (k, sample) in played.iter().enumerate() {
        let expected = ramp_value(first + k % loop_len) * gain;
        assert!(
            (sample - expected).abs() <= FLOAT_EPSILON,
            "sample {}: expected {}, got {}",
            k,
            expected,
            sample
        );
    }
}

#[test]
fn test_two_beat_loop_end_to_end() -> nowloop::Result<()> {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);

    let id = graph.create_recording_track(AudioInputId::new(0))?;
    assert_eq!(graph.track_state(id)?, TrackState::Uninitialized);

    // 25000 samples: past the first beat, so the loop grows to two beats
    let mut next = feed_ramp(&mut processor, 0, 25);
    let info = graph.track_info(id)?;
    assert_eq!(info.state, TrackState::Recording);
    assert_eq!(info.start_time.value(), TEST_BLOCK_FRAMES as i64);
    assert_eq!(info.duration_samples.value(), 25_000);
    assert_eq!(info.duration_beats.value(), 2);

    graph.finish_recording(id)?;
    assert_eq!(graph.track_state(id)?, TrackState::FinishRecording);

    let mut blocks = 0;
    while graph.track_state(id)? != TrackState::Looping {
        next = feed_ramp(&mut processor, next, 1);
        blocks += 1;
    }
    assert_eq!(blocks, 23);
    assert_eq!(next, 48_000);

    let info = graph.track_info(id)?;
    assert!(info.is_looping);
    assert_eq!(info.duration_samples.value(), 48_000);
    assert_eq!(info.duration_beats.value(), 2);
    assert_relative_eq!(info.exact_duration, 48_000.0);
    assert_eq!(graph.poll_finished_recordings(), vec![id]);

    // 48000 + 5000 samples: the whole loop, then its first 5000 again
    let played = play(&mut processor, 53);
    assert_plays_ramp(&played, 0, 48_000, centre_gain());
    Ok(())
}

#[test]
fn test_output_is_silent_until_looping() -> nowloop::Result<()> {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);
    let id = graph.create_recording_track(AudioInputId::new(0))?;

    let output = run_mono(&mut processor, &ramp(0, TEST_BLOCK_FRAMES));
    assert_silence(&output, SILENCE_THRESHOLD);
    graph.finish_recording(id)?;
    let output = run_mono(&mut processor, &ramp(1000, TEST_BLOCK_FRAMES));
    assert_silence(&output, SILENCE_THRESHOLD);
    Ok(())
}

#[test]
fn test_fractional_beat_length_loops_on_whole_samples() -> nowloop::Result<()> {
    // 70 BPM: one beat is 41142.857 samples
    let (graph, mut processor) = start(test_builder().beats_per_minute(70.0));
    let (id, blocks) = record_loop(&graph, &mut processor, 10)?;

    // 10000 recorded, 31000 more, then the last 143 samples of one block
    assert_eq!(blocks, 32);
    let info = graph.track_info(id)?;
    assert_eq!(info.duration_beats.value(), 1);
    assert_eq!(info.duration_samples.value(), 41_143);
    assert_relative_eq!(info.exact_duration, 48_000.0 * 60.0 / 70.0, epsilon = 1e-6);

    let played = play(&mut processor, 43);
    assert_plays_ramp(&played, 0, 41_143, centre_gain());
    Ok(())
}

#[test]
fn test_long_recording_grows_past_four_beats() -> nowloop::Result<()> {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);
    let id = graph.create_recording_track(AudioInputId::new(0))?;

    let mut expected = 1;
    for beat in 1..=9 {
        feed_ramp(&mut processor, (beat - 1) * SAMPLES_PER_BEAT, 24);
        // Each full beat passed may grow the loop: 1, 2, 4, then 4 at a time.
        while beat as i64 >= expected {
            expected = if expected < 4 { expected * 2 } else { expected + 4 };
        }
        assert_eq!(graph.track_info(id)?.duration_beats.value(), expected);
    }
    assert_eq!(expected, 12);
    Ok(())
}

#[test]
fn test_tempo_rise_while_finishing_keeps_recorded_audio() -> nowloop::Result<()> {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);
    let id = graph.create_recording_track(AudioInputId::new(0))?;
    let mut next = feed_ramp(&mut processor, 0, 40);
    assert_eq!(graph.track_info(id)?.duration_beats.value(), 2);

    graph.finish_recording(id)?;
    // two beats at 240 BPM are shorter than the 40000 samples already held
    graph.set_beats_per_minute(240.0)?;
    let mut blocks = 0;
    while graph.track_state(id)? != TrackState::Looping {
        next = feed_ramp(&mut processor, next, 1);
        blocks += 1;
        assert!(blocks < 100, "track never started looping");
    }
    assert_eq!(next, 48_000);

    let info = graph.track_info(id)?;
    assert_eq!(info.duration_beats.value(), 4);
    assert_eq!(info.duration_samples.value(), 48_000);

    let played = play(&mut processor, 50);
    assert_plays_ramp(&played, 0, 48_000, centre_gain());
    Ok(())
}

#[test]
fn test_pre_recording_starts_loop_in_the_past() -> nowloop::Result<()> {
    let (graph, mut processor) = test_builder().pre_recording(0.5).build()?;
    graph.inputs()[0].set_monitoring(false);

    // 30000 samples of input history before the track exists
    let mut next = feed_ramp(&mut processor, 0, 30);
    let id = graph.create_recording_track(AudioInputId::new(0))?;
    next = feed_ramp(&mut processor, next, 1);

    let info = graph.track_info(id)?;
    assert_eq!(info.start_time.value(), 6_000);
    // 24000 pre-recorded samples already make a full beat
    assert_eq!(info.duration_beats.value(), 2);
    assert_eq!(info.duration_samples.value(), 25_000);

    graph.finish_recording(id)?;
    while graph.track_state(id)? != TrackState::Looping {
        next = feed_ramp(&mut processor, next, 1);
    }
    assert_eq!(next, 54_000);

    let played = play(&mut processor, 50);
    assert_plays_ramp(&played, 6_000, 48_000, centre_gain());
    Ok(())
}

#[test]
fn test_stereo_track_keeps_channels_apart() -> nowloop::Result<()> {
    fn run_stereo(processor: &mut GraphProcessor, l: &[f32], r: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0; l.len() * 2];
        processor.process(&[l, r], &mut output);
        output
    }
    fn feed(processor: &mut GraphProcessor, from: usize) {
        let l = ramp(from, TEST_BLOCK_FRAMES);
        let r: Vec<f32> = l.iter().map(|s| -s).collect();
        run_stereo(processor, &l, &r);
    }

    let (graph, mut processor) = test_builder()
        .inputs(vec![InputChannels::Stereo(0, 1)])
        .build()?;
    let silence = vec![0.0; TEST_BLOCK_FRAMES];
    run_stereo(&mut processor, &silence, &silence);
    graph.inputs()[0].set_monitoring(false);

    let id = graph.create_recording_track(AudioInputId::new(0))?;
    let mut next = 0;
    for _ in 0..10 {
        feed(&mut processor, next);
        next += TEST_BLOCK_FRAMES;
    }
    graph.finish_recording(id)?;
    while graph.track_state(id)? != TrackState::Looping {
        feed(&mut processor, next);
        next += TEST_BLOCK_FRAMES;
    }
    assert_eq!(graph.track_info(id)?.duration_samples.value(), 24_000);

    // centre pan leaves both channels of a stereo track at unity
    for block in 0..25 {
        let output = run_stereo(&mut processor, &silence, &silence);
        for (k, (l, r)) in left(&output).iter().zip(right(&output)).enumerate() {
            let n = (block * TEST_BLOCK_FRAMES + k) % 24_000;
            assert_eq!(*l, ramp_value(n));
            assert_eq!(r, -ramp_value(n));
        }
    }
    Ok(())
}

#[test]
fn test_beat_position_wraps_within_loop() -> nowloop::Result<()> {
    let (graph, mut processor) = test_graph();
    let (id, _) = record_loop(&graph, &mut processor, 10)?;

    for _ in 0..7 {
        play(&mut processor, 5);
        let beat = graph.beat_position_now(id)?.value();
        assert!((0.0..1.0).contains(&beat), "beat {} outside a one-beat loop", beat);
        let info = graph.track_info(id)?;
        assert!(info.local_clock_beat < 1.0);
    }
    Ok(())
}
