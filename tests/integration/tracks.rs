//! Track ids, deletion and per-track controls

use crate::helpers::tolerances::{FLOAT_EPSILON, SILENCE_THRESHOLD};
use crate::helpers::*;
use approx::assert_relative_eq;
use nowloop::core::Error as CoreError;
use nowloop::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A one-beat loop of the ramp, with input monitoring off.
fn one_beat_loop(graph: &LoopGraph, processor: &mut GraphProcessor) -> TrackId {
    let input = graph.input(AudioInputId::new(0)).unwrap();
    input.set_monitoring(false);
    let id = input.create_recording_track().unwrap();
    let mut next = feed_ramp(processor, 0, 10);
    graph.finish_recording(id).unwrap();
    while graph.track_state(id).unwrap() != TrackState::Looping {
        next = feed_ramp(processor, next, 1);
    }
    id
}

#[test]
fn test_delete_while_recording_is_refused() {
    let (graph, mut processor) = test_graph();
    let id = graph.create_recording_track(AudioInputId::new(0)).unwrap();
    feed_ramp(&mut processor, 0, 5);

    assert_eq!(graph.delete_track(id), Err(CoreError::TrackStillRecording(id)));
    graph.finish_recording(id).unwrap();
    assert_eq!(graph.delete_track(id), Err(CoreError::TrackStillRecording(id)));
    assert_eq!(graph.track_ids(), vec![id]);
}

#[test]
fn test_finish_twice_is_refused() {
    let (graph, mut processor) = test_graph();
    let id = one_beat_loop(&graph, &mut processor);
    assert_eq!(
        graph.finish_recording(id),
        Err(CoreError::InvalidTrackState {
            id,
            expected: TrackState::Recording,
            actual: TrackState::Looping,
        })
    );
}

#[test]
fn test_deleted_track_id_goes_stale() {
    let (graph, mut processor) = test_graph();
    let id = one_beat_loop(&graph, &mut processor);

    graph.delete_track(id).unwrap();
    let output = run_silence(&mut processor, TEST_BLOCK_FRAMES);
    assert_silence(&output, SILENCE_THRESHOLD);

    assert_eq!(graph.track_info(id), Err(CoreError::UnknownTrack(id)));
    assert_eq!(graph.set_muted(id, true), Err(CoreError::UnknownTrack(id)));
    assert_eq!(graph.delete_track(id), Err(CoreError::UnknownTrack(id)));

    // the slot is reused under a new generation; the old id still misses
    let reused = graph.create_recording_track(AudioInputId::new(0)).unwrap();
    assert_eq!(reused.index(), id.index());
    assert_ne!(reused.generation(), id.generation());
    assert!(graph.track_info(id).is_err());
    assert_eq!(graph.track_state(reused).unwrap(), TrackState::Uninitialized);
}

#[test]
fn test_track_limit_is_enforced() {
    let (graph, _processor) = start(test_builder().max_tracks(3));
    for _ in 0..3 {
        graph.create_recording_track(AudioInputId::new(0)).unwrap();
    }
    assert_eq!(
        graph.create_recording_track(AudioInputId::new(0)),
        Err(CoreError::TooManyTracks(3))
    );
    assert_eq!(graph.track_ids().len(), 3);
}

#[test]
fn test_mute_keeps_the_loop_moving() {
    let (graph, mut processor) = test_graph();
    let id = one_beat_loop(&graph, &mut processor);

    graph.set_muted(id, true).unwrap();
    assert!(graph.track_info(id).unwrap().muted);
    for _ in 0..10 {
        let output = run_silence(&mut processor, TEST_BLOCK_FRAMES);
        assert_silence(&output, SILENCE_THRESHOLD);
    }

    graph.set_muted(id, false).unwrap();
    let output = left(&run_silence(&mut processor, TEST_BLOCK_FRAMES));
    let gain = centre_gain();
    for (k, sample) in output.iter().enumerate() {
        assert!((sample - ramp_value(10_000 + k) * gain).abs() <= FLOAT_EPSILON);
    }
}

#[test]
fn test_pan_and_volume() {
    let (graph, mut processor) = test_graph();
    let id = one_beat_loop(&graph, &mut processor);

    graph.set_track_pan(id, 0.0).unwrap();
    graph.set_track_volume(id, 0.5).unwrap();
    let info = graph.track_info(id).unwrap();
    assert_relative_eq!(info.pan, 0.0);
    assert_relative_eq!(info.volume, 0.5);

    let output = run_silence(&mut processor, TEST_BLOCK_FRAMES);
    for (k, (l, r)) in left(&output).iter().zip(right(&output)).enumerate() {
        assert_relative_eq!(*l, ramp_value(k) * 0.5, epsilon = FLOAT_EPSILON);
        assert_relative_eq!(r, 0.0, epsilon = FLOAT_EPSILON);
    }

    // out-of-range pan is clamped
    graph.set_track_pan(id, 3.0).unwrap();
    assert_relative_eq!(graph.track_info(id).unwrap().pan, 1.0);
}

#[test]
fn test_tracks_mix_on_the_bus() {
    let (graph, mut processor) = test_graph();
    let first = one_beat_loop(&graph, &mut processor);

    // second loop recorded from silence, panned hard right
    let second = graph.create_recording_track(AudioInputId::new(0)).unwrap();
    run_silence(&mut processor, TEST_BLOCK_FRAMES);
    graph.finish_recording(second).unwrap();
    while graph.track_state(second).unwrap() != TrackState::Looping {
        run_silence(&mut processor, TEST_BLOCK_FRAMES);
    }
    assert_eq!(graph.poll_finished_recordings().len(), 2);

    graph.set_track_pan(first, 0.0).unwrap();
    let output = run_silence(&mut processor, TEST_BLOCK_FRAMES);
    assert!(peak(&left(&output)) > 0.0);
    assert_silence(&right(&output), SILENCE_THRESHOLD);
}

#[test]
fn test_control_from_another_thread() {
    init_tracing();
    let (graph, processor) = test_builder().build().unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let audio = {
        let stop = stop.clone();
        let mut processor = processor;
        std::thread::spawn(move || {
            let mut next = 0;
            while !stop.load(Ordering::Acquire) {
                run_mono(&mut processor, &ramp(next % 100_000, 256));
                next += 256;
                std::thread::yield_now();
            }
        })
    };

    assert!(wait_until(5_000, || graph.state() == GraphState::Running));
    let id = graph.create_recording_track(AudioInputId::new(0)).unwrap();
    assert!(wait_until(5_000, || graph.track_state(id) == Ok(TrackState::Recording)));

    graph.finish_recording(id).unwrap();
    let mut finished = Vec::new();
    assert!(wait_until(10_000, || {
        finished.extend(graph.poll_finished_recordings());
        !finished.is_empty()
    }));
    assert_eq!(finished, vec![id]);

    let info = graph.track_info(id).unwrap();
    assert!(info.is_looping);
    assert_eq!(info.duration_samples.value() % SAMPLES_PER_BEAT as i64, 0);

    graph.delete_track(id).unwrap();
    stop.store(true, Ordering::Release);
    audio.join().unwrap();
    assert!(graph.track_ids().is_empty());
}
