//! Signal statistics and frequency analysis hooks

use crate::helpers::*;
use approx::assert_relative_eq;
use nowloop::prelude::*;
use nowloop::{FrequencyAnalyzer, FrequencyReader, FrequencyTracker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn constant(value: f32) -> Vec<f32> {
    vec![value; TEST_BLOCK_FRAMES]
}

/// Record a one-beat loop of constant `level`.
fn constant_loop(graph: &LoopGraph, processor: &mut GraphProcessor, level: f32) -> TrackId {
    let id = graph.create_recording_track(AudioInputId::new(0)).unwrap();
    run_mono(processor, &constant(level));
    graph.finish_recording(id).unwrap();
    while graph.track_state(id).unwrap() != TrackState::Looping {
        run_mono(processor, &constant(level));
    }
    id
}

#[test]
fn test_input_stats_follow_absolute_level() {
    let (graph, mut processor) = test_graph();
    // enough to fill the 0.1 s window
    for _ in 0..5 {
        run_mono(&mut processor, &constant(-0.5));
    }

    let stats = graph.inputs()[0].signal_info();
    assert_relative_eq!(stats.min, 0.5);
    assert_relative_eq!(stats.max, 0.5);
    assert_relative_eq!(stats.average, 0.5);
}

#[test]
fn test_output_stats_measure_the_mix() {
    let (graph, mut processor) = test_graph();
    run_mono(&mut processor, &constant(0.5));

    let stats = graph.output_signal_info();
    assert_relative_eq!(stats.max, 0.5 * centre_gain(), epsilon = 1e-6);
}

#[test]
fn test_output_stats_include_right_channel() {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);
    let id = constant_loop(&graph, &mut processor, 0.25);
    graph.set_track_pan(id, 1.0).unwrap();

    let mut output = Vec::new();
    for _ in 0..5 {
        output = run_silence(&mut processor, TEST_BLOCK_FRAMES);
    }
    assert!(peak(&left(&output)) < 1e-6);
    assert_relative_eq!(peak(&right(&output)), 0.25, epsilon = 1e-6);

    let stats = graph.output_signal_info();
    assert_relative_eq!(stats.min, 0.25, epsilon = 1e-6);
    assert_relative_eq!(stats.max, 0.25, epsilon = 1e-6);
}

#[test]
fn test_track_stats_switch_from_input_to_loop() {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);

    let id = graph.create_recording_track(AudioInputId::new(0)).unwrap();
    run_mono(&mut processor, &constant(0.25));
    // recording: the input's level
    assert_relative_eq!(graph.track_signal_info(id).unwrap().max, 0.25);

    graph.finish_recording(id).unwrap();
    while graph.track_state(id).unwrap() != TrackState::Looping {
        run_mono(&mut processor, &constant(0.25));
    }

    // looping: the track's own playback, whatever the input does now
    for _ in 0..5 {
        run_mono(&mut processor, &constant(0.75));
    }
    let track = graph.track_signal_info(id).unwrap();
    assert_relative_eq!(track.min, 0.25);
    assert_relative_eq!(track.max, 0.25);
    assert_relative_eq!(graph.inputs()[0].signal_info().max, 0.75);
    assert_eq!(graph.track_info(id).unwrap().volume_stats, track);
}

#[test]
fn test_muted_track_meters_silence() {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);
    let id = constant_loop(&graph, &mut processor, 0.25);

    graph.set_muted(id, true).unwrap();
    for _ in 0..5 {
        run_silence(&mut processor, TEST_BLOCK_FRAMES);
    }
    assert_eq!(graph.track_signal_info(id).unwrap().max, 0.0);
}

#[test]
fn test_callback_timing_is_recorded() {
    let (graph, mut processor) = test_graph();
    let id = graph.create_recording_track(AudioInputId::new(0)).unwrap();
    for _ in 0..5 {
        run_silence(&mut processor, TEST_BLOCK_FRAMES);
    }
    let timing = graph.track_info(id).unwrap().timing_stats;
    assert!(timing.min >= 0.0);
    assert!(timing.max >= timing.min);
}

/// Counts the samples each tracker has seen and reports the count as bin 0.
struct CountingAnalyzer;

struct Counter(Arc<AtomicUsize>);

impl FrequencyTracker for Counter {
    fn record(&mut self, samples: &[f32]) {
        self.0.fetch_add(samples.len(), Ordering::Relaxed);
    }
}

impl FrequencyReader for Counter {
    fn latest(&self, out: &mut [f32]) {
        if let Some(bin) = out.first_mut() {
            *bin = self.0.load(Ordering::Relaxed) as f32;
        }
    }
}

impl FrequencyAnalyzer for CountingAnalyzer {
    fn create(&self) -> (Box<dyn FrequencyTracker>, Arc<dyn FrequencyReader>) {
        let count = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Counter(count.clone())),
            Arc::new(Counter(count)),
        )
    }
}

#[test]
fn test_frequencies_follow_the_measured_signal() {
    let (graph, mut processor) = start(test_builder().frequency_analyzer(Arc::new(CountingAnalyzer)));
    graph.inputs()[0].set_monitoring(false);
    let mut bins = [0.0f32; 4];

    graph.inputs()[0].get_frequencies(&mut bins);
    assert_eq!(bins[0], 1000.0);

    let id = constant_loop(&graph, &mut processor, 0.25);
    let input_count = 1000.0 + 24.0 * 1000.0;
    graph.inputs()[0].get_frequencies(&mut bins);
    assert_eq!(bins[0], input_count);

    // looping tracks report their own analyzer
    graph.get_frequencies(id, &mut bins).unwrap();
    assert_eq!(bins[0], 0.0);
    run_silence(&mut processor, TEST_BLOCK_FRAMES);
    graph.get_frequencies(id, &mut bins).unwrap();
    assert_eq!(bins[0], 1000.0);
    assert_eq!(bins[1], 0.0);
}

#[test]
fn test_frequencies_untouched_without_analyzer() {
    let (graph, _processor) = test_graph();
    let mut bins = [7.0f32; 2];
    graph.inputs()[0].get_frequencies(&mut bins);
    assert_eq!(bins, [7.0, 7.0]);
}
