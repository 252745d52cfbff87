//! Graph lifecycle integration tests
//!
//! Build, first callback, shutdown, host errors and tempo.

use crate::helpers::tolerances::SILENCE_THRESHOLD;
use crate::helpers::*;
use approx::assert_relative_eq;
use nowloop::prelude::*;
use std::time::Duration as StdDuration;

#[test]
fn test_invalid_config_is_rejected() {
    let result = LoopGraph::builder().sample_rate(1000).build();
    assert!(matches!(
        result.map(|_| ()).map_err(nowloop::Error::from),
        Err(nowloop::Error::Core(nowloop::core::Error::InvalidConfig(_)))
    ));

    let result = LoopGraph::builder().beats_per_minute(5.0).build();
    assert!(matches!(
        result,
        Err(nowloop::core::Error::InvalidTempo(_))
    ));
}

#[test]
fn test_pool_too_small_for_input_history() {
    // 1 s of history at 4096-sample blocks needs 14 blocks per channel.
    let result = test_builder().block_pool(4096, 14).build();
    assert!(result.is_err());
}

#[test]
fn test_graph_runs_from_first_callback() -> nowloop::Result<()> {
    let (graph, mut processor) = test_builder().build()?;
    assert_eq!(graph.state(), GraphState::Initialized);
    assert_eq!(graph.info().samples_per_quantum, 0);

    run_silence(&mut processor, 512);
    assert!(graph.wait_for_state(GraphState::Running, StdDuration::from_millis(100)));

    let info = graph.info();
    assert_eq!(info.sample_rate_hz, TEST_SAMPLE_RATE);
    assert_eq!(info.channel_count, 2);
    assert_eq!(info.bits_per_sample, 32);
    assert_eq!(info.samples_per_quantum, 512);
    Ok(())
}

#[test]
fn test_clock_follows_processed_samples() {
    let (graph, mut processor) = test_graph();
    // test_graph already ran one block
    for _ in 0..47 {
        run_silence(&mut processor, TEST_BLOCK_FRAMES);
    }

    let time = graph.time_info();
    assert_eq!(time.time_in_samples.value(), 48_000);
    assert_relative_eq!(time.exact_beat, 2.0);
    assert_eq!(time.beat_in_measure, 2);
    assert_relative_eq!(time.beats_per_minute, 120.0);
}

#[test]
fn test_tempo_change_rescales_beats() -> nowloop::Result<()> {
    let (graph, mut processor) = test_graph();
    for _ in 0..47 {
        run_silence(&mut processor, TEST_BLOCK_FRAMES);
    }

    graph.set_beats_per_minute(60.0)?;
    assert_relative_eq!(graph.time_info().exact_beat, 1.0);
    assert_relative_eq!(graph.clock().beat_duration().value(), 48_000.0);

    assert!(graph.set_beats_per_minute(1000.0).is_err());
    assert_relative_eq!(graph.time_info().beats_per_minute, 60.0);
    Ok(())
}

#[test]
fn test_monitored_input_reaches_output() {
    let (_graph, mut processor) = test_graph();
    let output = run_mono(&mut processor, &vec![0.5; TEST_BLOCK_FRAMES]);

    let gain = centre_gain();
    for (l, r) in left(&output).iter().zip(right(&output)) {
        assert_relative_eq!(*l, 0.5 * gain);
        assert_relative_eq!(r, 0.5 * gain, epsilon = 1e-6);
    }
}

#[test]
fn test_unmonitored_input_is_silent() {
    let (graph, mut processor) = test_graph();
    graph.inputs()[0].set_monitoring(false);
    assert!(!graph.inputs()[0].info().monitoring);

    let output = run_mono(&mut processor, &vec![0.5; TEST_BLOCK_FRAMES]);
    assert_silence(&output, SILENCE_THRESHOLD);
}

#[test]
fn test_shutdown_silences_and_rejects_tracks() {
    let (graph, mut processor) = test_graph();
    graph.shutdown();
    assert_eq!(graph.state(), GraphState::Uninitialized);

    let output = run_mono(&mut processor, &vec![0.5; TEST_BLOCK_FRAMES]);
    assert_silence(&output, SILENCE_THRESHOLD);
    assert!(graph.create_recording_track(AudioInputId::new(0)).is_err());
}

#[test]
fn test_missing_host_channel_puts_graph_in_error() {
    let (graph, mut processor) = test_builder()
        .inputs(vec![InputChannels::Stereo(0, 1)])
        .build()
        .unwrap();

    let input = vec![0.5; TEST_BLOCK_FRAMES];
    let mut output = vec![1.0; 2 * TEST_BLOCK_FRAMES];
    processor.process(&[&input[..]], &mut output);
    assert_eq!(graph.state(), GraphState::InError);
    assert_silence(&output, SILENCE_THRESHOLD);

    // stays in error
    processor.process(&[&input[..], &input[..]], &mut output);
    assert_eq!(graph.state(), GraphState::InError);
}

#[test]
#[should_panic(expected = "exceeds max_block_frames")]
fn test_over_long_block_panics() {
    let (_graph, mut processor) = test_builder().max_block_frames(256).build().unwrap();
    run_silence(&mut processor, 512);
}

#[test]
fn test_config_round_trips_through_builder() -> nowloop::Result<()> {
    let config = GraphConfig {
        beats_per_minute: 100.0,
        beats_per_measure: 3,
        max_tracks: 4,
        ..Default::default()
    };
    let (graph, _processor) = LoopGraph::builder().config(config.clone()).build()?;
    assert_eq!(graph.context().config(), &config);
    assert_eq!(graph.clock().beats_per_measure(), 3);
    Ok(())
}
