//! Encoder pipeline integration tests
//!
//! Drives [`EncoderPipeline`] with scripted engines and scripted hardware
//! devices. Hardware fallback is observable only through
//! `hardware_available()` and the parameters the engine was opened with.

mod common;

use common::{patterned_frame, plane_views, ScriptedEncoder, ScriptedFactory};
use vidpipe::codec::CodecId;
use vidpipe::error::Error;
use vidpipe::hwaccel::{HwAccelType, HwFormatBinding, HwPixelFormat};
use vidpipe::pipeline::{EncoderConfig, EncoderPipeline};
use vidpipe::util::PixelFormat;

fn software_pipeline(config: EncoderConfig) -> EncoderPipeline {
    EncoderPipeline::with_device_factory(config, Box::new(ScriptedFactory::new(vec![])))
}

fn cuda_config() -> EncoderConfig {
    EncoderConfig {
        hw_backend: Some(HwAccelType::CUDA),
        ..EncoderConfig::default()
    }
}

#[test]
fn test_software_flow_stamps_monotonic_pts() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();

    let mut pipeline = software_pipeline(EncoderConfig::default());
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();
    assert!(!pipeline.hardware_available());

    let frame = patterned_frame(4, 2, PixelFormat::YUV420P, 0);
    let (planes, strides) = plane_views(&frame);
    for _ in 0..3 {
        pipeline.send(4, 2, planes, strides).unwrap();
    }

    // a rejected frame must not consume a timestamp
    assert!(pipeline.send(8, 8, planes, strides).is_err());
    pipeline.send(4, 2, planes, strides).unwrap();

    let script = script.borrow();
    let stamps: Vec<i64> = script.frames.iter().map(|f| f.pts.value).collect();
    assert_eq!(stamps, vec![0, 1, 2, 3]);
    assert_eq!(script.frames[0].plane(0).unwrap(), frame.plane(0).unwrap());
}

#[test]
fn test_receive_packet_returns_engine_output() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();
    {
        let mut script = script.borrow_mut();
        script.packets.push_back((vec![1, 2, 3], true));
        script.packets.push_back((vec![4, 5], false));
    }

    let mut pipeline = software_pipeline(EncoderConfig::default());
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();

    let packet = pipeline.receive_packet().unwrap().expect("packet ready");
    assert_eq!(packet.data, &[1, 2, 3]);
    assert!(packet.keyframe);

    let packet = pipeline.receive_packet().unwrap().expect("packet ready");
    assert_eq!(packet.data, &[4, 5]);
    assert!(!packet.keyframe);

    assert!(pipeline.receive_packet().unwrap().is_none());
}

#[test]
fn test_receive_all_concatenates_in_order() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();
    {
        let mut script = script.borrow_mut();
        script.packets.push_back((vec![1, 2, 3], true));
        script.packets.push_back((vec![4, 5], false));
    }

    let mut pipeline = software_pipeline(EncoderConfig::default());
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();

    assert_eq!(pipeline.receive_all().unwrap(), &[1, 2, 3, 4, 5]);
    // drained, the next sweep comes back empty
    assert!(pipeline.receive_all().unwrap().is_empty());
}

#[test]
fn test_receive_all_respects_capacity() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();
    {
        let mut script = script.borrow_mut();
        script.packets.push_back((vec![1, 2, 3], true));
        script.packets.push_back((vec![4, 5], false));
    }

    let config = EncoderConfig {
        buffer_capacity: 4,
        ..EncoderConfig::default()
    };
    let mut pipeline = software_pipeline(config);
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();

    match pipeline.receive_all().unwrap_err() {
        Error::BufferTooSmall { need, have } => {
            assert_eq!(need, 5);
            assert_eq!(have, 4);
        }
        other => panic!("expected BufferTooSmall, got {:?}", other),
    }
}

#[test]
fn test_hardware_path_uploads_via_device() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();

    let mut pipeline = EncoderPipeline::with_device_factory(
        cuda_config(),
        Box::new(ScriptedFactory::new(vec![HwAccelType::CUDA])),
    );
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();
    assert!(pipeline.hardware_available());

    let frame = patterned_frame(4, 2, PixelFormat::YUV420P, 0);
    let (planes, strides) = plane_views(&frame);
    pipeline.send(4, 2, planes, strides).unwrap();

    let script = script.borrow();
    let opened = script.opened.as_ref().expect("engine opened");
    assert_eq!(
        opened.hw,
        Some(HwFormatBinding {
            backend: HwAccelType::CUDA,
            format: HwPixelFormat::YUV420P,
        })
    );
    // the engine saw the uploaded device frame, stamped and bit-identical
    assert_eq!(script.frames.len(), 1);
    assert_eq!(script.frames[0].pts.value, 0);
    assert_eq!(script.frames[0].plane(0).unwrap(), frame.plane(0).unwrap());
    assert_eq!(script.frames[0].plane(2).unwrap(), frame.plane(2).unwrap());
}

#[test]
fn test_device_failure_falls_back_to_software() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();

    // backend configured but no device comes up
    let mut pipeline = software_pipeline(cuda_config());
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();

    assert!(pipeline.is_initialized());
    assert!(!pipeline.hardware_available());
    let script = script.borrow();
    assert!(script.opened.as_ref().expect("engine opened").hw.is_none());
}

#[test]
fn test_engine_rejecting_surfaces_falls_back_to_software() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();
    script.borrow_mut().reject_hw_open = true;

    let mut pipeline = EncoderPipeline::with_device_factory(
        cuda_config(),
        Box::new(ScriptedFactory::new(vec![HwAccelType::CUDA])),
    );
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();

    assert!(pipeline.is_initialized());
    assert!(!pipeline.hardware_available());
    // the second open is the one that sticks
    let script = script.borrow();
    assert!(script.opened.as_ref().expect("engine opened").hw.is_none());
}

#[test]
fn test_open_failure_leaves_uninitialized() {
    let engine = ScriptedEncoder::new();
    engine.script.borrow_mut().reject_open = true;

    let mut pipeline = software_pipeline(EncoderConfig::default());
    assert!(pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .is_err());
    assert!(!pipeline.is_initialized());
}

#[test]
fn test_reinit_replaces_layout_and_restarts_pts() {
    let mut pipeline = software_pipeline(EncoderConfig::default());

    let first = ScriptedEncoder::new();
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(first))
        .unwrap();
    let frame = patterned_frame(4, 2, PixelFormat::YUV420P, 0);
    let (planes, strides) = plane_views(&frame);
    pipeline.send(4, 2, planes, strides).unwrap();

    let second = ScriptedEncoder::new();
    let script = second.script.clone();
    pipeline
        .init_with_engine(8, 4, PixelFormat::YUV420P, Box::new(second))
        .unwrap();

    // the old layout no longer fits
    assert!(pipeline.send(4, 2, planes, strides).is_err());

    let big = patterned_frame(8, 4, PixelFormat::YUV420P, 0);
    let (planes, strides) = plane_views(&big);
    pipeline.send(8, 4, planes, strides).unwrap();
    assert_eq!(script.borrow().frames[0].pts.value, 0);
}

#[test]
fn test_flush_then_drain() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();
    {
        let mut script = script.borrow_mut();
        script.packets.push_back((vec![1], true));
        script.packets.push_back((vec![2], false));
    }

    let mut pipeline = software_pipeline(EncoderConfig::default());
    pipeline
        .init_with_engine(4, 2, PixelFormat::YUV420P, Box::new(engine))
        .unwrap();
    pipeline.flush().unwrap();

    assert!(pipeline.receive_packet().unwrap().is_some());
    assert!(pipeline.receive_packet().unwrap().is_some());
    // drained end of stream reads as nothing ready
    assert!(pipeline.receive_packet().unwrap().is_none());
}

#[test]
fn test_rate_control_policy_reaches_engine() {
    let engine = ScriptedEncoder::new();
    let script = engine.script.clone();

    let config = EncoderConfig {
        bit_rate: 2_000_000,
        framerate: 30,
        gop_size: 60,
        max_b_frames: 2,
        qmin: 18,
        qmax: 40,
        preset: "fast".to_string(),
        profile: "high".to_string(),
        tune: "film".to_string(),
        ..EncoderConfig::default()
    };
    let mut pipeline = software_pipeline(config);
    pipeline
        .init_with_engine(640, 480, PixelFormat::NV12, Box::new(engine))
        .unwrap();

    let script = script.borrow();
    let opened = script.opened.as_ref().expect("engine opened");
    assert_eq!(opened.codec, CodecId::H264);
    assert_eq!((opened.width, opened.height), (640, 480));
    assert_eq!(opened.format, PixelFormat::NV12);
    assert_eq!(opened.bit_rate, 2_000_000);
    assert_eq!(opened.framerate, 30);
    assert_eq!(opened.gop_size, 60);
    assert_eq!(opened.max_b_frames, 2);
    assert_eq!(opened.qmin, 18);
    assert_eq!(opened.qmax, 40);
    assert_eq!(opened.preset, "fast");
    assert_eq!(opened.profile, "high");
    assert_eq!(opened.tune, "film");
    assert!(opened.hw.is_none());
}
