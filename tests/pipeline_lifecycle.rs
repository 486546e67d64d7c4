//! Lifecycle and callback-delivery tests over the public API.
//!
//! The mock engine stands in for the external demux/decode/recognition
//! implementation; events are delivered from a spawned worker thread to
//! exercise the cross-context callback contract.

use crossbeam_channel::bounded;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use subalign::engine::{MockMediaEngine, MockSpeechEngine, WordEvent};
use subalign::{
    Pipeline, PipelineFactory, Settings, StreamDescriptor, StreamKind, SubalignError,
};

fn make_factory(media: &MockMediaEngine, speech: &MockSpeechEngine) -> PipelineFactory {
    PipelineFactory::new(
        Arc::new(media.clone()),
        Arc::new(speech.clone()),
        Settings::default(),
    )
}

fn subtitle_stream() -> StreamDescriptor {
    StreamDescriptor::new("/media/film.mkv", 2, StreamKind::SubtitleText)
}

fn audio_stream() -> StreamDescriptor {
    StreamDescriptor::new("/media/film.mkv", 1, StreamKind::Audio).with_language("en")
}

#[test]
fn words_and_eos_are_delivered_from_the_engine_context() {
    let media = MockMediaEngine::new().with_duration(30.0);
    let speech = MockSpeechEngine::new();
    let factory = make_factory(&media, &speech);

    let mut pipeline = factory.create_producer_pipeline(&subtitle_stream()).unwrap();

    let (word_tx, word_rx) = bounded::<WordEvent>(16);
    pipeline.connect_words_callback(Some(Box::new(move |word| {
        word_tx.send(word).ok();
    })));

    let (eos_tx, eos_rx) = bounded::<()>(1);
    pipeline.connect_eos_callback(Some(Box::new(move || {
        eos_tx.send(()).ok();
    })));

    pipeline.start().unwrap();
    assert!(pipeline.is_running());

    // The engine delivers from its own worker thread, in stream-time order.
    let decoder = media.last_subtitle_decoder().unwrap();
    let extractor = media.last_extractor().unwrap();
    let worker = thread::spawn(move || {
        for (text, begin) in [("first", 1.0), ("second", 2.0), ("third", 3.0)] {
            decoder.fire_word(WordEvent::new(text, begin, begin + 0.4));
        }
        extractor.fire_eos();
    });

    eos_rx
        .recv_timeout(Duration::from_secs(1))
        .expect("EOS should arrive");
    worker.join().unwrap();

    let words: Vec<WordEvent> = word_rx.try_iter().collect();
    assert_eq!(words.len(), 3);
    assert!(words.windows(2).all(|pair| pair[0].begin <= pair[1].begin));
    assert!(!pipeline.is_running());

    pipeline.destroy();
}

#[test]
fn error_is_terminal_and_fires_once() {
    let media = MockMediaEngine::new().with_duration(30.0);
    let speech = MockSpeechEngine::new();
    let factory = make_factory(&media, &speech);

    let mut pipeline = factory.create_producer_pipeline(&audio_stream()).unwrap();

    let errors = Arc::new(AtomicUsize::new(0));
    let counter = errors.clone();
    pipeline.connect_error_callback(Some(Box::new(move |_err| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    pipeline.start().unwrap();
    media.last_extractor().unwrap().fire_error(SubalignError::Engine {
        message: "decode failed".to_string(),
    });

    assert_eq!(errors.load(Ordering::SeqCst), 1);
    // After the error the pipeline is stopped and must be destroyed.
    assert!(!pipeline.is_running());
    pipeline.destroy();
}

#[test]
fn no_callback_fires_after_destroy() {
    let media = MockMediaEngine::new().with_duration(30.0);
    let speech = MockSpeechEngine::new();
    let factory = make_factory(&media, &speech);

    let mut pipeline = factory.create_producer_pipeline(&audio_stream()).unwrap();

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    pipeline.connect_words_callback(Some(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));
    let counter = delivered.clone();
    pipeline.connect_eos_callback(Some(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })));
    let counter = delivered.clone();
    pipeline.connect_error_callback(Some(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    pipeline.start().unwrap();
    pipeline.stop();
    pipeline.destroy();

    // A slow engine worker attempts delivery after destroy; every slot is
    // already detached so nothing may reach the callbacks.
    let recognizer = speech.last_recognizer().unwrap();
    let resampler = media.last_resampler().unwrap();
    let extractor = media.last_extractor().unwrap();
    let late_worker = thread::spawn(move || {
        recognizer.fire_word(WordEvent::new("late", 9.0, 9.4));
        resampler.fire_format_change(subalign::AudioFormat::new(48000, 2));
        extractor.fire_eos();
        extractor.fire_error(SubalignError::Engine {
            message: "late failure".to_string(),
        });
    });
    late_worker.join().unwrap();

    assert_eq!(delivered.load(Ordering::SeqCst), 0);
    assert!(resamplers_untouched(&media));
}

fn resamplers_untouched(media: &MockMediaEngine) -> bool {
    media
        .resamplers()
        .iter()
        .all(|resampler| resampler.applied_maps().is_empty())
}

#[test]
fn destroy_is_idempotent_and_safe_before_start() {
    let media = MockMediaEngine::new().with_duration(30.0);
    let speech = MockSpeechEngine::new();
    let factory = make_factory(&media, &speech);

    let mut pipeline = factory.create_producer_pipeline(&subtitle_stream()).unwrap();

    // Never started.
    pipeline.destroy();
    pipeline.destroy();
    assert!(!pipeline.is_running());
}

#[test]
fn registration_is_replace_or_clear() {
    let media = MockMediaEngine::new().with_duration(30.0);
    let speech = MockSpeechEngine::new();
    let factory = make_factory(&media, &speech);

    let mut pipeline = factory.create_producer_pipeline(&subtitle_stream()).unwrap();

    let first = Arc::new(AtomicUsize::new(0));
    let counter = first.clone();
    pipeline.connect_words_callback(Some(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    // Replacing the registration detaches the first consumer.
    let second = Arc::new(AtomicUsize::new(0));
    let counter = second.clone();
    pipeline.connect_words_callback(Some(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    let decoder = media.last_subtitle_decoder().unwrap();
    decoder.fire_word(WordEvent::new("hello", 0.5, 0.9));
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);

    // Clearing detaches entirely.
    pipeline.connect_words_callback(None);
    assert!(!decoder.fire_word(WordEvent::new("dropped", 1.5, 1.9)));
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn progress_is_monotonic_over_a_run() {
    let media = MockMediaEngine::new().with_duration(100.0);
    let speech = MockSpeechEngine::new();
    let factory = make_factory(&media, &speech);

    let mut pipeline = factory.create_producer_pipeline(&subtitle_stream()).unwrap();
    pipeline.select_time_window(20.0, 80.0).unwrap();
    pipeline.start().unwrap();

    let demux = media.last_demux().unwrap();
    let mut last = pipeline.progress().expect("duration is known");
    assert_eq!(last, 0.0);

    for position in [20.0, 35.0, 50.0, 65.0, 80.0] {
        demux.set_position(position);
        let progress = pipeline.progress().expect("duration is known");
        assert!(progress >= last, "progress went backwards: {progress} < {last}");
        last = progress;
    }
    assert_eq!(last, 1.0);

    pipeline.destroy();
}
