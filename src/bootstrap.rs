//! Construction of the pipeline collaborators from [`AppConfig`].
//!
//! Everything here runs once at startup.  Any failure is fatal: the caller
//! logs it and exits instead of starting a session with a missing piece.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{
    AppConfig, CaptureBackend, CaptureConfig, GestureConfig, SpeechConfig, SynthBackend,
};
use crate::gesture::{
    ClassifierError, GestureClassifier, GestureVocabulary, LinearGestureClassifier, VocabularyError,
};
use crate::pipeline::FramePipeline;
use crate::speech::{
    AudioSink, CpalSink, ModelDims, ModelSynthesizer, NullSink, PlaybackError, SpeechSynthesizer,
    SynthError, ToneSynthesizer, WavRecorderSink, SAMPLE_RATE,
};
use crate::vision::{
    HandDetector, ImageDirSource, RawVideoSource, SkinToneDetector, TextStyle, VideoSource,
};

// ---------------------------------------------------------------------------
// BootstrapError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("gesture classifier: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("speech synthesizer: {0}")]
    Synthesizer(#[from] SynthError),

    #[error("gesture labels: {0}")]
    Vocabulary(#[from] VocabularyError),

    #[error("vocabulary has {labels} labels but the classifier emits {classes} classes")]
    LabelCount { labels: usize, classes: usize },

    #[error("speech sample rate must be 16000 Hz, got {0}")]
    SampleRate(u32),

    #[error("audio output: {0}")]
    Audio(#[from] PlaybackError),

    #[error("cannot create recording directory {path}: {source}")]
    RecordDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// The collaborators of a [`FramePipeline`], built and validated.
pub struct Components {
    pub detector: Box<dyn HandDetector>,
    pub classifier: Box<dyn GestureClassifier>,
    pub vocabulary: GestureVocabulary,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub sink: Box<dyn AudioSink>,
}

impl Components {
    /// Build every collaborator named by `config`.
    pub fn build(config: &AppConfig) -> Result<Self, BootstrapError> {
        if config.speech.sample_rate != SAMPLE_RATE {
            return Err(BootstrapError::SampleRate(config.speech.sample_rate));
        }

        let vocabulary = build_vocabulary(&config.gesture)?;
        let classifier = LinearGestureClassifier::load(
            &config.gesture.model_path,
            config.gesture.num_classes,
            config.gesture.input_size,
        )?;
        log::info!(
            "classifier loaded: {} classes from {}",
            classifier.num_classes(),
            config.gesture.model_path.display()
        );

        let synthesizer = build_synthesizer(&config.speech)?;
        let sink = build_sink(&config.speech)?;

        Ok(Self {
            detector: Box::new(SkinToneDetector::new(config.detector.clone())),
            classifier: Box::new(classifier),
            vocabulary,
            synthesizer,
            sink,
        })
    }

    /// Assemble the frame pipeline, drawing emitted tokens with `overlay`.
    pub fn into_pipeline(self, overlay: TextStyle) -> FramePipeline {
        FramePipeline::new(
            self.detector,
            self.classifier,
            self.vocabulary,
            self.synthesizer,
            self.sink,
        )
        .with_overlay(overlay)
    }
}

/// Default alphabet, or the configured label file.  The label count must
/// match the classifier's class count.
pub fn build_vocabulary(config: &GestureConfig) -> Result<GestureVocabulary, BootstrapError> {
    let vocabulary = match &config.labels_file {
        Some(path) => GestureVocabulary::load_from(path)?,
        None => GestureVocabulary::alphabet(),
    };
    if vocabulary.len() != config.num_classes {
        return Err(BootstrapError::LabelCount {
            labels: vocabulary.len(),
            classes: config.num_classes,
        });
    }
    Ok(vocabulary)
}

pub fn build_synthesizer(
    config: &SpeechConfig,
) -> Result<Box<dyn SpeechSynthesizer>, BootstrapError> {
    match config.backend {
        SynthBackend::Model => {
            let dims = ModelDims {
                input: config.input_dim,
                hidden: config.hidden_dim,
                output: config.output_dim,
            };
            let synth = ModelSynthesizer::load(&config.model_path, dims)?;
            log::info!("speech model loaded from {}", config.model_path.display());
            Ok(Box::new(synth))
        }
        SynthBackend::Tone => {
            log::info!("speech: tone synthesizer (no model)");
            Ok(Box::new(ToneSynthesizer::default()))
        }
    }
}

/// Speaker output (or a silent sink), optionally wrapped in a WAV recorder.
pub fn build_sink(config: &SpeechConfig) -> Result<Box<dyn AudioSink>, BootstrapError> {
    let sink: Box<dyn AudioSink> = if config.playback {
        Box::new(CpalSink::new()?)
    } else {
        Box::new(NullSink)
    };

    match &config.record_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| BootstrapError::RecordDir {
                path: dir.clone(),
                source,
            })?;
            log::info!("recording utterances to {}", dir.display());
            Ok(Box::new(WavRecorderSink::new(sink, dir.clone())))
        }
        None => Ok(sink),
    }
}

/// The configured video source, not yet opened.
pub fn build_source(config: &CaptureConfig) -> Box<dyn VideoSource> {
    match config.backend {
        CaptureBackend::RawPipe => Box::new(RawVideoSource::new(
            &config.path,
            config.width,
            config.height,
        )),
        CaptureBackend::ImageDir => Box::new(ImageDirSource::new(&config.path)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
