//! Per-frame orchestration.
//!
//! [`FramePipeline::process`] runs one frame through
//!
//! ```text
//! detect ─▶ (hand?) ─▶ classify ─▶ lookup ─▶ observe ─▶ (emit?) ─▶ overlay
//!                                                                 ─▶ synthesize ─▶ play
//! ```
//!
//! and always returns a frame and a state.  Each collaborator call is
//! handled where it is made: a failure is logged, the remaining stages for
//! that frame are skipped and the frame/state reached so far are returned.

use crate::gesture::{GestureClassifier, GestureVocabulary};
use crate::speech::{AudioSink, SpeechSynthesizer};
use crate::vision::{draw_text, Frame, HandDetector, TextStyle};

use super::state::{FrameOutcome, PipelineState, Stage};

/// Result of [`FramePipeline::process`].
#[derive(Debug)]
pub struct ProcessedFrame {
    /// Frame to display.
    pub frame: Frame,
    /// State to pass to the next call.
    pub state: PipelineState,
    pub outcome: FrameOutcome,
}

/// The detector → classifier → stabilizer → speech chain.
pub struct FramePipeline {
    detector: Box<dyn HandDetector>,
    classifier: Box<dyn GestureClassifier>,
    vocabulary: GestureVocabulary,
    synthesizer: Box<dyn SpeechSynthesizer>,
    sink: Box<dyn AudioSink>,
    overlay: TextStyle,
}

impl FramePipeline {
    pub fn new(
        detector: Box<dyn HandDetector>,
        classifier: Box<dyn GestureClassifier>,
        vocabulary: GestureVocabulary,
        synthesizer: Box<dyn SpeechSynthesizer>,
        sink: Box<dyn AudioSink>,
    ) -> Self {
        Self {
            detector,
            classifier,
            vocabulary,
            synthesizer,
            sink,
            overlay: TextStyle::default(),
        }
    }

    /// Replace the style used to draw emitted tokens.
    pub fn with_overlay(mut self, overlay: TextStyle) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn vocabulary(&self) -> &GestureVocabulary {
        &self.vocabulary
    }

    /// Process one frame.  Never fails: collaborator errors degrade the
    /// frame, they do not end it.
    pub fn process(&mut self, frame: Frame, mut state: PipelineState) -> ProcessedFrame {
        let mut outcome = FrameOutcome::default();

        let detection = match self.detector.detect(&frame) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("[{}] {e}", Stage::Detect.label());
                outcome.degraded = Some(Stage::Detect);
                return ProcessedFrame { frame, state, outcome };
            }
        };

        let mut annotated = detection.annotated;
        if !detection.hand_present {
            // A dwell run must not span an absent hand.
            state.stabilizer_mut().reset_candidate();
            return ProcessedFrame {
                frame: annotated,
                state,
                outcome,
            };
        }
        outcome.hand_present = true;

        let index = match self.classifier.predict(&annotated) {
            Ok(i) => i,
            Err(e) => {
                log::warn!("[{}] {e}", Stage::Classify.label());
                outcome.degraded = Some(Stage::Classify);
                return ProcessedFrame {
                    frame: annotated,
                    state,
                    outcome,
                };
            }
        };

        let token = self.vocabulary.lookup(index).to_string();
        let emitted = state.stabilizer_mut().observe(&token);
        outcome.token = Some(token);

        let Some(token) = emitted else {
            return ProcessedFrame {
                frame: annotated,
                state,
                outcome,
            };
        };
        outcome.emitted = true;
        log::info!("gesture: {token} (class {index})");

        draw_text(&mut annotated, &token, &self.overlay);

        match self.synthesizer.synthesize(&token) {
            Ok(audio) => {
                if let Err(e) = self.sink.play(&audio) {
                    log::warn!("[{}] {e}", Stage::Playback.label());
                    outcome.degraded = Some(Stage::Playback);
                }
            }
            Err(e) => {
                log::warn!("[{}] {e}", Stage::Synthesize.label());
                outcome.degraded = Some(Stage::Synthesize);
            }
        }

        ProcessedFrame {
            frame: annotated,
            state,
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::gesture::ClassifierError;
    use crate::speech::{AudioBuffer, PlaybackError, SynthError};
    use crate::vision::{DetectionResult, DetectorError};

    // ---- test doubles ---

    /// Reports a hand on every frame and marks pixel (0, 0) red.
    struct MarkingDetector;

    impl HandDetector for MarkingDetector {
        fn detect(&self, frame: &Frame) -> Result<DetectionResult, DetectorError> {
            let mut annotated = frame.clone();
            annotated.put_rgb(0, 0, [255, 0, 0]);
            Ok(DetectionResult {
                annotated,
                hand_present: true,
                landmarks: None,
            })
        }
    }

    struct NoHand;

    impl HandDetector for NoHand {
        fn detect(&self, frame: &Frame) -> Result<DetectionResult, DetectorError> {
            Ok(DetectionResult::absent(frame.clone()))
        }
    }

    struct BrokenDetector;

    impl HandDetector for BrokenDetector {
        fn detect(&self, _frame: &Frame) -> Result<DetectionResult, DetectorError> {
            Err(DetectorError::Backend("camera glitch".into()))
        }
    }

    struct Fixed(i64);

    impl GestureClassifier for Fixed {
        fn predict(&self, _frame: &Frame) -> Result<i64, ClassifierError> {
            Ok(self.0)
        }
    }

    struct BrokenClassifier;

    impl GestureClassifier for BrokenClassifier {
        fn predict(&self, _frame: &Frame) -> Result<i64, ClassifierError> {
            Err(ClassifierError::Inference("nan".into()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSynth(Arc<Mutex<Vec<String>>>);

    impl SpeechSynthesizer for RecordingSynth {
        fn synthesize(&self, text: &str) -> Result<AudioBuffer, SynthError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(AudioBuffer::silence(16))
        }
    }

    struct BrokenSynth;

    impl SpeechSynthesizer for BrokenSynth {
        fn synthesize(&self, _text: &str) -> Result<AudioBuffer, SynthError> {
            Err(SynthError::Inference("vocoder".into()))
        }
    }

    #[derive(Clone, Default)]
    struct CountingSink(Arc<Mutex<usize>>);

    impl AudioSink for CountingSink {
        fn play(&mut self, _audio: &AudioBuffer) -> Result<(), PlaybackError> {
            *self.0.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct BrokenSink;

    impl AudioSink for BrokenSink {
        fn play(&mut self, _audio: &AudioBuffer) -> Result<(), PlaybackError> {
            Err(PlaybackError::NoDevice)
        }
    }

    fn pipeline(
        detector: impl HandDetector + 'static,
        classifier: impl GestureClassifier + 'static,
        synth: impl SpeechSynthesizer + 'static,
        sink: impl AudioSink + 'static,
    ) -> FramePipeline {
        FramePipeline::new(
            Box::new(detector),
            Box::new(classifier),
            GestureVocabulary::alphabet(),
            Box::new(synth),
            Box::new(sink),
        )
    }

    fn blank() -> Frame {
        Frame::filled(120, 80, [0, 0, 0])
    }

    // ---- tests ---

    #[test]
    fn emits_once_while_gesture_is_held() {
        let synth = RecordingSynth::default();
        let sink = CountingSink::default();
        let mut p = pipeline(MarkingDetector, Fixed(0), synth.clone(), sink.clone());

        let mut state = PipelineState::new(1);
        let mut emitted = 0;
        for _ in 0..4 {
            let out = p.process(blank(), state);
            state = out.state;
            emitted += usize::from(out.outcome.emitted);
        }

        assert_eq!(emitted, 1);
        assert_eq!(state.history(), ["A"]);
        assert_eq!(*synth.0.lock().unwrap(), vec!["A".to_string()]);
        assert_eq!(*sink.0.lock().unwrap(), 1);
    }

    #[test]
    fn emitted_frame_carries_overlay() {
        let mut p = pipeline(
            MarkingDetector,
            Fixed(1),
            RecordingSynth::default(),
            CountingSink::default(),
        );
        let out = p.process(blank(), PipelineState::new(1));
        assert!(out.outcome.emitted);

        let green = TextStyle::default().color;
        let drawn = (0..out.frame.height())
            .flat_map(|y| (0..out.frame.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| out.frame.rgb(x, y) == Some(green))
            .count();
        assert!(drawn > 0, "token should be drawn on the frame");
    }

    #[test]
    fn held_frame_is_detector_output_without_overlay() {
        let mut p = pipeline(
            MarkingDetector,
            Fixed(1),
            RecordingSynth::default(),
            CountingSink::default(),
        );
        let first = p.process(blank(), PipelineState::new(1));
        let second = p.process(blank(), first.state);
        assert!(!second.outcome.emitted);
        assert_eq!(second.frame, MarkingDetector.detect(&blank()).unwrap().annotated);
    }

    #[test]
    fn no_hand_skips_classification() {
        let synth = RecordingSynth::default();
        let mut p = pipeline(NoHand, BrokenClassifier, synth.clone(), CountingSink::default());
        let state = PipelineState::new(1);
        let out = p.process(blank(), state.clone());

        assert_eq!(out.frame, blank());
        assert_eq!(out.state, state);
        assert_eq!(out.outcome, FrameOutcome::default());
        assert!(synth.0.lock().unwrap().is_empty());
    }

    #[test]
    fn detector_failure_returns_input_frame() {
        let mut p = pipeline(
            BrokenDetector,
            Fixed(0),
            RecordingSynth::default(),
            CountingSink::default(),
        );
        let input = Frame::filled(10, 10, [1, 2, 3]);
        let out = p.process(input.clone(), PipelineState::new(1));
        assert_eq!(out.frame, input);
        assert_eq!(out.outcome.degraded, Some(Stage::Detect));
        assert!(out.state.history().is_empty());
    }

    #[test]
    fn classifier_failure_returns_detector_frame() {
        let mut p = pipeline(
            MarkingDetector,
            BrokenClassifier,
            RecordingSynth::default(),
            CountingSink::default(),
        );
        let out = p.process(blank(), PipelineState::new(1));
        assert_eq!(out.frame.rgb(0, 0), Some([255, 0, 0]));
        assert_eq!(out.outcome.degraded, Some(Stage::Classify));
        assert!(out.outcome.hand_present);
        assert!(out.outcome.token.is_none());
    }

    #[test]
    fn synth_failure_keeps_emit_and_skips_playback() {
        let sink = CountingSink::default();
        let mut p = pipeline(MarkingDetector, Fixed(2), BrokenSynth, sink.clone());
        let out = p.process(blank(), PipelineState::new(1));
        assert!(out.outcome.emitted);
        assert_eq!(out.outcome.degraded, Some(Stage::Synthesize));
        assert_eq!(out.state.history(), ["C"]);
        assert_eq!(*sink.0.lock().unwrap(), 0);
    }

    #[test]
    fn playback_failure_is_swallowed() {
        let mut p = pipeline(MarkingDetector, Fixed(2), RecordingSynth::default(), BrokenSink);
        let out = p.process(blank(), PipelineState::new(1));
        assert!(out.outcome.emitted);
        assert_eq!(out.outcome.degraded, Some(Stage::Playback));
        assert_eq!(out.state.history(), ["C"]);
    }

    #[test]
    fn out_of_range_class_speaks_unknown() {
        let synth = RecordingSynth::default();
        let mut p = pipeline(MarkingDetector, Fixed(99), synth.clone(), CountingSink::default());
        let out = p.process(blank(), PipelineState::new(1));
        assert_eq!(out.outcome.emitted_token(), Some("Unknown"));
        assert_eq!(*synth.0.lock().unwrap(), vec!["Unknown".to_string()]);
    }

    #[test]
    fn hand_absence_resets_dwell_candidate() {
        let mut hand = pipeline(
            MarkingDetector,
            Fixed(0),
            RecordingSynth::default(),
            CountingSink::default(),
        );
        let mut gone = pipeline(
            NoHand,
            Fixed(0),
            RecordingSynth::default(),
            CountingSink::default(),
        );

        let state = PipelineState::new(2);
        let state = hand.process(blank(), state).state;
        let state = gone.process(blank(), state).state;
        let out = hand.process(blank(), state);
        assert!(!out.outcome.emitted, "absence must break the dwell run");
        let out = hand.process(blank(), out.state);
        assert!(out.outcome.emitted);
    }
}
