pub mod engine;
pub mod mock;
pub mod renderer;

pub use engine::{
    create_tts, split_for_speech, AudioFormat, GoogleTranslateTts, OpenAiTts, TtsProvider,
    TtsProviderKind, TtsRequest,
};
pub use mock::MockTts;
pub use renderer::{AudioPlayer, InlineAudioPlayer, PlaybackClip, SpeechError, SpeechRenderer};
